//! Hex dump to binary image conversion
//!
//! FPGA toolchains emit bitstreams as text with one byte per line:
//!
//! ```text
//! ff
//! 00
//! a5
//! ```
//!
//! Every line is exactly two hex digits terminated by `\n`. The converter
//! parses the whole input before creating the output, so a malformed line
//! never leaves a truncated image behind.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Hex digits per line
pub const TOKEN_LEN: usize = 2;

/// Bytes per line including the terminator
pub const LINE_LEN: usize = TOKEN_LEN + 1;

/// Path of the binary image derived from a hex input: `<input>.bin`
pub fn bin_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".bin");
    PathBuf::from(name)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse hex text into bytes
///
/// `path` is only used in error messages. Line numbers are 1-based.
pub fn parse(text: &[u8], path: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(text.len() / LINE_LEN);

    for (index, line) in text.split_inclusive(|&b| b == b'\n').enumerate() {
        let line_no = index + 1;

        if line.len() != LINE_LEN || line[TOKEN_LEN] != b'\n' {
            return Err(Error::Format {
                path: path.to_string(),
                line: line_no,
                len: line.len(),
            });
        }

        match (nibble(line[0]), nibble(line[1])) {
            (Some(hi), Some(lo)) => bytes.push(hi << 4 | lo),
            _ => {
                return Err(Error::InvalidHex {
                    path: path.to_string(),
                    line: line_no,
                    token: String::from_utf8_lossy(&line[..TOKEN_LEN]).into_owned(),
                })
            }
        }
    }

    Ok(bytes)
}

/// Convert the hex file at `input` into a binary image at `output`
///
/// Creates or overwrites `output`. Returns the number of bytes written.
pub fn convert(input: &Path, output: &Path) -> Result<usize> {
    let input_name = input.display().to_string();
    let output_name = output.display().to_string();

    let text = fs::read(input).map_err(|e| Error::Io {
        path: input_name.clone(),
        source: e,
    })?;
    let bytes = parse(&text, &input_name)?;

    log::debug!(
        "Parsed {} bytes from {}, writing {}",
        bytes.len(),
        input_name,
        output_name
    );

    let io_err = |e| Error::Io {
        path: output_name.clone(),
        source: e,
    };

    let mut file = File::create(output).map_err(io_err)?;
    file.write_all(&bytes).map_err(|e| Error::Write {
        path: output_name.clone(),
        start: 0,
        end: bytes.len() as u64,
        source: e,
    })?;
    file.sync_all().map_err(io_err)?;

    let persisted = file.metadata().map_err(io_err)?.len();
    if persisted != bytes.len() as u64 {
        return Err(Error::ShortWrite {
            path: output_name,
            start: 0,
            end: bytes.len() as u64,
            written: persisted,
            total: bytes.len() as u64,
        });
    }

    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let bytes = parse(b"00\nff\nA5\n7f\n", "test.hex").unwrap();
        assert_eq!(bytes, vec![0x00, 0xFF, 0xA5, 0x7F]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse(b"", "empty.hex").unwrap().is_empty());
    }

    #[test]
    fn test_parse_every_byte_value() {
        let text: String = (0..=255u8).map(|b| format!("{:02x}\n", b)).collect();
        let bytes = parse(text.as_bytes(), "all.hex").unwrap();
        assert_eq!(bytes, (0..=255u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_rejects_bad_lengths() {
        for (text, line, len) in [
            (&b"00\nfff\n"[..], 2, 4),
            (&b"0\n"[..], 1, 2),
            (&b"00\n11"[..], 2, 2),
            (&b"00\r\n"[..], 1, 4),
            (&b"\n"[..], 1, 1),
        ] {
            match parse(text, "bad.hex") {
                Err(Error::Format {
                    line: l, len: n, ..
                }) => {
                    assert_eq!((l, n), (line, len), "input {:?}", text);
                }
                other => panic!("expected Format error for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        match parse(b"00\nzz\n", "bad.hex") {
            Err(Error::InvalidHex { line, token, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "zz");
            }
            other => panic!("expected InvalidHex, got {:?}", other),
        }
        assert!(parse(b"+f\n", "bad.hex").is_err());
    }

    #[test]
    fn test_bin_path() {
        assert_eq!(
            bin_path(Path::new("/tmp/bitstream.hex")),
            PathBuf::from("/tmp/bitstream.hex.bin")
        );
    }

    #[test]
    fn test_convert() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("image.hex");
        let output = bin_path(&input);
        fs::write(&input, "de\nad\nbe\nef\n").unwrap();

        assert_eq!(convert(&input, &output).unwrap(), 4);
        assert_eq!(fs::read(&output).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_convert_large_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("large.hex");
        let output = bin_path(&input);

        let expected: Vec<u8> = (0..4_000_000u32).map(|i| (i % 251) as u8).collect();
        let text: String = expected.iter().map(|b| format!("{:02x}\n", b)).collect();
        fs::write(&input, text).unwrap();

        assert_eq!(convert(&input, &output).unwrap(), expected.len());
        assert_eq!(fs::read(&output).unwrap(), expected);
    }

    #[test]
    fn test_convert_format_error_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.hex");
        let output = bin_path(&input);
        fs::write(&input, "00\n01\n002\n03\n").unwrap();

        assert!(matches!(
            convert(&input, &output),
            Err(Error::Format { line: 3, .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_convert_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.hex");
        assert!(matches!(
            convert(&input, &bin_path(&input)),
            Err(Error::Io { .. })
        ));
    }
}
