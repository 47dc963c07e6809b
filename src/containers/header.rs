//! MSLM container header: magic token and the loosely encoded version string.

use std::io::{Read, Seek};
use std::sync::LazyLock;

use regex::Regex;

use crate::{binary_utils::BoundedReader, error::UnpackResult, report::Reporter};

pub const MAGIC: &[u8; 4] = b"MSLM";

/// Bytes inspected when looking for the end of the version string
pub const VERSION_WINDOW: usize = 24;

static ZERO_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("0([0-9])").expect("valid version regex"));

/// Version the mod was packed with. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    text: String,
}

impl VersionInfo {
    pub(crate) fn from_prefix(bytes: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(bytes);
        let text = ZERO_DIGIT_RE.replace_all(&raw, "$1").into_owned();
        VersionInfo { text }
    }

    /// Version text including the leading marker, e.g. `v1.0.2`
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Digits and dots following the marker, e.g. `1.0.2`
    pub fn number(&self) -> &str {
        let mut chars = self.text.chars();
        chars.next();
        chars.as_str()
    }
}

/// Returns `false` when the next four bytes are not the MSLM token.
pub fn read_magic<R: Read + Seek>(reader: &mut BoundedReader<R>) -> UnpackResult<bool> {
    let magic = reader.read_bytes(MAGIC.len())?;
    Ok(magic.as_slice() == MAGIC)
}

fn is_version_byte(byte: u8) -> bool {
    byte == b'.' || byte.is_ascii_digit()
}

/// Scans the version string that follows the magic token.
///
/// Byte 0 of the window is a marker (normally `v`) and is not inspected.
/// The cursor is left directly after the matched prefix.
pub fn read_version<R: Read + Seek>(
    reader: &mut BoundedReader<R>,
    reporter: &dyn Reporter,
) -> UnpackResult<VersionInfo> {
    let window_start = reader.position();
    let window = reader.read_bytes(VERSION_WINDOW)?;

    let size = window
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, &byte)| !is_version_byte(byte))
        .map_or(VERSION_WINDOW, |(i, _)| i);

    if size == VERSION_WINDOW {
        reporter.warn("Version number seems ill-formed");
    }

    reader.seek_to(window_start)?;
    let prefix = reader.read_bytes(size)?;

    Ok(VersionInfo::from_prefix(&prefix))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::report::MemoryReporter;

    fn reader(bytes: &[u8]) -> BoundedReader<Cursor<Vec<u8>>> {
        BoundedReader::new(Cursor::new(bytes.to_vec()), "header.sml").unwrap()
    }

    fn padded(prefix: &[u8]) -> Vec<u8> {
        let mut bytes = prefix.to_vec();
        bytes.resize(VERSION_WINDOW + 8, 0);
        bytes
    }

    #[test]
    fn magic_token_is_recognised() {
        assert!(read_magic(&mut reader(b"MSLMv1")).unwrap());
        assert!(!read_magic(&mut reader(b"ABCDv1")).unwrap());
    }

    #[test]
    fn version_scan_stops_at_first_foreign_byte() {
        let reporter = MemoryReporter::default();
        let mut r = reader(&padded(b"v1.0.2-rest"));

        let version = read_version(&mut r, &reporter).unwrap();

        assert_eq!(version.number(), "1.0.2");
        assert_eq!(version.text(), "v1.0.2");
        assert_eq!(r.position(), 6);
        assert!(reporter.warnings.borrow().is_empty());
    }

    #[test]
    fn full_window_of_digits_warns_but_continues() {
        let reporter = MemoryReporter::default();
        let mut bytes = vec![b'v'];
        bytes.extend(std::iter::repeat(b'1').take(VERSION_WINDOW + 4));
        let mut r = reader(&bytes);

        let version = read_version(&mut r, &reporter).unwrap();

        assert_eq!(version.text().len(), VERSION_WINDOW);
        assert_eq!(r.position(), VERSION_WINDOW as u64);
        assert_eq!(reporter.warnings.borrow().len(), 1);
        assert!(reporter.warnings.borrow()[0].contains("ill-formed"));
    }

    #[test]
    fn short_window_is_truncation() {
        let reporter = MemoryReporter::default();
        let mut r = reader(b"v1.0");
        assert!(read_version(&mut r, &reporter).is_err());
    }

    #[test]
    fn zero_followed_by_digit_is_collapsed() {
        assert_eq!(VersionInfo::from_prefix(b"v1.05.07").number(), "1.5.7");
        assert_eq!(VersionInfo::from_prefix(b"v100").number(), "10");
        assert_eq!(VersionInfo::from_prefix(b"v2.0.0").number(), "2.0.0");
        // Matches do not overlap: "000" -> "00"
        assert_eq!(VersionInfo::from_prefix(b"v1.000").number(), "1.00");
    }
}
