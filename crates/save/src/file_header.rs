// ---------------------------------------------------------------------------
// file_header – Model file header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "RAIN" (0x5241494E)
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32: bit 0 = payload is lz4-compressed)
//   [12..20] Timestamp (Unix epoch milliseconds, u64)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] xxHash32 checksum of the stored payload (everything after the header)

use xxhash_rust::xxh32::xxh32;

use crate::save_error::ModelFileError;

/// Magic bytes identifying a Random Rain Forest model file.
pub const MAGIC: [u8; 4] = *b"RAIN";

pub const HEADER_SIZE: usize = 28;

/// Layout version of the header itself, independent of the model version.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Payload is lz4 block-compressed with a prepended size.
pub const FLAG_COMPRESSED: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Prepend a header to `payload` (already compressed if `flags` says so).
pub fn wrap_with_header(
    payload: &[u8],
    flags: u32,
    uncompressed_size: u32,
    timestamp: u64,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parse and validate the header, returning it with the payload slice.
///
/// # Errors
///
/// - `Decode` if the magic bytes are missing
/// - `Truncated` if the file ends inside the header
/// - `VersionMismatch` for a header written by a newer build
/// - `ChecksumMismatch` if the payload was modified or damaged
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), ModelFileError> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(ModelFileError::Decode(
            "not a model file (missing RAIN magic bytes)".to_string(),
        ));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(ModelFileError::Truncated {
            len: bytes.len(),
            needed: HEADER_SIZE,
        });
    }

    let format_version = le_u32(bytes, 4);
    if format_version > HEADER_FORMAT_VERSION {
        return Err(ModelFileError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }
    let flags = le_u32(bytes, 8);
    let mut timestamp = [0u8; 8];
    timestamp.copy_from_slice(&bytes[12..20]);
    let timestamp = u64::from_le_bytes(timestamp);
    let uncompressed_size = le_u32(bytes, 20);
    let checksum = le_u32(bytes, 24);

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(ModelFileError::ChecksumMismatch {
            expected: checksum,
            found: computed,
        });
    }

    Ok((
        FileHeader {
            format_version,
            flags,
            timestamp,
            uncompressed_size,
            checksum,
        },
        payload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_unwrap() {
        let data = b"forest payload";
        let wrapped = wrap_with_header(data, 0, data.len() as u32, 1_700_000_000_000);
        assert_eq!(&wrapped[..4], b"RAIN");
        assert_eq!(wrapped.len(), HEADER_SIZE + data.len());

        let (header, payload) = unwrap_header(&wrapped).unwrap();
        assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
        assert_eq!(header.timestamp, 1_700_000_000_000);
        assert_eq!(header.uncompressed_size, data.len() as u32);
        assert!(!header.is_compressed());
        assert_eq!(payload, data);
    }

    #[test]
    fn test_compressed_flag() {
        let wrapped = wrap_with_header(b"x", FLAG_COMPRESSED, 10, 0);
        let (header, _) = unwrap_header(&wrapped).unwrap();
        assert!(header.is_compressed());
        assert_eq!(header.uncompressed_size, 10);
    }

    #[test]
    fn test_missing_magic_rejected() {
        let err = unwrap_header(b"MEGA-not-ours-at-all-padding-bytes").unwrap_err();
        assert!(matches!(err, ModelFileError::Decode(_)), "got {err:?}");
        assert!(matches!(unwrap_header(b""), Err(ModelFileError::Decode(_))));
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let mut wrapped = wrap_with_header(b"test payload", 0, 12, 0);
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;
        let err = unwrap_header(&wrapped).unwrap_err();
        assert!(matches!(err, ModelFileError::ChecksumMismatch { .. }), "got {err:?}");
    }

    #[test]
    fn test_future_header_version_rejected() {
        let mut wrapped = wrap_with_header(b"test payload", 0, 12, 0);
        wrapped[4..8].copy_from_slice(&999u32.to_le_bytes());
        let err = unwrap_header(&wrapped).unwrap_err();
        assert!(matches!(
            err,
            ModelFileError::VersionMismatch {
                expected_max: HEADER_FORMAT_VERSION,
                found: 999
            }
        ));
    }

    #[test]
    fn test_truncated_header_detected() {
        let err = unwrap_header(b"RAIN\x01\x00").unwrap_err();
        assert!(matches!(err, ModelFileError::Truncated { len: 6, needed: 28 }));
    }

    #[test]
    fn test_empty_payload() {
        let wrapped = wrap_with_header(b"", 0, 0, 0);
        assert_eq!(wrapped.len(), HEADER_SIZE);
        let (_, payload) = unwrap_header(&wrapped).unwrap();
        assert!(payload.is_empty());
    }
}
