//! # Snapshot Envelope Format
//!
//! Binary serialization for instance snapshots.
//!
//! Format: Header (5 bytes) + JSON-encoded snapshot.
//! - 4 bytes: Magic ("SKEI")
//! - 1 byte: Version
//!
//! The payload is the snapshot's JSON form, so a decoded envelope is
//! interchangeable with the plain-JSON snapshot accepted elsewhere.
//!
//! All validation (size limits, magic, version) happens before the
//! payload is parsed, so corrupted or hostile input fails cheaply.

use crate::snapshot::Snapshot;
use crate::types::SkeinError;

// =============================================================================
// FORMAT CONSTANTS
// =============================================================================

/// Magic bytes identifying a snapshot envelope.
pub const MAGIC_BYTES: &[u8; 4] = b"SKEI";

/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum allowed envelope size.
///
/// Validated before deserialization so oversized input is rejected
/// without allocating for it.
pub const MAX_ENVELOPE_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Minimum valid envelope size (header only).
const MIN_ENVELOPE_SIZE: usize = 5;

// =============================================================================
// ENVELOPE HEADER
// =============================================================================

/// The header preceding all snapshot payload bytes.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl EnvelopeHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), SkeinError> {
        if &self.magic != MAGIC_BYTES {
            return Err(SkeinError::Deserialization(
                "invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(SkeinError::Deserialization(format!(
                "unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SkeinError> {
        if bytes.len() < MIN_ENVELOPE_SIZE {
            return Err(SkeinError::Deserialization("header too short".to_string()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for EnvelopeHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to envelope bytes (header + payload).
///
/// Pure transformation; no file I/O.
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, SkeinError> {
    let header = EnvelopeHeader::new();
    let payload =
        serde_json::to_vec(snapshot).map_err(|e| SkeinError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(5 + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a snapshot from envelope bytes.
///
/// Pure transformation; no file I/O. Size and header are validated
/// before the payload is touched.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, SkeinError> {
    if bytes.len() < MIN_ENVELOPE_SIZE {
        return Err(SkeinError::Deserialization(
            "data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() > MAX_ENVELOPE_SIZE {
        return Err(SkeinError::Deserialization(format!(
            "data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_ENVELOPE_SIZE
        )));
    }

    let header = EnvelopeHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[5..];
    serde_json::from_slice(payload)
        .map_err(|e| SkeinError::Deserialization(format!("malformed snapshot payload: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
