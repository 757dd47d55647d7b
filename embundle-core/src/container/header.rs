use std::io::{Read, Write};

use serde::Serialize;

use crate::error::{BundleError, Result};

/// created_at (i64) + payload_size (i64) + description_len (u32)
pub const FIXED_LEN: u64 = 20;
/// Offset of `payload_size` relative to the header start; patched after the walk.
pub const PAYLOAD_SIZE_OFF: u64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Seconds since the Unix epoch (0 for deterministic bundles)
    pub created_at: i64,
    /// Sum of all encoded record lengths
    pub payload_size: i64,
    pub description: String,
}

impl Header {
    pub fn new(created_at: i64, description: impl Into<String>) -> Self {
        Self {
            created_at,
            payload_size: 0,
            description: description.into(),
        }
    }

    /// Encoded length of this header in bytes.
    pub fn encoded_len(&self) -> u64 {
        FIXED_LEN + self.description.len() as u64
    }

    pub fn write_to(&self, mut w: impl Write) -> Result<()> {
        let desc = self.description.as_bytes();
        let desc_len = u32::try_from(desc.len())
            .map_err(|_| BundleError::Format("description longer than 4 GiB".into()))?;
        w.write_all(&self.created_at.to_le_bytes())?;
        w.write_all(&self.payload_size.to_le_bytes())?;
        w.write_all(&desc_len.to_le_bytes())?;
        w.write_all(desc)?;
        Ok(())
    }

    /// Decode a header. `available` is the number of container bytes left
    /// from the header start; a description that would run past it is corrupt.
    pub fn read_from(mut r: impl Read, available: u64) -> Result<Self> {
        let mut fixed = [0u8; FIXED_LEN as usize];
        r.read_exact(&mut fixed).map_err(|e| truncated(e, 0, "header"))?;
        let created_at = le_i64(&fixed[0..8]);
        let payload_size = le_i64(&fixed[8..16]);
        let desc_len = u64::from(le_u32(&fixed[16..20]));

        if FIXED_LEN + desc_len > available {
            return Err(BundleError::CorruptContainer {
                offset: FIXED_LEN,
                reason: format!(
                    "description of {desc_len} bytes exceeds container ({available} bytes)"
                ),
            });
        }
        let mut desc = vec![0u8; desc_len as usize];
        r.read_exact(&mut desc)
            .map_err(|e| truncated(e, FIXED_LEN, "description"))?;
        let description = String::from_utf8(desc).map_err(|_| BundleError::CorruptContainer {
            offset: FIXED_LEN,
            reason: "description is not UTF-8".into(),
        })?;

        Ok(Self {
            created_at,
            payload_size,
            description,
        })
    }
}

fn le_i64(b: &[u8]) -> i64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(b);
    i64::from_le_bytes(a)
}

fn le_u32(b: &[u8]) -> u32 {
    let mut a = [0u8; 4];
    a.copy_from_slice(b);
    u32::from_le_bytes(a)
}

fn truncated(e: std::io::Error, offset: u64, what: &str) -> BundleError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        BundleError::CorruptContainer {
            offset,
            reason: format!("truncated {what}"),
        }
    } else {
        e.into()
    }
}
