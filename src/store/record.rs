//! Durable store record format
//!
//! ```text
//! +----------------------+
//! | Record Length        | (u32 LE, whole record incl. this field)
//! +----------------------+
//! | Key Part Count       | (u32 LE)
//! +----------------------+
//! | Key Parts            | (each length-prefixed bytes)
//! +----------------------+
//! | Value                | (length-prefixed bytes)
//! +----------------------+
//! | Checksum             | (u32 LE)
//! +----------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Cursor, Read};

use super::checksum::compute_checksum;
use crate::state::Key;

/// length + part count + value length + checksum
pub const MIN_RECORD_SIZE: usize = 4 + 4 + 4 + 4;

/// One key/value entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub key: Key,
    pub value: Vec<u8>,
}

impl KeyRecord {
    pub fn new(key: Key, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        for part in self.key.parts() {
            buf.extend_from_slice(&(part.len() as u32).to_le_bytes());
            buf.extend_from_slice(part);
        }

        buf.extend_from_slice(&(self.value.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.value);

        buf
    }

    /// Serialize the complete record and append it to `out`.
    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let start = out.len();
        out.extend_from_slice(&record_length.to_le_bytes());
        out.extend_from_slice(&body);
        let checksum = compute_checksum(&out[start..]);
        out.extend_from_slice(&checksum.to_le_bytes());
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize_into(&mut out);
        out
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Record too short"));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = compute_checksum(&data[0..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = Cursor::new(&data[4..checksum_offset]);

        let part_count = read_u32(&mut cursor)? as usize;
        let mut parts = Vec::with_capacity(part_count.min(64));
        for _ in 0..part_count {
            parts.push(read_bytes(&mut cursor)?);
        }
        let value = read_bytes(&mut cursor)?;

        if cursor.position() as usize != checksum_offset - 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Trailing bytes in record body",
            ));
        }

        Ok((Self::new(Key::new(parts), value), record_length))
    }
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
