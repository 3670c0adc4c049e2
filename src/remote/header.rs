//! # Remote Cache Header Codec
//!
//! The fixed 36-byte header that opens every remote cache exchange. All
//! multi-byte fields are little-endian at fixed offsets with no padding; the
//! byte order is part of the wire contract and is not negotiated, so every
//! peer must be built for the same order.
//!
//! Decoding validates the `"RC05"` magic strictly first — a mismatching peer
//! has none of its remaining bytes interpreted — then the status range, then
//! reads the remaining fixed fields, checking the buffer length before each
//! read.

use crate::remote::{ProtocolError, RcStatus};
use std::io::{Read, Write};

/// Magic string opening every header.
pub const MAGIC: [u8; 4] = *b"RC05";

/// Encoded header length in bytes.
pub const HEADER_LEN: usize = 36;

const STATUS_OFFSET: usize = 4;
const DAO_VERSION_OFFSET: usize = 8;
const REQUEST_ID_OFFSET: usize = 12;
const PAYLOAD_SIZE_OFFSET: usize = 20;
const INFLATED_SIZE_OFFSET: usize = 28;

/// The header exchanged before every remote cache payload.
///
/// Immutable after decode; never persisted. `payload_size` counts the bytes
/// that follow the header as sent; `inflated_size` is the decompressed length
/// when [`RcStatus::CompressedValue`] applies, and equals `payload_size`
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCacheHeader {
    pub status: RcStatus,
    pub dao_version: u32,
    pub request_id: u64,
    pub payload_size: u64,
    pub inflated_size: u64,
}

impl RemoteCacheHeader {
    pub fn new(
        status: RcStatus,
        dao_version: u32,
        request_id: u64,
        payload_size: u64,
        inflated_size: u64,
    ) -> Self {
        Self {
            status,
            dao_version,
            request_id,
            payload_size,
            inflated_size,
        }
    }

    /// A payload-free reply header correlating to `request_id`.
    pub fn reply(status: RcStatus, dao_version: u32, request_id: u64) -> Self {
        Self::new(status, dao_version, request_id, 0, 0)
    }

    /// A heartbeat header; carries no payload and no request correlation.
    pub fn heartbeat(dao_version: u32) -> Self {
        Self::new(RcStatus::Heartbeat, dao_version, 0, 0, 0)
    }

    /// Write all fields at their fixed offsets.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..4].copy_from_slice(&MAGIC);
        buf[STATUS_OFFSET..STATUS_OFFSET + 4].copy_from_slice(&(self.status as u32).to_le_bytes());
        buf[DAO_VERSION_OFFSET..DAO_VERSION_OFFSET + 4]
            .copy_from_slice(&self.dao_version.to_le_bytes());
        buf[REQUEST_ID_OFFSET..REQUEST_ID_OFFSET + 8]
            .copy_from_slice(&self.request_id.to_le_bytes());
        buf[PAYLOAD_SIZE_OFFSET..PAYLOAD_SIZE_OFFSET + 8]
            .copy_from_slice(&self.payload_size.to_le_bytes());
        buf[INFLATED_SIZE_OFFSET..INFLATED_SIZE_OFFSET + 8]
            .copy_from_slice(&self.inflated_size.to_le_bytes());
        buf
    }

    /// Parse a header from `bytes`.
    ///
    /// Magic is checked first, then status range, then the fixed fields.
    /// Magic mismatch and out-of-range status are the only semantic
    /// validation failures; truncation is reported before the field it
    /// interrupts.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let magic = field(bytes, 0, 4)?;
        if magic != MAGIC {
            return Err(ProtocolError::WrongMagicString);
        }

        let status_raw = read_u32(bytes, STATUS_OFFSET)?;
        let status = RcStatus::try_from(status_raw)?;

        Ok(Self {
            status,
            dao_version: read_u32(bytes, DAO_VERSION_OFFSET)?,
            request_id: read_u64(bytes, REQUEST_ID_OFFSET)?,
            payload_size: read_u64(bytes, PAYLOAD_SIZE_OFFSET)?,
            inflated_size: read_u64(bytes, INFLATED_SIZE_OFFSET)?,
        })
    }
}

fn field(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], ProtocolError> {
    let needed = offset + len;
    if bytes.len() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            got: bytes.len(),
        });
    }
    Ok(&bytes[offset..needed])
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    let b = field(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, ProtocolError> {
    let b = field(bytes, offset, 8)?;
    Ok(u64::from_le_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

/// Write one header to a blocking stream.
pub fn write_header<W: Write>(
    writer: &mut W,
    header: &RemoteCacheHeader,
) -> Result<(), ProtocolError> {
    writer
        .write_all(&header.encode())
        .map_err(|err| ProtocolError::Write(err.kind()))
}

/// Read and decode one header from a blocking stream.
pub fn read_header<R: Read>(reader: &mut R) -> Result<RemoteCacheHeader, ProtocolError> {
    let mut buf = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut buf)
        .map_err(|err| ProtocolError::Read(err.kind()))?;
    RemoteCacheHeader::decode(&buf)
}

/// Read the `payload_size` bytes following `header` from a blocking stream.
///
/// Callers must inspect `header.status` before trusting these bytes; when the
/// status indicates compression the returned buffer still holds the
/// compressed form.
pub fn read_payload<R: Read>(
    reader: &mut R,
    header: &RemoteCacheHeader,
) -> Result<Vec<u8>, ProtocolError> {
    let len = usize::try_from(header.payload_size)
        .map_err(|_| ProtocolError::Read(std::io::ErrorKind::InvalidData))?;
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .map_err(|err| ProtocolError::Read(err.kind()))?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_places_fields_at_fixed_offsets() {
        let header = RemoteCacheHeader::new(RcStatus::UncompressedValue, 7, 0x1122334455667788, 64, 64);
        let bytes = header.encode();

        assert_eq!(&bytes[..4], b"RC05");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 3);
        assert_eq!(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 7);
        assert_eq!(bytes[12], 0x88);
        assert_eq!(bytes[19], 0x11);
        assert_eq!(bytes[20], 64);
        assert_eq!(bytes[28], 64);
    }

    #[test]
    fn test_round_trip() {
        let header = RemoteCacheHeader::new(RcStatus::None, 3, 42, 128, 128);
        let decoded = RemoteCacheHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_wrong_magic_aborts_before_other_fields() {
        let mut bytes = RemoteCacheHeader::reply(RcStatus::None, 1, 9).encode();
        bytes[..4].copy_from_slice(b"XXXX");
        // Corrupt the status field too; it must never be inspected.
        bytes[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            RemoteCacheHeader::decode(&bytes),
            Err(ProtocolError::WrongMagicString)
        );
    }

    #[test]
    fn test_out_of_range_status() {
        let mut bytes = RemoteCacheHeader::reply(RcStatus::None, 1, 9).encode();
        bytes[4..8].copy_from_slice(&(crate::remote::STATUS_COUNT as u32).to_le_bytes());
        assert!(matches!(
            RemoteCacheHeader::decode(&bytes),
            Err(ProtocolError::BadRequestStatus(_))
        ));
    }

    #[test]
    fn test_truncated_buffer() {
        let bytes = RemoteCacheHeader::reply(RcStatus::None, 1, 9).encode();
        assert_eq!(
            RemoteCacheHeader::decode(&bytes[..10]),
            Err(ProtocolError::Truncated { needed: 12, got: 10 })
        );
        assert_eq!(
            RemoteCacheHeader::decode(&bytes[..2]),
            Err(ProtocolError::Truncated { needed: 4, got: 2 })
        );
    }
}
