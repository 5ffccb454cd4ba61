//! Recursive Length Prefix encoding.
//!
//! Headers are read and written through `alloy_rlp::Header`; this module adds
//! a dynamic item tree on top so that transaction builders can assemble
//! heterogeneous lists (and decode them back) without a derive per shape.

use alloy_primitives::U256;
use alloy_rlp::Header;

use crate::error::CodecError;

/// One RLP item: either a byte string or a list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// A byte-string item.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(data.into())
    }

    /// An unsigned integer as its minimal big-endian form (zero is the empty string).
    pub fn uint(value: u64) -> Self {
        Self::u256(U256::from(value))
    }

    pub fn u128(value: u128) -> Self {
        Self::u256(U256::from(value))
    }

    pub fn u256(value: U256) -> Self {
        RlpItem::Bytes(value.to_be_bytes_trimmed_vec())
    }

    /// A 20-byte account address.
    pub fn address(address: &[u8; 20]) -> Self {
        RlpItem::Bytes(address.to_vec())
    }

    pub fn empty_list() -> Self {
        RlpItem::List(Vec::new())
    }

    pub fn as_bytes(&self) -> Result<&[u8], CodecError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(CodecError::WrongFormat(
                "expected byte string, found list".into(),
            )),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], CodecError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(CodecError::WrongFormat(
                "expected list, found byte string".into(),
            )),
        }
    }

    /// Reads the item back as an unsigned 256-bit integer.
    ///
    /// Leading zero bytes are rejected so that every integer has exactly one
    /// encoding.
    pub fn as_u256(&self) -> Result<U256, CodecError> {
        let bytes = self.as_bytes()?;
        if bytes.first() == Some(&0) {
            return Err(CodecError::WrongFormat(
                "integer has a leading zero byte".into(),
            ));
        }
        U256::try_from_be_slice(bytes)
            .ok_or_else(|| CodecError::WrongFormat(format!("integer too wide: {} bytes", bytes.len())))
    }

    pub fn as_u64(&self) -> Result<u64, CodecError> {
        let value = self.as_u256()?;
        u64::try_from(value)
            .map_err(|_| CodecError::WrongFormat(format!("integer {value} does not fit in u64")))
    }

    pub fn as_address(&self) -> Result<[u8; 20], CodecError> {
        let bytes = self.as_bytes()?;
        bytes.try_into().map_err(|_| {
            CodecError::WrongFormat(format!("address must be 20 bytes, got {}", bytes.len()))
        })
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes an item tree into its canonical RLP bytes.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(item));
    encode_into(item, &mut out);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(data) => {
            if data.len() == 1 && data[0] < 0x80 {
                out.push(data[0]);
                return;
            }
            Header {
                list: false,
                payload_length: data.len(),
            }
            .encode(out);
            out.extend_from_slice(data);
        }
        RlpItem::List(items) => {
            let payload_length = items.iter().map(encoded_len).sum();
            Header {
                list: true,
                payload_length,
            }
            .encode(out);
            for child in items {
                encode_into(child, out);
            }
        }
    }
}

fn encoded_len(item: &RlpItem) -> usize {
    match item {
        RlpItem::Bytes(data) if data.len() == 1 && data[0] < 0x80 => 1,
        RlpItem::Bytes(data) => Header {
            list: false,
            payload_length: data.len(),
        }
        .length_with_payload(),
        RlpItem::List(items) => Header {
            list: true,
            payload_length: items.iter().map(encoded_len).sum(),
        }
        .length_with_payload(),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes exactly one item spanning the whole input.
pub fn decode(input: &[u8]) -> Result<RlpItem, CodecError> {
    let mut buf = input;
    let item = decode_item(&mut buf)?;
    if !buf.is_empty() {
        return Err(CodecError::WrongFormat(format!(
            "{} trailing bytes after RLP item",
            buf.len()
        )));
    }
    Ok(item)
}

fn decode_item(buf: &mut &[u8]) -> Result<RlpItem, CodecError> {
    let header = Header::decode(buf).map_err(map_rlp_error)?;
    // Header::decode has already checked that the payload is present.
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;

    if !header.list {
        return Ok(RlpItem::Bytes(payload.to_vec()));
    }

    let mut items = Vec::new();
    let mut inner = payload;
    while !inner.is_empty() {
        items.push(decode_item(&mut inner)?);
    }
    Ok(RlpItem::List(items))
}

fn map_rlp_error(e: alloy_rlp::Error) -> CodecError {
    match e {
        alloy_rlp::Error::InputTooShort => CodecError::IncompleteData(format!("rlp: {e}")),
        other => CodecError::WrongFormat(format!("rlp: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_single_bytes_and_short_strings() {
        assert_eq!(encode(&RlpItem::bytes(vec![0x7f])), vec![0x7f]);
        assert_eq!(encode(&RlpItem::bytes(vec![0x80])), vec![0x81, 0x80]);
        assert_eq!(encode(&RlpItem::bytes(b"dog".to_vec())), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(encode(&RlpItem::bytes(Vec::new())), vec![0x80]);
    }

    #[test]
    fn encodes_integers_minimally() {
        assert_eq!(encode(&RlpItem::uint(0)), vec![0x80]);
        assert_eq!(encode(&RlpItem::uint(15)), vec![0x0f]);
        assert_eq!(encode(&RlpItem::uint(1024)), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn encodes_nested_lists() {
        // [ [], [[]], [ [], [[]] ] ]
        let set = RlpItem::List(vec![
            RlpItem::empty_list(),
            RlpItem::List(vec![RlpItem::empty_list()]),
            RlpItem::List(vec![
                RlpItem::empty_list(),
                RlpItem::List(vec![RlpItem::empty_list()]),
            ]),
        ]);
        assert_eq!(hex::encode(encode(&set)), "c7c0c1c0c3c0c1c0");
    }

    #[test]
    fn long_string_uses_length_of_length() {
        let data = vec![b'a'; 56];
        let encoded = encode(&RlpItem::bytes(data.clone()));
        assert_eq!(&encoded[..2], &[0xb8, 56]);
        assert_eq!(decode(&encoded).unwrap(), RlpItem::Bytes(data));
    }

    #[test]
    fn decode_inverts_encode() {
        let item = RlpItem::List(vec![
            RlpItem::uint(196),
            RlpItem::u128(4_478_253_867_089),
            RlpItem::address(&[0x90; 20]),
            RlpItem::bytes(vec![0xa9, 0x05, 0x9c, 0xbb]),
            RlpItem::empty_list(),
        ]);
        let encoded = encode(&item);
        assert_eq!(decode(&encoded).unwrap(), item);
        assert_eq!(encode(&item), encoded);
    }

    #[test]
    fn truncated_input_is_incomplete() {
        let err = decode(&[0x83, b'd', b'o']).unwrap_err();
        assert!(matches!(err, CodecError::IncompleteData(_)));
        assert!(matches!(decode(&[]).unwrap_err(), CodecError::IncompleteData(_)));
    }

    #[test]
    fn non_canonical_single_byte_is_rejected() {
        let err = decode(&[0x81, 0x05]).unwrap_err();
        assert!(matches!(err, CodecError::WrongFormat(_)));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode(&[0x05, 0x06]).unwrap_err();
        assert!(matches!(err, CodecError::WrongFormat(_)));
    }

    #[test]
    fn integer_accessors_reject_leading_zero() {
        let item = RlpItem::bytes(vec![0x00, 0x01]);
        assert!(item.as_u64().is_err());
        assert_eq!(RlpItem::uint(1_000_000).as_u64().unwrap(), 1_000_000);
        assert_eq!(RlpItem::uint(0).as_u64().unwrap(), 0);
    }

    #[test]
    fn accessors_check_kind() {
        assert!(RlpItem::empty_list().as_bytes().is_err());
        assert!(RlpItem::uint(1).as_list().is_err());
        assert!(RlpItem::bytes(vec![1, 2, 3]).as_address().is_err());
    }
}
