//! Fixed-width integer packing.
//!
//! `put_*` append to a buffer; `take_*` read from the front of a cursor and
//! advance it, failing with `IncompleteData` when too few bytes remain.

use crate::error::CodecError;

macro_rules! fixed_width {
    ($put_le:ident, $put_be:ident, $take_le:ident, $take_be:ident, $ty:ty) => {
        pub fn $put_le(out: &mut Vec<u8>, value: $ty) {
            out.extend_from_slice(&value.to_le_bytes());
        }

        pub fn $put_be(out: &mut Vec<u8>, value: $ty) {
            out.extend_from_slice(&value.to_be_bytes());
        }

        pub fn $take_le(buf: &mut &[u8]) -> Result<$ty, CodecError> {
            let raw = take_array::<{ std::mem::size_of::<$ty>() }>(buf)?;
            Ok(<$ty>::from_le_bytes(raw))
        }

        pub fn $take_be(buf: &mut &[u8]) -> Result<$ty, CodecError> {
            let raw = take_array::<{ std::mem::size_of::<$ty>() }>(buf)?;
            Ok(<$ty>::from_be_bytes(raw))
        }
    };
}

fixed_width!(put_u16_le, put_u16_be, take_u16_le, take_u16_be, u16);
fixed_width!(put_u32_le, put_u32_be, take_u32_le, take_u32_be, u32);
fixed_width!(put_u64_le, put_u64_be, take_u64_le, take_u64_be, u64);

pub fn take_u8(buf: &mut &[u8]) -> Result<u8, CodecError> {
    let [byte] = take_array::<1>(buf)?;
    Ok(byte)
}

/// Reads exactly `N` bytes from the front of `buf`.
pub fn take_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], CodecError> {
    if buf.len() < N {
        return Err(CodecError::IncompleteData(format!(
            "need {N} bytes, have {}",
            buf.len()
        )));
    }
    let (head, rest) = buf.split_at(N);
    *buf = rest;
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_and_big_endian_layouts() {
        let mut out = Vec::new();
        put_u32_le(&mut out, 0x0102_0304);
        put_u32_be(&mut out, 0x0102_0304);
        assert_eq!(out, vec![4, 3, 2, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn take_reads_in_sequence() {
        let mut out = Vec::new();
        put_u16_le(&mut out, 0xBEEF);
        put_u64_be(&mut out, u64::MAX - 1);
        out.push(9);
        let mut buf = out.as_slice();
        assert_eq!(take_u16_le(&mut buf).unwrap(), 0xBEEF);
        assert_eq!(take_u64_be(&mut buf).unwrap(), u64::MAX - 1);
        assert_eq!(take_u8(&mut buf).unwrap(), 9);
        assert!(buf.is_empty());
    }

    #[test]
    fn short_buffer_is_incomplete() {
        let data = [1u8, 2, 3];
        let err = take_u32_le(&mut data.as_slice()).unwrap_err();
        assert_eq!(err, CodecError::IncompleteData("need 4 bytes, have 3".into()));
    }
}
