//! SCALE compact integers.
//!
//! The two low bits of the first byte select the mode:
//!
//! ```text
//! 0b00  single byte      value < 2^6
//! 0b01  two bytes LE     value < 2^14
//! 0b10  four bytes LE    value < 2^30
//! 0b11  big integer      upper six bits + 4 = number of LE bytes that follow
//! ```
//!
//! Signed values are zig-zag mapped onto the unsigned form, so small
//! magnitudes of either sign stay short.

use alloy_primitives::{I256, U256};

use crate::error::CodecError;

const SINGLE_BYTE_LIMIT: u64 = 1 << 6;
const TWO_BYTE_LIMIT: u64 = 1 << 14;
const FOUR_BYTE_LIMIT: u64 = 1 << 30;

// ---------------------------------------------------------------------------
// Unsigned
// ---------------------------------------------------------------------------

pub fn encode_u256(value: U256) -> Vec<u8> {
    if value < U256::from(SINGLE_BYTE_LIMIT) {
        return vec![(value.saturating_to::<u8>()) << 2];
    }
    if value < U256::from(TWO_BYTE_LIMIT) {
        let v = (value.saturating_to::<u16>() << 2) | 0b01;
        return v.to_le_bytes().to_vec();
    }
    if value < U256::from(FOUR_BYTE_LIMIT) {
        let v = (value.saturating_to::<u32>() << 2) | 0b10;
        return v.to_le_bytes().to_vec();
    }

    let mut bytes = value.to_le_bytes_trimmed_vec();
    if bytes.len() < 4 {
        bytes.resize(4, 0);
    }
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push((((bytes.len() - 4) as u8) << 2) | 0b11);
    out.extend_from_slice(&bytes);
    out
}

pub fn encode_u64(value: u64) -> Vec<u8> {
    encode_u256(U256::from(value))
}

pub fn encode_u32(value: u32) -> Vec<u8> {
    encode_u256(U256::from(value))
}

/// Reads one compact integer from the front of `buf`, advancing it.
pub fn decode_u256(buf: &mut &[u8]) -> Result<U256, CodecError> {
    let first = *buf
        .first()
        .ok_or_else(|| CodecError::IncompleteData("empty compact integer".into()))?;

    match first & 0b11 {
        0b00 => {
            *buf = &buf[1..];
            Ok(U256::from(first >> 2))
        }
        0b01 => {
            let raw = take(buf, 2)?;
            let value = u16::from_le_bytes([raw[0], raw[1]]) >> 2;
            if u64::from(value) < SINGLE_BYTE_LIMIT {
                return Err(non_canonical(value));
            }
            Ok(U256::from(value))
        }
        0b10 => {
            let raw = take(buf, 4)?;
            let value = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) >> 2;
            if u64::from(value) < TWO_BYTE_LIMIT {
                return Err(non_canonical(value));
            }
            Ok(U256::from(value))
        }
        _ => {
            let len = (first >> 2) as usize + 4;
            if len > 32 {
                return Err(CodecError::WrongFormat(format!(
                    "compact integer of {len} bytes exceeds 256 bits"
                )));
            }
            if buf.len() < 1 + len {
                return Err(CodecError::IncompleteData(format!(
                    "compact integer needs {len} bytes, have {}",
                    buf.len() - 1
                )));
            }
            let raw = &buf[1..1 + len];
            *buf = &buf[1 + len..];
            if raw[len - 1] == 0 {
                return Err(CodecError::WrongFormat(
                    "compact big integer has a zero high byte".into(),
                ));
            }
            let value = U256::from_le_slice(raw);
            if value < U256::from(FOUR_BYTE_LIMIT) {
                return Err(non_canonical(value));
            }
            Ok(value)
        }
    }
}

pub fn decode_u64(buf: &mut &[u8]) -> Result<u64, CodecError> {
    let value = decode_u256(buf)?;
    u64::try_from(value)
        .map_err(|_| CodecError::WrongFormat(format!("compact {value} does not fit in u64")))
}

pub fn decode_u32(buf: &mut &[u8]) -> Result<u32, CodecError> {
    let value = decode_u256(buf)?;
    u32::try_from(value)
        .map_err(|_| CodecError::WrongFormat(format!("compact {value} does not fit in u32")))
}

fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8], CodecError> {
    if buf.len() < n {
        return Err(CodecError::IncompleteData(format!(
            "compact integer needs {n} bytes, have {}",
            buf.len()
        )));
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

fn non_canonical(value: impl std::fmt::Display) -> CodecError {
    CodecError::WrongFormat(format!("non-canonical compact encoding of {value}"))
}

// ---------------------------------------------------------------------------
// Signed (zig-zag)
// ---------------------------------------------------------------------------

pub fn encode_i256(value: I256) -> Vec<u8> {
    let raw = value.into_raw();
    let zigzag = if value.is_negative() {
        ((!raw) << 1usize) | U256::from(1u8)
    } else {
        raw << 1usize
    };
    encode_u256(zigzag)
}

pub fn decode_i256(buf: &mut &[u8]) -> Result<I256, CodecError> {
    let zigzag = decode_u256(buf)?;
    let raw = if zigzag.bit(0) {
        !(zigzag >> 1usize)
    } else {
        zigzag >> 1usize
    };
    Ok(I256::from_raw(raw))
}

pub fn encode_i64(value: i64) -> Vec<u8> {
    encode_u64(((value << 1) ^ (value >> 63)) as u64)
}

pub fn decode_i64(buf: &mut &[u8]) -> Result<i64, CodecError> {
    let zigzag = decode_u64(buf)?;
    Ok(((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64))
}

pub fn encode_i32(value: i32) -> Vec<u8> {
    encode_u32(((value << 1) ^ (value >> 31)) as u32)
}

pub fn decode_i32(buf: &mut &[u8]) -> Result<i32, CodecError> {
    let zigzag = decode_u32(buf)?;
    Ok(((zigzag >> 1) as i32) ^ -((zigzag & 1) as i32))
}
