//! Solana's compact-u16 ("short vec") length encoding: seven bits per byte,
//! least significant group first, high bit set on every byte but the last.

use crate::error::SolError;

pub fn encode(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Encodes a collection length, failing above `u16::MAX`.
pub fn encode_len(len: usize) -> Result<Vec<u8>, SolError> {
    let value = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("length {len} exceeds compact-u16")))?;
    Ok(encode(value))
}

/// Reads a compact-u16 from the front of `buf` and advances it.
///
/// Rejects truncated input, values above `u16::MAX`, and non-minimal
/// encodings.
pub fn decode(buf: &mut &[u8]) -> Result<u16, SolError> {
    let mut value: u32 = 0;
    for i in 0..3 {
        let (&byte, rest) = buf.split_first().ok_or_else(|| {
            SolError::SerializationError("unexpected end of data while decoding compact-u16".into())
        })?;
        *buf = rest;

        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            if byte == 0 && i > 0 {
                return Err(SolError::SerializationError(
                    "non-minimal compact-u16".into(),
                ));
            }
            return u16::try_from(value)
                .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()));
        }
    }
    Err(SolError::SerializationError("compact-u16 longer than 3 bytes".into()))
}
