//! Tag-length-value framing for card command payloads.
//!
//! ```text
//! tag     1 byte  (tag < 0x80)
//!         2 bytes (0x80 | tag >> 8, tag & 0xff) for 0x80 <= tag <= 0x7fff
//! length  7 bits per byte, low group first, high bit set on every byte but the last
//! value   `length` bytes
//! ```

use crate::error::CodecError;

pub const MAX_TAG: u16 = 0x7FFF;

// Five groups of seven bits cover u32.
const MAX_LENGTH_BYTES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Vec<u8>,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.value.len() + 4);
        self.encode_into(&mut out)?;
        Ok(out)
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match self.tag {
            0..=0x7F => out.push(self.tag as u8),
            0x80..=MAX_TAG => {
                out.push(0x80 | (self.tag >> 8) as u8);
                out.push((self.tag & 0xFF) as u8);
            }
            _ => {
                return Err(CodecError::ValidationFailed(format!(
                    "tlv tag {:#06x} exceeds {MAX_TAG:#06x}",
                    self.tag
                )))
            }
        }

        let mut len = u32::try_from(self.value.len()).map_err(|_| {
            CodecError::ValidationFailed(format!("tlv value of {} bytes", self.value.len()))
        })?;
        loop {
            let group = (len & 0x7F) as u8;
            len >>= 7;
            if len == 0 {
                out.push(group);
                break;
            }
            out.push(group | 0x80);
        }

        out.extend_from_slice(&self.value);
        Ok(())
    }
}

/// Encodes records back to back into one frame.
pub fn encode_all(records: &[Tlv]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for record in records {
        record.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Reads one record from the front of `buf`, advancing it.
pub fn decode(buf: &mut &[u8]) -> Result<Tlv, CodecError> {
    let first = crate::int::take_u8(buf)?;
    let tag = if first & 0x80 == 0 {
        first as u16
    } else {
        let second = crate::int::take_u8(buf)?;
        let tag = (((first & 0x7F) as u16) << 8) | second as u16;
        if tag < 0x80 {
            return Err(CodecError::WrongFormat(format!(
                "tag {tag:#04x} must use the one-byte form"
            )));
        }
        tag
    };

    let mut len: u64 = 0;
    let mut shift = 0;
    for i in 0.. {
        if i == MAX_LENGTH_BYTES {
            return Err(CodecError::WrongFormat("tlv length too long".into()));
        }
        let byte = crate::int::take_u8(buf)?;
        len |= u64::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if byte == 0 && i > 0 {
                return Err(CodecError::WrongFormat(
                    "tlv length has a redundant zero group".into(),
                ));
            }
            break;
        }
    }

    let len = usize::try_from(len)
        .map_err(|_| CodecError::WrongFormat(format!("tlv length {len} too large")))?;
    if len > buf.len() {
        return Err(CodecError::IncompleteData(format!(
            "tlv tag {tag:#x} declares {len} bytes, {} remain",
            buf.len()
        )));
    }
    let (value, rest) = buf.split_at(len);
    *buf = rest;
    Ok(Tlv::new(tag, value))
}

/// Parses a whole frame into its records.
pub fn decode_all(mut frame: &[u8]) -> Result<Vec<Tlv>, CodecError> {
    let mut records = Vec::new();
    while !frame.is_empty() {
        records.push(decode(&mut frame)?);
    }
    Ok(records)
}
