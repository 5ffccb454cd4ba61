//! Length-prefixed byte strings.

use crate::compact;
use crate::error::CodecError;

/// How the length of a byte string is written in front of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LengthPrefix {
    U8,
    U16Le,
    #[default]
    U32Le,
    /// SCALE compact integer.
    Compact,
}

/// Writes `data` preceded by its length.
pub fn encode(data: &[u8], prefix: LengthPrefix) -> Result<Vec<u8>, CodecError> {
    let len = data.len();
    let mut out = match prefix {
        LengthPrefix::U8 => vec![u8::try_from(len).map_err(|_| too_long(len, "u8"))?],
        LengthPrefix::U16Le => u16::try_from(len)
            .map_err(|_| too_long(len, "u16"))?
            .to_le_bytes()
            .to_vec(),
        LengthPrefix::U32Le => u32::try_from(len)
            .map_err(|_| too_long(len, "u32"))?
            .to_le_bytes()
            .to_vec(),
        LengthPrefix::Compact => compact::encode_u64(len as u64),
    };
    out.extend_from_slice(data);
    Ok(out)
}

/// Reads one length-prefixed byte string from the front of `buf`, advancing it.
pub fn decode<'a>(buf: &mut &'a [u8], prefix: LengthPrefix) -> Result<&'a [u8], CodecError> {
    let declared = match prefix {
        LengthPrefix::U8 => crate::int::take_u8(buf)? as usize,
        LengthPrefix::U16Le => crate::int::take_u16_le(buf)? as usize,
        LengthPrefix::U32Le => crate::int::take_u32_le(buf)? as usize,
        LengthPrefix::Compact => usize::try_from(compact::decode_u64(buf)?)
            .map_err(|_| CodecError::WrongFormat("length does not fit in usize".into()))?,
    };
    if declared > buf.len() {
        return Err(CodecError::IncompleteData(format!(
            "declared length {declared} exceeds remaining {} bytes",
            buf.len()
        )));
    }
    let (data, rest) = buf.split_at(declared);
    *buf = rest;
    Ok(data)
}

fn too_long(len: usize, width: &str) -> CodecError {
    CodecError::ValidationFailed(format!("{len} bytes cannot be prefixed with a {width}"))
}
