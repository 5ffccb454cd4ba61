//! Just enough protobuf to emit Cosmos SDK transactions.
//!
//! Fields are written in the order the caller adds them, which must be field
//! number order for the output to match other proto3 encoders. Scalar and
//! string fields holding their default value are omitted; embedded messages
//! are always written, even when empty.

const WIRE_VARINT: u8 = 0;
const WIRE_LEN: u8 = 2;

/// Appends `value` as a base-128 varint.
pub fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Builder for one protobuf message.
#[derive(Debug, Default, Clone)]
pub struct Message {
    buf: Vec<u8>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        put_varint(&mut self.buf, (u64::from(field) << 3) | u64::from(wire_type));
    }

    fn len_delimited(&mut self, field: u32, data: &[u8]) {
        self.key(field, WIRE_LEN);
        put_varint(&mut self.buf, data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    pub fn uint64(mut self, field: u32, value: u64) -> Self {
        if value != 0 {
            self.key(field, WIRE_VARINT);
            put_varint(&mut self.buf, value);
        }
        self
    }

    /// Enum fields share the varint encoding.
    pub fn enumeration(self, field: u32, value: u32) -> Self {
        self.uint64(field, u64::from(value))
    }

    pub fn bytes(mut self, field: u32, data: &[u8]) -> Self {
        if !data.is_empty() {
            self.len_delimited(field, data);
        }
        self
    }

    pub fn string(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    pub fn message(mut self, field: u32, message: Message) -> Self {
        self.len_delimited(field, &message.buf);
        self
    }

    /// `repeated bytes`: every element is written, empty ones included.
    pub fn repeated_bytes(mut self, field: u32, items: &[&[u8]]) -> Self {
        for item in items {
            self.len_delimited(field, item);
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// `google.protobuf.Any`.
pub fn any(type_url: &str, value: Message) -> Message {
    Message::new()
        .string(1, type_url)
        .bytes(2, &value.into_bytes())
}
