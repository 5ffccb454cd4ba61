//! Solana message model: compilation from instructions, and the legacy and
//! v0 wire formats.
//!
//! ```text
//! Message:
//!   [0x80]                  only for v0
//!   num_required_sigs       u8
//!   num_readonly_signed     u8
//!   num_readonly_unsigned   u8
//!   account_keys            compact-u16 count, 32 bytes each
//!   recent_blockhash        32 bytes
//!   instructions            compact-u16 count, then each:
//!     program_id_index      u8
//!     account_indexes       compact-u16 count, u8 each
//!     data                  compact-u16 length, bytes
//!   address_table_lookups   only for v0: compact-u16 count, then each:
//!     account_key           32 bytes
//!     writable_indexes      compact-u16 count, u8 each
//!     readonly_indexes      compact-u16 count, u8 each
//! ```

use crate::error::SolError;
use crate::short_vec;

/// High bit of the first byte marks a versioned message.
const VERSION_PREFIX: u8 = 0x80;

// ---------------------------------------------------------------------------
// Instructions before compilation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Compiled message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
}

/// An instruction whose keys are indexes into the message's key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

/// Keys loaded from one on-chain address lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTableLookup {
    pub account_key: [u8; 32],
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVersion {
    Legacy,
    V0,
}

/// A legacy or v0 message. Legacy messages never carry lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: MessageVersion,
    pub header: MessageHeader,
    /// Keys written inline, in canonical order: writable signers, read-only
    /// signers, writable non-signers, read-only non-signers.
    pub account_keys: Vec<[u8; 32]>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<AddressTableLookup>,
}

impl Message {
    /// Compiles instructions into a legacy message paid for by `fee_payer`.
    ///
    /// Keys are deduplicated with their signer and writable flags merged,
    /// then stably ordered by role; the fee payer is always index 0.
    pub fn compile_legacy(
        instructions: &[Instruction],
        fee_payer: &[u8; 32],
        recent_blockhash: &[u8; 32],
    ) -> Result<Message, SolError> {
        let mut entries: Vec<AccountMeta> = Vec::new();
        let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountMeta {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(*fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable: the fee payer stays ahead of other writable signers.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if entries.len() > 256 {
            return Err(SolError::TransactionBuildError(format!(
                "{} accounts exceed the 256 addressable by a message",
                entries.len()
            )));
        }

        let count = |pred: fn(&AccountMeta) -> bool| entries.iter().filter(|e| pred(e)).count() as u8;
        let header = MessageHeader {
            num_required_signatures: count(|e| e.is_signer),
            num_readonly_signed: count(|e| e.is_signer && !e.is_writable),
            num_readonly_unsigned: count(|e| !e.is_signer && !e.is_writable),
        };
        let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();

        let index_of = |key: &[u8; 32]| -> Result<u8, SolError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| SolError::TransactionBuildError("account not in account keys".into()))
        };

        let mut compiled = Vec::with_capacity(instructions.len());
        for ix in instructions {
            compiled.push(CompiledInstruction {
                program_id_index: index_of(&ix.program_id)?,
                account_indexes: ix
                    .accounts
                    .iter()
                    .map(|meta| index_of(&meta.pubkey))
                    .collect::<Result<_, _>>()?,
                data: ix.data.clone(),
            });
        }

        Ok(Message {
            version: MessageVersion::Legacy,
            header,
            account_keys,
            recent_blockhash: *recent_blockhash,
            instructions: compiled,
            address_table_lookups: Vec::new(),
        })
    }

    pub fn fee_payer(&self) -> Option<&[u8; 32]> {
        self.account_keys.first()
    }

    pub fn is_signer(&self, index: usize) -> bool {
        index < self.header.num_required_signatures as usize
    }

    /// Writability of the key at `index` in the full key list: static keys,
    /// then every lookup's writable keys, then every lookup's read-only keys.
    pub fn is_writable(&self, index: usize) -> bool {
        let num_static = self.account_keys.len();
        let num_signed = self.header.num_required_signatures as usize;
        if index < num_signed {
            return index < num_signed.saturating_sub(self.header.num_readonly_signed as usize);
        }
        if index < num_static {
            return index < num_static.saturating_sub(self.header.num_readonly_unsigned as usize);
        }
        let loaded_writable: usize = self
            .address_table_lookups
            .iter()
            .map(|l| l.writable_indexes.len())
            .sum();
        index - num_static < loaded_writable
    }

    /// Whether the key at `index` is invoked as a program by any instruction.
    pub fn is_program(&self, index: usize) -> bool {
        self.instructions
            .iter()
            .any(|ix| ix.program_id_index as usize == index)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let mut buf = Vec::with_capacity(256);
        if self.version == MessageVersion::V0 {
            buf.push(VERSION_PREFIX);
        }

        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed);
        buf.push(self.header.num_readonly_unsigned);

        buf.extend_from_slice(&short_vec::encode_len(self.account_keys.len())?);
        for key in &self.account_keys {
            buf.extend_from_slice(key);
        }
        buf.extend_from_slice(&self.recent_blockhash);

        buf.extend_from_slice(&short_vec::encode_len(self.instructions.len())?);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            buf.extend_from_slice(&short_vec::encode_len(ix.account_indexes.len())?);
            buf.extend_from_slice(&ix.account_indexes);
            buf.extend_from_slice(&short_vec::encode_len(ix.data.len())?);
            buf.extend_from_slice(&ix.data);
        }

        match self.version {
            MessageVersion::V0 => {
                buf.extend_from_slice(&short_vec::encode_len(self.address_table_lookups.len())?);
                for lookup in &self.address_table_lookups {
                    buf.extend_from_slice(&lookup.account_key);
                    buf.extend_from_slice(&short_vec::encode_len(lookup.writable_indexes.len())?);
                    buf.extend_from_slice(&lookup.writable_indexes);
                    buf.extend_from_slice(&short_vec::encode_len(lookup.readonly_indexes.len())?);
                    buf.extend_from_slice(&lookup.readonly_indexes);
                }
            }
            MessageVersion::Legacy if !self.address_table_lookups.is_empty() => {
                return Err(SolError::SerializationError(
                    "legacy messages cannot reference lookup tables".into(),
                ));
            }
            MessageVersion::Legacy => {}
        }

        Ok(buf)
    }

    /// Parses a message, consuming it from the front of `buf`.
    pub fn deserialize(buf: &mut &[u8]) -> Result<Message, SolError> {
        let first = take_u8(buf)?;
        let (version, num_required_signatures) = if first & VERSION_PREFIX != 0 {
            let version = first & !VERSION_PREFIX;
            if version != 0 {
                return Err(SolError::SerializationError(format!(
                    "unsupported message version {version}"
                )));
            }
            (MessageVersion::V0, take_u8(buf)?)
        } else {
            (MessageVersion::Legacy, first)
        };
        let header = MessageHeader {
            num_required_signatures,
            num_readonly_signed: take_u8(buf)?,
            num_readonly_unsigned: take_u8(buf)?,
        };

        let num_keys = short_vec::decode(buf)? as usize;
        let mut account_keys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            account_keys.push(take_key(buf)?);
        }
        let recent_blockhash = take_key(buf)?;

        let num_instructions = short_vec::decode(buf)? as usize;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_id_index = take_u8(buf)?;
            let account_indexes = take_vec(buf)?;
            let data = take_vec(buf)?;
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indexes,
                data,
            });
        }

        let mut address_table_lookups = Vec::new();
        if version == MessageVersion::V0 {
            let num_lookups = short_vec::decode(buf)? as usize;
            for _ in 0..num_lookups {
                let account_key = take_key(buf)?;
                let writable_indexes = take_vec(buf)?;
                let readonly_indexes = take_vec(buf)?;
                address_table_lookups.push(AddressTableLookup {
                    account_key,
                    writable_indexes,
                    readonly_indexes,
                });
            }
        }

        Ok(Message {
            version,
            header,
            account_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        })
    }
}

fn take_u8(buf: &mut &[u8]) -> Result<u8, SolError> {
    let (&b, rest) = buf
        .split_first()
        .ok_or_else(|| SolError::SerializationError("message truncated".into()))?;
    *buf = rest;
    Ok(b)
}

fn take_key(buf: &mut &[u8]) -> Result<[u8; 32], SolError> {
    if buf.len() < 32 {
        return Err(SolError::SerializationError("message truncated in key".into()));
    }
    let (head, rest) = buf.split_at(32);
    *buf = rest;
    let mut key = [0u8; 32];
    key.copy_from_slice(head);
    Ok(key)
}

fn take_vec(buf: &mut &[u8]) -> Result<Vec<u8>, SolError> {
    let len = short_vec::decode(buf)? as usize;
    if buf.len() < len {
        return Err(SolError::SerializationError(format!(
            "declared length {len} exceeds remaining {}",
            buf.len()
        )));
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head.to_vec())
}
