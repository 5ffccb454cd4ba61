//! Address lookup table support.
//!
//! [`split_account_keys`] decides which keys must stay inline in a message
//! and which may be loaded from a lookup table. [`rebuild_with_lookup_table`]
//! turns a message into a v0 message that loads every candidate from a
//! single table. Both are pure; fetching, creating and extending tables is
//! the caller's business.

use std::collections::HashSet;

use crate::error::SolError;
use crate::message::{AddressTableLookup, CompiledInstruction, Message, MessageHeader, MessageVersion};

/// Programs and sysvars that are always kept inline.
const PROTOCOL_CRITICAL: [&str; 10] = [
    "11111111111111111111111111111111",
    "ComputeBudget111111111111111111111111111111",
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
    "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb",
    "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
    "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
    "SysvarRent111111111111111111111111111111111",
    "SysvarC1ock11111111111111111111111111111111",
    "Sysvar1nstructions1111111111111111111111111",
    "SysvarRecentB1ockHashes11111111111111111111",
];

const COMPUTE_BUDGET_PROGRAM: &str = "ComputeBudget111111111111111111111111111111";

/// `SetComputeUnitLimit` discriminator in the ComputeBudget program.
const SET_COMPUTE_UNIT_LIMIT: u8 = 2;

fn is_protocol_critical(key: &[u8; 32]) -> bool {
    let encoded = bs58::encode(key).into_string();
    PROTOCOL_CRITICAL.contains(&encoded.as_str())
}

fn is_compute_budget(key: &[u8; 32]) -> bool {
    bs58::encode(key).into_string() == COMPUTE_BUDGET_PROGRAM
}

/// Contents of an on-chain address lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTableAccount {
    pub key: [u8; 32],
    pub addresses: Vec<[u8; 32]>,
}

/// A static key and whether the message writes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticKey {
    pub key: [u8; 32],
    pub is_writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKeySplit {
    /// Fee payer first, then writable keys, then read-only keys, each group
    /// in original order.
    pub static_keys: Vec<StaticKey>,
    /// Keys that may be loaded from a lookup table, in original order.
    pub candidates: Vec<[u8; 32]>,
}

/// Every key the message references, in runtime order: static keys, then
/// each lookup's writable keys, then each lookup's read-only keys.
///
/// `tables` must contain every table the message looks up.
pub fn resolve_account_keys(
    message: &Message,
    tables: &[LookupTableAccount],
) -> Result<Vec<[u8; 32]>, SolError> {
    let mut writable = Vec::new();
    let mut readonly = Vec::new();
    for lookup in &message.address_table_lookups {
        let table = tables
            .iter()
            .find(|t| t.key == lookup.account_key)
            .ok_or_else(|| {
                SolError::KeyNotFoundInStaticOrAnyTable(format!(
                    "lookup table {} not provided",
                    bs58::encode(lookup.account_key).into_string()
                ))
            })?;
        let load = |indexes: &[u8], out: &mut Vec<[u8; 32]>| -> Result<(), SolError> {
            for &i in indexes {
                let key = table.addresses.get(i as usize).ok_or_else(|| {
                    SolError::KeyNotFoundInStaticOrAnyTable(format!(
                        "index {i} out of range for table {}",
                        bs58::encode(table.key).into_string()
                    ))
                })?;
                out.push(*key);
            }
            Ok(())
        };
        load(&lookup.writable_indexes, &mut writable)?;
        load(&lookup.readonly_indexes, &mut readonly)?;
    }

    let mut keys = message.account_keys.clone();
    keys.extend(writable);
    keys.extend(readonly);
    Ok(keys)
}

/// Partitions a message's keys into inline keys and lookup candidates.
///
/// The fee payer, every signer, every invoked program and every
/// protocol-critical program stay inline. Everything else is a candidate.
pub fn split_account_keys(
    message: &Message,
    tables: &[LookupTableAccount],
) -> Result<AccountKeySplit, SolError> {
    let keys = resolve_account_keys(message, tables)?;
    let fee_payer = *message
        .fee_payer()
        .ok_or_else(|| SolError::TransactionBuildError("message has no fee payer".into()))?;

    let mut seen = HashSet::new();
    let mut writable = Vec::new();
    let mut readonly = Vec::new();
    let mut candidates = Vec::new();

    for (index, key) in keys.iter().enumerate() {
        if !seen.insert(*key) {
            continue;
        }
        if index == 0 {
            continue;
        }
        let is_writable = message.is_writable(index);
        let keep_inline =
            message.is_signer(index) || message.is_program(index) || is_protocol_critical(key);
        if !keep_inline {
            candidates.push(*key);
        } else if is_writable {
            writable.push(StaticKey {
                key: *key,
                is_writable,
            });
        } else {
            readonly.push(StaticKey {
                key: *key,
                is_writable,
            });
        }
    }

    let mut static_keys = Vec::with_capacity(1 + writable.len() + readonly.len());
    static_keys.push(StaticKey {
        key: fee_payer,
        is_writable: true,
    });
    static_keys.extend(writable);
    static_keys.extend(readonly);

    Ok(AccountKeySplit {
        static_keys,
        candidates,
    })
}

/// Rebuilds `message` as a v0 message loading every candidate key from
/// `table`.
///
/// The message must have a single signer. Candidate keys are looked up by
/// their position in `table`; instruction indexes are remapped to the new
/// key order and a `SetComputeUnitLimit` instruction gets 20% more units.
pub fn rebuild_with_lookup_table(
    message: &Message,
    tables: &[LookupTableAccount],
    table: &LookupTableAccount,
    recent_blockhash: [u8; 32],
) -> Result<Message, SolError> {
    if message.header.num_required_signatures != 1 {
        return Err(SolError::TransactionBuildError(format!(
            "lookup rebuild supports one signer, message has {}",
            message.header.num_required_signatures
        )));
    }

    let old_keys = resolve_account_keys(message, tables)?;
    let split = split_account_keys(message, tables)?;

    let writable_in_message: HashSet<[u8; 32]> = old_keys
        .iter()
        .enumerate()
        .filter(|(i, _)| message.is_writable(*i))
        .map(|(_, k)| *k)
        .collect();

    let position_in_table = |key: &[u8; 32]| -> Result<u8, SolError> {
        let pos = table.addresses.iter().position(|a| a == key).ok_or_else(|| {
            SolError::KeyNotFoundInStaticOrAnyTable(bs58::encode(key).into_string())
        })?;
        u8::try_from(pos).map_err(|_| {
            SolError::TransactionBuildError(format!("table index {pos} exceeds 255"))
        })
    };

    let mut writable_indexes = Vec::new();
    let mut readonly_indexes = Vec::new();
    for key in &split.candidates {
        let pos = position_in_table(key)?;
        if writable_in_message.contains(key) {
            writable_indexes.push(pos);
        } else {
            readonly_indexes.push(pos);
        }
    }
    writable_indexes.sort_unstable();
    readonly_indexes.sort_unstable();

    let static_keys: Vec<[u8; 32]> = split.static_keys.iter().map(|s| s.key).collect();
    let mut new_keys = static_keys.clone();
    new_keys.extend(writable_indexes.iter().map(|&i| table.addresses[i as usize]));
    new_keys.extend(readonly_indexes.iter().map(|&i| table.addresses[i as usize]));

    let new_index = |old: u8| -> Result<u8, SolError> {
        let key = old_keys.get(old as usize).ok_or_else(|| {
            SolError::KeyNotFoundInStaticOrAnyTable(format!("instruction index {old}"))
        })?;
        key_index(&new_keys, key)
    };

    let mut instructions = Vec::with_capacity(message.instructions.len());
    for ix in &message.instructions {
        let program_id_index = new_index(ix.program_id_index)?;
        let account_indexes = ix
            .account_indexes
            .iter()
            .map(|&i| new_index(i))
            .collect::<Result<Vec<_>, _>>()?;
        let data = if is_compute_budget(&new_keys[program_id_index as usize]) {
            bump_compute_unit_limit(&ix.data)
        } else {
            ix.data.clone()
        };
        instructions.push(CompiledInstruction {
            program_id_index,
            account_indexes,
            data,
        });
    }

    let header = MessageHeader {
        num_required_signatures: 1,
        num_readonly_signed: 0,
        num_readonly_unsigned: split.static_keys.iter().filter(|s| !s.is_writable).count() as u8,
    };

    tracing::debug!(
        static_keys = static_keys.len(),
        writable_loaded = writable_indexes.len(),
        readonly_loaded = readonly_indexes.len(),
        "rebuilt message with lookup table"
    );

    Ok(Message {
        version: MessageVersion::V0,
        header,
        account_keys: static_keys,
        recent_blockhash,
        instructions,
        address_table_lookups: vec![AddressTableLookup {
            account_key: table.key,
            writable_indexes,
            readonly_indexes,
        }],
    })
}

/// Position of `key` in `keys` as a compiled instruction index.
fn key_index(keys: &[[u8; 32]], key: &[u8; 32]) -> Result<u8, SolError> {
    let pos = keys
        .iter()
        .position(|k| k == key)
        .ok_or_else(|| SolError::KeyNotFoundInStaticOrAnyTable(bs58::encode(key).into_string()))?;
    u8::try_from(pos)
        .map_err(|_| SolError::TransactionBuildError(format!("account index {pos} exceeds 255")))
}

fn bump_compute_unit_limit(data: &[u8]) -> Vec<u8> {
    if data.len() != 5 || data[0] != SET_COMPUTE_UNIT_LIMIT {
        return data.to_vec();
    }
    let current = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    let increased = u32::try_from(u64::from(current) * 120 / 100).unwrap_or(u32::MAX);
    tracing::debug!(current, increased, "raised compute unit limit");

    let mut out = Vec::with_capacity(5);
    out.push(SET_COMPUTE_UNIT_LIMIT);
    out.extend_from_slice(&increased.to_le_bytes());
    out
}
