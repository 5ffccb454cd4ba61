use alloy_primitives::U256;
use chain_params::EvmParams;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use wire_codec::rlp;
use wire_codec::RlpItem;

use crate::address::parse_address;
use crate::erc20;
use crate::error::EthError;

/// EIP-2718 type byte of a dynamic-fee transaction.
const EIP1559_TX_TYPE: u8 = 0x02;

/// Gas pricing of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeParams {
    /// Pre-London flat gas price, signed with EIP-155 replay protection.
    Legacy { gas_price: U256 },
    /// EIP-1559 dynamic fee.
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

impl FeeParams {
    /// Highest price per gas the sender may pay.
    pub fn max_price_per_gas(&self) -> U256 {
        match self {
            FeeParams::Legacy { gas_price } => *gas_price,
            FeeParams::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
        }
    }

    /// Upper bound of the fee for `gas_limit` gas.
    pub fn max_cost(&self, gas_limit: u64) -> U256 {
        self.max_price_per_gas()
            .saturating_mul(U256::from(gas_limit))
    }
}

/// An unsigned EVM transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    pub fee: FeeParams,
    pub to: [u8; 20],
    /// Transfer value in wei.
    pub value: U256,
    /// Calldata (empty for coin transfers).
    pub data: Vec<u8>,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEthTransaction {
    pub raw_tx: Vec<u8>,
    /// Keccak-256 of `raw_tx`, `0x`-prefixed.
    pub tx_hash: String,
}

/// Builds an unsigned coin transfer.
pub fn build_transfer(
    params: &EvmParams,
    nonce: u64,
    to: &str,
    value: U256,
    gas_limit: u64,
    fee: FeeParams,
) -> Result<EthTransaction, EthError> {
    check_fee_kind(params, &fee)?;
    let to = parse_address(to)?;

    tracing::debug!(chain_id = params.chain_id, nonce, gas_limit, "built evm transfer");
    Ok(EthTransaction {
        chain_id: params.chain_id,
        nonce,
        gas_limit,
        fee,
        to,
        value,
        data: Vec::new(),
    })
}

/// Builds an unsigned ERC-20 `transfer` addressed to the token contract.
pub fn build_erc20_transfer(
    params: &EvmParams,
    nonce: u64,
    token_contract: &str,
    to: &str,
    amount: U256,
    gas_limit: u64,
    fee: FeeParams,
) -> Result<EthTransaction, EthError> {
    check_fee_kind(params, &fee)?;
    let contract = parse_address(token_contract)?;
    let recipient = parse_address(to)?;

    tracing::debug!(chain_id = params.chain_id, nonce, gas_limit, "built erc20 transfer");
    Ok(EthTransaction {
        chain_id: params.chain_id,
        nonce,
        gas_limit,
        fee,
        to: contract,
        value: U256::ZERO,
        data: erc20::transfer_calldata(&recipient, amount),
    })
}

fn check_fee_kind(params: &EvmParams, fee: &FeeParams) -> Result<(), EthError> {
    if matches!(fee, FeeParams::Eip1559 { .. }) && !params.eip1559 {
        return Err(EthError::TransactionBuildError(format!(
            "{} does not support EIP-1559 transactions",
            params.name
        )));
    }
    if let FeeParams::Eip1559 {
        max_fee_per_gas,
        max_priority_fee_per_gas,
    } = fee
    {
        if max_priority_fee_per_gas > max_fee_per_gas {
            return Err(EthError::TransactionBuildError(
                "priority fee exceeds max fee".into(),
            ));
        }
    }
    Ok(())
}

impl EthTransaction {
    /// The bytes whose Keccak-256 is signed.
    ///
    /// Legacy: `rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0])`.
    /// EIP-1559: `0x02 || rlp([chainId, nonce, priority, maxFee, gasLimit, to,
    /// value, data, accessList])`.
    pub fn signing_payload(&self) -> Vec<u8> {
        match self.fee {
            FeeParams::Legacy { gas_price } => {
                let mut fields = self.legacy_fields(gas_price);
                fields.push(RlpItem::uint(self.chain_id));
                fields.push(RlpItem::uint(0));
                fields.push(RlpItem::uint(0));
                rlp::encode(&RlpItem::List(fields))
            }
            FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let fields = self.eip1559_fields(max_fee_per_gas, max_priority_fee_per_gas);
                typed_envelope(&RlpItem::List(fields))
            }
        }
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        Keccak256::digest(self.signing_payload()).into()
    }

    /// Attaches a signature made by the owner of `public_key`.
    ///
    /// The signature is the 64-byte `r || s` (a 65th recovery byte is
    /// ignored). It is normalized to low-S and the y-parity is recovered by
    /// trial recovery against `public_key`.
    pub fn finalize(
        &self,
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<SignedEthTransaction, EthError> {
        let compact = match signature.len() {
            64 | 65 => &signature[..64],
            n => {
                return Err(EthError::SigningError(format!(
                    "signature must be 64 or 65 bytes, got {n}"
                )))
            }
        };
        let sig = Signature::from_slice(compact)
            .map_err(|e| EthError::SigningError(format!("malformed signature: {e}")))?;
        let sig = sig.normalize_s().unwrap_or(sig);

        let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|e| EthError::InvalidPublicKey(format!("{e}")))?;
        let recovery_id =
            RecoveryId::trial_recovery_from_prehash(&verifying_key, &self.signing_hash(), &sig)
                .map_err(|_| {
                    EthError::SigningError("signature does not match the signer's key".into())
                })?;
        let y_parity = u64::from(recovery_id.is_y_odd());

        let r = RlpItem::u256(U256::from_be_slice(&sig.r().to_bytes()));
        let s = RlpItem::u256(U256::from_be_slice(&sig.s().to_bytes()));

        let raw_tx = match self.fee {
            FeeParams::Legacy { gas_price } => {
                // EIP-155: v = parity + 35 + 2 * chainId.
                let v = U256::from(self.chain_id) * U256::from(2u8) + U256::from(35 + y_parity);
                let mut fields = self.legacy_fields(gas_price);
                fields.extend([RlpItem::u256(v), r, s]);
                rlp::encode(&RlpItem::List(fields))
            }
            FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let mut fields = self.eip1559_fields(max_fee_per_gas, max_priority_fee_per_gas);
                fields.extend([RlpItem::uint(y_parity), r, s]);
                typed_envelope(&RlpItem::List(fields))
            }
        };

        let tx_hash = format!("0x{}", hex::encode(Keccak256::digest(&raw_tx)));
        Ok(SignedEthTransaction { raw_tx, tx_hash })
    }

    fn legacy_fields(&self, gas_price: U256) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(self.nonce),
            RlpItem::u256(gas_price),
            RlpItem::uint(self.gas_limit),
            RlpItem::address(&self.to),
            RlpItem::u256(self.value),
            RlpItem::bytes(self.data.clone()),
        ]
    }

    fn eip1559_fields(&self, max_fee: U256, priority_fee: U256) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(self.chain_id),
            RlpItem::uint(self.nonce),
            RlpItem::u256(priority_fee),
            RlpItem::u256(max_fee),
            RlpItem::uint(self.gas_limit),
            RlpItem::address(&self.to),
            RlpItem::u256(self.value),
            RlpItem::bytes(self.data.clone()),
            // Empty access list.
            RlpItem::empty_list(),
        ]
    }
}

fn typed_envelope(payload: &RlpItem) -> Vec<u8> {
    let body = rlp::encode(payload);
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(EIP1559_TX_TYPE);
    out.extend_from_slice(&body);
    out
}
