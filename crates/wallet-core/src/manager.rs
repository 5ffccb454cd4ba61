//! The per-account façade: one [`WalletManager`] per chain and address.
//!
//! ```text
//! intent -> estimate_fee -> build_transaction -> sign -> send -> track_pending
//! ```
//!
//! The manager reads account state through its chain's provider, builds the
//! chain-specific unsigned transaction, hands the digests to an external
//! [`Signer`] and broadcasts the result.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_btc::{SpendKind, Utxo};
use chain_cosmos::CosmosSend;
use chain_dot::ChainState;
use chain_eth::fee::{FEE_HISTORY_BLOCKS, REWARD_PERCENTILES};
use chain_eth::FeeParams;
use chain_params::{AddressType, Chain, FeeMultipliers, NetworkParameters};
use chain_provider::{EndpointHealth, ProviderError, Transport};
use tokio::sync::mpsc;

use crate::address;
use crate::backend::ChainBackend;
use crate::cache::AccountCache;
use crate::config::{ChainSettings, WalletConfig};
use crate::error::{BuildError, WalletError};
use crate::fee;
use crate::signer::Signer;
use crate::transaction::{SignablePayload, SignedTransaction, TransactionRecord, TransactionState};
use crate::types::{AccountState, Address, Fee, FeeParameters, PublicKey, TransferIntent, UnspentOutput};

/// Mortality of Substrate extrinsics, in blocks.
const ERA_PERIOD: u64 = 64;

/// Lower bound for `watch_pending` polling.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

fn to_u64(value: U256, what: &str) -> Result<u64, BuildError> {
    u64::try_from(value).map_err(|_| BuildError::InvalidAmount(format!("{what} {value} exceeds u64")))
}

fn to_u128(value: U256, what: &str) -> Result<u128, BuildError> {
    u128::try_from(value).map_err(|_| BuildError::InvalidAmount(format!("{what} {value} exceeds u128")))
}

fn ensure_funds(balance: U256, required: U256) -> Result<(), BuildError> {
    if required > balance {
        return Err(BuildError::InsufficientFunds {
            available: u128::try_from(balance).unwrap_or(u128::MAX),
            required: u128::try_from(required).unwrap_or(u128::MAX),
        });
    }
    Ok(())
}

fn fee_mismatch(fee: &Fee, chain: Chain) -> BuildError {
    BuildError::InvalidState(format!("{:?} fee cannot pay for a {chain} transaction", fee.parameters))
}

#[derive(Debug)]
pub struct WalletManager {
    chain: Chain,
    params: NetworkParameters,
    account: Address,
    account_key: Vec<u8>,
    backend: Arc<ChainBackend>,
    cache: AccountCache,
    fee_multipliers: FeeMultipliers,
}

impl WalletManager {
    pub fn new(
        settings: ChainSettings,
        account: Address,
        backend: Arc<ChainBackend>,
    ) -> Result<Self, WalletError> {
        if backend.family() != settings.params.family() {
            return Err(WalletError::Config(format!(
                "{:?} backend cannot serve {}",
                backend.family(),
                settings.chain
            )));
        }
        address::check(&account.value, &settings.params)?;
        let account_key = account.public_key.account_key()?;

        Ok(Self {
            chain: settings.chain,
            params: settings.params,
            account,
            account_key,
            backend,
            cache: AccountCache::new(settings.cache_ttl),
            fee_multipliers: settings.fee_multipliers,
        })
    }

    /// Derives the account address of `key` and connects to the chain's
    /// configured endpoints.
    pub fn from_config(
        config: &WalletConfig,
        chain: Chain,
        key: &PublicKey,
        address_type: AddressType,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, WalletError> {
        let settings = config.settings(chain)?;
        let account = address::derive(key, &settings.params, address_type)?;
        let backend = ChainBackend::new(
            chain.family(),
            settings.endpoints.clone(),
            transport,
            settings.multiplexer,
        )?;
        Self::new(settings, account, Arc::new(backend))
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn address(&self) -> &Address {
        &self.account
    }

    pub fn params(&self) -> &NetworkParameters {
        &self.params
    }

    pub fn health(&self) -> Vec<EndpointHealth> {
        self.backend.health()
    }

    // -----------------------------------------------------------------------
    // Account state
    // -----------------------------------------------------------------------

    /// Account state, served from the cache while it is fresh.
    pub async fn get_account_state(&self) -> Result<AccountState, WalletError> {
        if let Some(state) = self.cache.get(self.chain, &self.account.value) {
            return Ok(state);
        }
        self.refresh_account_state().await
    }

    /// Account state read from the network, bypassing the cache.
    pub async fn refresh_account_state(&self) -> Result<AccountState, WalletError> {
        let address = self.account.value.clone();
        let mut state = AccountState {
            chain: self.chain,
            address: address.clone(),
            balance: U256::ZERO,
            nonce: None,
            account_number: None,
            unspent_outputs: Vec::new(),
        };

        match &*self.backend {
            ChainBackend::Utxo(provider) => {
                let addresses = [address.clone()];
                let (balance, mut utxos) =
                    tokio::join!(provider.balance(&address), provider.utxos(&addresses));
                let balance = balance?;
                let entries = utxos.pop().ok_or_else(|| {
                    ProviderError::Decode("no unspent output result for the account".into())
                })??;

                let total = i128::from(balance.confirmed) + i128::from(balance.pending);
                let total = u128::try_from(total).map_err(|_| {
                    ProviderError::Decode(format!("negative balance {total} for {address}"))
                })?;
                state.balance = U256::from(total);
                state.unspent_outputs = entries
                    .into_iter()
                    .map(|e| UnspentOutput {
                        txid: e.txid,
                        vout: e.vout,
                        amount: e.value,
                        address: address.clone(),
                        confirmed: e.confirmed,
                    })
                    .collect();
            }
            ChainBackend::Evm(provider) => {
                let (balance, nonce) =
                    tokio::try_join!(provider.balance(&address), provider.nonce(&address))?;
                state.balance = balance;
                state.nonce = Some(nonce);
            }
            ChainBackend::Cosmos(provider) => {
                let params = self.params.as_cosmos()?;
                let (account, balance) = tokio::try_join!(
                    provider.account(&address),
                    provider.balance(&address, params.denom)
                )?;
                state.balance = U256::from(balance);
                state.nonce = Some(account.map_or(0, |a| a.sequence));
                state.account_number = account.map(|a| a.account_number);
            }
            ChainBackend::Solana(provider) => {
                state.balance = U256::from(provider.balance(&address).await?);
            }
            ChainBackend::Substrate(provider) => {
                let info = provider.balance_info(&address).await?;
                state.balance = U256::from(info.free);
                state.nonce = Some(info.nonce);
            }
        }

        tracing::debug!(
            chain = ?self.chain,
            address = %state.address,
            balance = %state.balance,
            "account state refreshed"
        );
        self.cache.insert(state.clone());
        Ok(state)
    }

    fn check_intent(&self, intent: &TransferIntent) -> Result<(), WalletError> {
        if intent.amount.is_zero() {
            return Err(BuildError::InvalidAmount("amount must be > 0".into()).into());
        }
        address::check(&intent.destination, &self.params)?;
        if let Some(contract) = &intent.token_contract {
            if !matches!(self.params, NetworkParameters::Evm(_)) {
                return Err(WalletError::UnsupportedChain(format!(
                    "token transfers on {}",
                    self.chain
                )));
            }
            address::check(contract, &self.params)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Fees
    // -----------------------------------------------------------------------

    /// Fee quotes for `intent`, slow to fast.
    pub async fn estimate_fee(&self, intent: &TransferIntent) -> Result<Vec<Fee>, WalletError> {
        self.check_intent(intent)?;

        let fees = match &*self.backend {
            ChainBackend::Utxo(provider) => {
                let params = self.params.as_utxo()?;
                let amount = to_u64(intent.amount, "amount")?;
                let kind = SpendKind::for_address_type(self.account.address_type, params);
                let utxos = self.utxo_snapshot().await?;
                let rates = provider.fee_rates().await?;

                // the fast rate may need more inputs than the slow one
                let floored = rates.map(|r| r.max(params.min_relay_fee_rate));
                let selection = match floored
                    .iter()
                    .rev()
                    .find_map(|&rate| chain_btc::select_utxos(&utxos, amount, rate, kind).ok())
                {
                    Some(selection) => selection,
                    None => chain_btc::select_utxos(&utxos, amount, floored[0], kind)?,
                };
                fee::utxo_fees(rates, params, kind, selection.selected.len())?
            }
            ChainBackend::Evm(provider) => {
                let params = self.params.as_evm()?;
                let (to, value, data) = self.evm_call(intent)?;
                let gas_limit = provider
                    .estimate_gas(&self.account.value, &to, value, &data)
                    .await?;

                let history = if params.eip1559 {
                    match provider.fee_history(FEE_HISTORY_BLOCKS, &REWARD_PERCENTILES).await {
                        Ok(history) => Some(history),
                        Err(e) => {
                            tracing::warn!(chain = ?self.chain, error = %e, "fee history unavailable");
                            None
                        }
                    }
                } else {
                    None
                };
                let gas_price = match provider.gas_price().await {
                    Ok(price) => Some(price),
                    Err(e) => {
                        tracing::warn!(chain = ?self.chain, error = %e, "gas price unavailable");
                        None
                    }
                };
                fee::evm_fees(params, history.as_ref(), gas_price, gas_limit, &self.fee_multipliers)?
            }
            ChainBackend::Cosmos(provider) => {
                let params = self.params.as_cosmos()?;
                let state = self.get_account_state().await?;
                let send = CosmosSend {
                    to: intent.destination.clone(),
                    amount: to_u128(intent.amount, "amount")?,
                    fee_amount: 0,
                    gas_limit: params.default_gas_limit,
                    account_number: state.account_number.unwrap_or(0),
                    sequence: state.nonce.unwrap_or(0),
                    memo: intent.memo.clone(),
                };
                let probe = chain_cosmos::build_send(params, &send, &self.account_key)?;
                let gas_used = provider.simulate(&probe.simulation_tx_bytes()).await?;
                fee::cosmos_fees(params, Some(gas_used))?
            }
            ChainBackend::Solana(provider) => {
                let tx = self.solana_transfer(provider, intent).await?;
                let message_fee = provider
                    .fee_for_message(&STANDARD.encode(&tx.message_bytes))
                    .await?;
                let signers = usize::from(tx.message.header.num_required_signatures);
                fee::solana_fees(message_fee, signers)?
            }
            ChainBackend::Substrate(provider) => {
                let extrinsic = self.substrate_transfer(provider, intent).await?;
                let partial_fee = provider.fee_estimate(&extrinsic.fee_probe().raw_tx).await?;
                fee::substrate_fees(partial_fee)?
            }
        };

        tracing::debug!(
            chain = ?self.chain,
            amounts = ?fees.iter().map(|f| f.amount.to_string()).collect::<Vec<_>>(),
            "fees estimated"
        );
        Ok(fees)
    }

    /// Call target, value and calldata of an EVM intent.
    fn evm_call(&self, intent: &TransferIntent) -> Result<(String, U256, Vec<u8>), WalletError> {
        match &intent.token_contract {
            Some(contract) => {
                let recipient = chain_eth::address::parse_address(&intent.destination)?;
                let data = chain_eth::erc20::transfer_calldata(&recipient, intent.amount);
                Ok((contract.clone(), U256::ZERO, data))
            }
            None => Ok((intent.destination.clone(), intent.amount, Vec::new())),
        }
    }

    async fn utxo_snapshot(&self) -> Result<Vec<Utxo>, WalletError> {
        let state = self.get_account_state().await?;
        Ok(state
            .unspent_outputs
            .into_iter()
            .map(|u| Utxo {
                txid: u.txid,
                vout: u.vout,
                amount_sat: u.amount,
                script_pubkey: Vec::new(),
            })
            .collect())
    }

    async fn solana_transfer(
        &self,
        provider: &chain_provider::solana::SolanaProvider,
        intent: &TransferIntent,
    ) -> Result<chain_sol::UnsignedSolTx, WalletError> {
        let from: [u8; 32] = self.account_key.as_slice().try_into().map_err(|_| {
            BuildError::Chain {
                chain: "solana".into(),
                reason: format!("account key is {} bytes", self.account_key.len()),
            }
        })?;
        let to = chain_sol::address_to_bytes(&intent.destination)?;
        let lamports = to_u64(intent.amount, "amount")?;
        let blockhash = provider.latest_blockhash().await?;
        Ok(chain_sol::build_sol_transfer(&from, &to, lamports, &blockhash.blockhash)?)
    }

    async fn substrate_transfer(
        &self,
        provider: &chain_provider::sidecar::SidecarProvider,
        intent: &TransferIntent,
    ) -> Result<chain_dot::UnsignedExtrinsic, WalletError> {
        let params = self.params.as_substrate()?;
        let (info, material) =
            tokio::try_join!(provider.balance_info(&self.account.value), provider.material())?;

        let genesis = params.genesis_hash_bytes()?;
        if material.genesis_hash != genesis {
            return Err(BuildError::Chain {
                chain: params.name.into(),
                reason: format!(
                    "node genesis 0x{} does not match",
                    hex::encode(material.genesis_hash)
                ),
            }
            .into());
        }

        let state = ChainState {
            spec_version: material.spec_version,
            transaction_version: material.transaction_version,
            block_hash: material.block_hash,
            block_number: material.block_number,
            nonce: info.nonce,
            era_period: ERA_PERIOD,
            tip: 0,
        };
        let amount = to_u128(intent.amount, "amount")?;
        Ok(chain_dot::build_transfer(
            params,
            &self.account_key,
            &intent.destination,
            amount,
            &state,
        )?)
    }

    // -----------------------------------------------------------------------
    // Build, sign, send
    // -----------------------------------------------------------------------

    /// Builds the unsigned transaction for `intent` priced by `fee`.
    pub async fn build_transaction(
        &self,
        intent: TransferIntent,
        fee: &Fee,
    ) -> Result<TransactionRecord, WalletError> {
        self.check_intent(&intent)?;
        let mut fee = fee.clone();

        let payload = match &*self.backend {
            ChainBackend::Utxo(_) => {
                let params = self.params.as_utxo()?;
                let FeeParameters::Utxo { rate_per_vbyte } = fee.parameters else {
                    return Err(fee_mismatch(&fee, self.chain).into());
                };
                let kind = SpendKind::for_address_type(self.account.address_type, params);
                let utxos = self.utxo_snapshot().await?;
                let tx = chain_btc::build_transaction(
                    params,
                    &utxos,
                    &intent.destination,
                    to_u64(intent.amount, "amount")?,
                    &self.account_key,
                    kind,
                    rate_per_vbyte,
                )?;
                fee.amount = U256::from(tx.fee_sat);
                SignablePayload::Utxo(tx)
            }
            ChainBackend::Evm(_) => {
                let params = self.params.as_evm()?;
                let (fee_params, gas_limit) = match fee.parameters {
                    FeeParameters::EvmLegacy {
                        gas_price,
                        gas_limit,
                    } => (FeeParams::Legacy { gas_price }, gas_limit),
                    FeeParameters::Eip1559 {
                        max_fee_per_gas,
                        max_priority_fee_per_gas,
                        gas_limit,
                    } => (
                        FeeParams::Eip1559 {
                            max_fee_per_gas,
                            max_priority_fee_per_gas,
                        },
                        gas_limit,
                    ),
                    _ => return Err(fee_mismatch(&fee, self.chain).into()),
                };
                let state = self.get_account_state().await?;
                let max_cost = fee_params.max_cost(gas_limit);
                let nonce = state.nonce.unwrap_or(0);

                let tx = match &intent.token_contract {
                    Some(contract) => {
                        ensure_funds(state.balance, max_cost)?;
                        chain_eth::build_erc20_transfer(
                            params,
                            nonce,
                            contract,
                            &intent.destination,
                            intent.amount,
                            gas_limit,
                            fee_params,
                        )?
                    }
                    None => {
                        ensure_funds(state.balance, intent.amount.saturating_add(max_cost))?;
                        chain_eth::build_transfer(
                            params,
                            nonce,
                            &intent.destination,
                            intent.amount,
                            gas_limit,
                            fee_params,
                        )?
                    }
                };
                fee.amount = max_cost;
                SignablePayload::Evm {
                    tx,
                    public_key: self.account_key.clone(),
                }
            }
            ChainBackend::Cosmos(_) => {
                let params = self.params.as_cosmos()?;
                let FeeParameters::Cosmos { gas_limit } = fee.parameters else {
                    return Err(fee_mismatch(&fee, self.chain).into());
                };
                let state = self.get_account_state().await?;
                ensure_funds(state.balance, intent.amount.saturating_add(fee.amount))?;
                let account_number = state.account_number.ok_or_else(|| {
                    BuildError::InvalidState(format!("{} has no on-chain account", state.address))
                })?;
                let send = CosmosSend {
                    to: intent.destination.clone(),
                    amount: to_u128(intent.amount, "amount")?,
                    fee_amount: to_u128(fee.amount, "fee")?,
                    gas_limit,
                    account_number,
                    sequence: state.nonce.unwrap_or(0),
                    memo: intent.memo.clone(),
                };
                SignablePayload::Cosmos(chain_cosmos::build_send(params, &send, &self.account_key)?)
            }
            ChainBackend::Solana(provider) => {
                if !matches!(fee.parameters, FeeParameters::Solana { .. }) {
                    return Err(fee_mismatch(&fee, self.chain).into());
                }
                let state = self.get_account_state().await?;
                ensure_funds(state.balance, intent.amount.saturating_add(fee.amount))?;
                SignablePayload::Solana(self.solana_transfer(provider, &intent).await?)
            }
            ChainBackend::Substrate(provider) => {
                if !matches!(fee.parameters, FeeParameters::Substrate { .. }) {
                    return Err(fee_mismatch(&fee, self.chain).into());
                }
                let state = self.get_account_state().await?;
                ensure_funds(state.balance, intent.amount.saturating_add(fee.amount))?;
                SignablePayload::Substrate(self.substrate_transfer(provider, &intent).await?)
            }
        };

        tracing::debug!(
            chain = ?self.chain,
            destination = %intent.destination,
            amount = %intent.amount,
            fee = %fee.amount,
            "transaction built"
        );
        Ok(TransactionRecord::new(self.chain, intent, fee, payload))
    }

    /// Asks `signer` for the record's signatures and finalizes it. A record
    /// that is already signed is returned as it is.
    pub async fn sign(
        &self,
        record: &mut TransactionRecord,
        signer: &dyn Signer,
    ) -> Result<SignedTransaction, WalletError> {
        if let Some(signed) = record.signed() {
            return Ok(signed.clone());
        }
        let signatures = signer.sign(record.sign_request()).await?;
        Ok(record.finalize(signatures)?.clone())
    }

    /// Broadcasts a signed record once and returns its hash. On failure the
    /// record stays `Signed`, so the caller may retry with [`Self::send_via`].
    pub async fn send(&self, record: &mut TransactionRecord) -> Result<String, WalletError> {
        self.submit(record, None).await
    }

    /// Broadcasts a signed record once through endpoint `endpoint` of this
    /// chain's configured list.
    pub async fn send_via(
        &self,
        record: &mut TransactionRecord,
        endpoint: usize,
    ) -> Result<String, WalletError> {
        self.submit(record, Some(endpoint)).await
    }

    async fn submit(
        &self,
        record: &mut TransactionRecord,
        endpoint: Option<usize>,
    ) -> Result<String, WalletError> {
        let signed = match (record.state(), record.signed()) {
            (TransactionState::Signed, Some(signed)) => signed.clone(),
            (state, _) => {
                return Err(BuildError::InvalidState(format!("cannot send a {state:?} transaction"))
                    .into())
            }
        };

        let sent = match endpoint {
            None => self.backend.broadcast(&signed).await,
            Some(index) => self.backend.broadcast_via(&signed, index).await,
        };
        let hash = match sent {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(
                    chain = ?self.chain,
                    tx_hash = %signed.tx_hash,
                    endpoint = ?endpoint,
                    error = %e,
                    "broadcast failed"
                );
                return Err(e.into());
            }
        };
        record.mark_broadcast()?;
        self.cache.invalidate(self.chain, &self.account.value);

        tracing::info!(chain = ?self.chain, tx_hash = %hash, "transaction broadcast");
        Ok(hash)
    }

    /// Polls the chain once for a broadcast record.
    pub async fn track_pending(
        &self,
        record: &mut TransactionRecord,
    ) -> Result<TransactionState, WalletError> {
        if record.state().is_terminal() {
            return Ok(record.state().clone());
        }
        let hash = match (record.state(), record.tx_hash()) {
            (TransactionState::BroadcastPending, Some(hash)) => hash.to_string(),
            (state, _) => {
                return Err(BuildError::InvalidState(format!("cannot track a {state:?} transaction"))
                    .into())
            }
        };

        let status = self.backend.tx_status(&hash).await?;
        let state = record.apply_status(&status)?.clone();
        if state.is_terminal() {
            tracing::info!(chain = ?self.chain, tx_hash = %hash, state = ?state, "transaction settled");
        }
        Ok(state)
    }

    /// Polls `tx_hash` every `interval` on a background task and reports
    /// each state change. The task ends at a terminal state, on a backend
    /// that cannot report status, or when the receiver is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch_pending(&self, tx_hash: String, interval: Duration) -> mpsc::Receiver<TransactionState> {
        let (sender, receiver) = mpsc::channel(8);
        let backend = Arc::clone(&self.backend);
        let chain = self.chain;
        let interval = interval.max(MIN_POLL_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last: Option<TransactionState> = None;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = sender.closed() => break,
                }
                match backend.tx_status(&tx_hash).await {
                    Ok(status) => {
                        let state = TransactionState::from(&status);
                        let terminal = state.is_terminal();
                        if last.as_ref() != Some(&state) {
                            if terminal {
                                tracing::info!(chain = ?chain, tx_hash = %tx_hash, state = ?state, "transaction settled");
                            }
                            if sender.send(state.clone()).await.is_err() {
                                break;
                            }
                            last = Some(state);
                        }
                        if terminal {
                            break;
                        }
                    }
                    Err(ProviderError::Unsupported(reason)) => {
                        tracing::warn!(chain = ?chain, tx_hash = %tx_hash, %reason, "status tracking unsupported");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(chain = ?chain, tx_hash = %tx_hash, error = %e, "status poll failed");
                    }
                }
            }
        });
        receiver
    }
}
