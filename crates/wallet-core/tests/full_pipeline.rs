//! Cross-crate integration tests exercising the full pipeline:
//! public key -> address -> fee -> build -> external sign -> broadcast -> track.
//!
//! The offline tests drive `TransactionRecord` directly against known
//! vectors; the rest run a `WalletManager` against mocked provider APIs.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_params::{parameters, Curve};
use chain_provider::{HttpTransport, Transport};
use httpmock::{Method, MockServer};
use serde_json::json;
use wallet_core::transaction::SignablePayload;
use wallet_core::*;

const GAIA_KEY: [u8; 32] = [
    0x80, 0xe8, 0x1e, 0xa2, 0x69, 0xe6, 0x6a, 0x0a, 0x05, 0xb1, 0x12, 0x36, 0xdf, 0x79, 0x19, 0xfb,
    0x7f, 0xbe, 0xed, 0xba, 0x87, 0x45, 0x2d, 0x66, 0x74, 0x89, 0xd7, 0x40, 0x3a, 0x02, 0xf0, 0x05,
];
const GAIA_DIGEST: &str = "8a6e6f74625fd39707843360120874853cc0c1d730b087f3939f4b187c75b907";
const GAIA_RECIPIENT: &str = "cosmos1zt50azupanqlfam5afhv3hexwyutnukeh4c573";

const BECH32_RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
const ETH_RECIPIENT: &str = "0x3535353535353535353535353535353535353535";

fn transport() -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new())
}

fn single_chain_config(chain: &str, url: &str) -> WalletConfig {
    WalletConfig::from_toml_str(&format!(
        r#"
[[chains]]
chain = "{chain}"

[[chains.endpoints]]
url = "{url}"
"#
    ))
    .unwrap()
}

fn rpc_ok(result: serde_json::Value) -> String {
    json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
}

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

// ─── Offline: record + local signer against known vectors ──────────

#[tokio::test]
async fn eth_legacy_record_matches_eip155_vector() {
    let signer = LocalKeySigner::new([0x46; 32], Curve::Secp256k1).unwrap();
    let tx = chain_eth::build_transfer(
        parameters(Chain::Ethereum).as_evm().unwrap(),
        9,
        ETH_RECIPIENT,
        ether(1),
        21_000,
        chain_eth::FeeParams::Legacy {
            gas_price: U256::from(20_000_000_000u64),
        },
    )
    .unwrap();
    assert_eq!(
        hex::encode(tx.signing_hash()),
        "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
    );

    let mut record = TransactionRecord::new(
        Chain::Ethereum,
        TransferIntent::new(ether(1), ETH_RECIPIENT),
        Fee {
            tier: FeeTier::Market,
            amount: U256::from(420_000_000_000_000u64),
            parameters: FeeParameters::EvmLegacy {
                gas_price: U256::from(20_000_000_000u64),
                gas_limit: 21_000,
            },
        },
        SignablePayload::Evm {
            tx,
            public_key: signer.public_key().unwrap(),
        },
    );

    let signatures = signer.sign(record.sign_request()).await.unwrap();
    let signed = record.finalize(signatures).unwrap();
    assert_eq!(
        hex::encode(&signed.raw_tx),
        "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
    );
    assert_eq!(record.state(), &TransactionState::Signed);
}

#[tokio::test]
async fn solana_record_is_signed_by_fee_payer() {
    let signer = LocalKeySigner::new([0x07; 32], Curve::Ed25519).unwrap();
    let from: [u8; 32] = signer.public_key().unwrap().try_into().unwrap();
    let to = [0x09; 32];
    let tx = chain_sol::build_sol_transfer(&from, &to, 1_000_000, &[0x01; 32]).unwrap();
    let message = tx.message_bytes.clone();

    let mut record = TransactionRecord::new(
        Chain::Solana,
        TransferIntent::new(U256::from(1_000_000u64), chain_sol::bytes_to_address(&to)),
        Fee {
            tier: FeeTier::Slow,
            amount: U256::from(5_000u64),
            parameters: FeeParameters::Solana {
                lamports_per_signature: 5_000,
            },
        },
        SignablePayload::Solana(tx),
    );
    let request = record.sign_request();
    assert_eq!(request.kind, PayloadKind::Ed25519Message);
    assert_eq!(request.payloads, vec![message.clone()]);

    let signatures = signer.sign(request).await.unwrap();
    let signed = record.finalize(signatures.clone()).unwrap().clone();

    // one signature, then the message
    assert_eq!(signed.raw_tx[0], 1);
    assert_eq!(&signed.raw_tx[1..65], signatures[0].as_slice());
    assert_eq!(&signed.raw_tx[65..], message.as_slice());
    assert_eq!(signed.tx_hash, bs58::encode(&signatures[0]).into_string());
}

#[tokio::test]
async fn substrate_record_signs_payload() {
    let signer = LocalKeySigner::new([0x21; 32], Curve::Ed25519).unwrap();
    let params = parameters(Chain::Westend).as_substrate().unwrap();
    let dest = chain_dot::address::address_from_pubkey(&[0x42; 32], params).unwrap();
    let state = chain_dot::ChainState {
        spec_version: 1_016_000,
        transaction_version: 26,
        block_hash: [0xab; 32],
        block_number: 22_000_000,
        nonce: 3,
        era_period: 64,
        tip: 0,
    };
    let extrinsic = chain_dot::build_transfer(
        params,
        &signer.public_key().unwrap(),
        &dest,
        1_000_000_000_000,
        &state,
    )
    .unwrap();
    let probe_len = extrinsic.fee_probe().raw_tx.len();

    let mut record = TransactionRecord::new(
        Chain::Westend,
        TransferIntent::new(U256::from(1_000_000_000_000u64), dest),
        Fee {
            tier: FeeTier::Market,
            amount: U256::from(15_600_000u64),
            parameters: FeeParameters::Substrate {
                partial_fee: 15_600_000,
            },
        },
        SignablePayload::Substrate(extrinsic),
    );
    let signatures = signer.sign(record.sign_request()).await.unwrap();
    let signed = record.finalize(signatures).unwrap();

    // the probe carries a zero signature of the same size
    assert_eq!(signed.raw_tx.len(), probe_len);
    assert!(signed.tx_hash.starts_with("0x"));
    assert_eq!(signed.tx_hash.len(), 66);
}

#[tokio::test]
async fn rejected_signing_leaves_record_built() {
    struct Refusing;

    #[async_trait::async_trait]
    impl Signer for Refusing {
        async fn sign(&self, _request: SignRequest) -> Result<Vec<Vec<u8>>, SignError> {
            Err(SignError::RejectedByUser)
        }
    }

    let server = MockServer::start();
    let manager = WalletManager::from_config(
        &single_chain_config("ethereum", &server.base_url()),
        Chain::Ethereum,
        &PublicKey::new(LocalKeySigner::new([0x11; 32], Curve::Secp256k1).unwrap().public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();

    let tx = chain_eth::build_transfer(
        parameters(Chain::Ethereum).as_evm().unwrap(),
        0,
        ETH_RECIPIENT,
        U256::from(1u64),
        21_000,
        chain_eth::FeeParams::Legacy {
            gas_price: U256::from(1u64),
        },
    )
    .unwrap();
    let mut record = TransactionRecord::new(
        Chain::Ethereum,
        TransferIntent::new(U256::from(1u64), ETH_RECIPIENT),
        Fee {
            tier: FeeTier::Slow,
            amount: U256::from(21_000u64),
            parameters: FeeParameters::EvmLegacy {
                gas_price: U256::from(1u64),
                gas_limit: 21_000,
            },
        },
        SignablePayload::Evm {
            tx,
            public_key: manager.address().public_key.bytes.clone(),
        },
    );

    let err = manager.sign(&mut record, &Refusing).await.unwrap_err();
    assert!(matches!(err, WalletError::Sign(SignError::RejectedByUser)));
    assert_eq!(record.state(), &TransactionState::Built);

    // a Built record cannot be sent
    assert!(matches!(
        manager.send(&mut record).await,
        Err(WalletError::Build(BuildError::InvalidState(_)))
    ));
}

// ─── BTC: manager against a mocked Esplora ──────────────────────────

#[tokio::test]
async fn btc_manager_full_pipeline() {
    let server = MockServer::start();
    let signer = LocalKeySigner::new([0x11; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("bitcoin", &server.base_url()),
        Chain::Bitcoin,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();
    let own = manager.address().value.clone();
    assert!(own.starts_with("bc1q"));

    let address_mock = server.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}"));
        then.status(200).json_body(json!({
            "address": own,
            "chain_stats": {"funded_txo_sum": 100_000, "spent_txo_sum": 0, "tx_count": 1},
            "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 0, "tx_count": 0},
        }));
    });
    let utxo_mock = server.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}/utxo"));
        then.status(200).json_body(json!([{
            "txid": "a1".repeat(32),
            "vout": 0,
            "value": 100_000,
            "status": {"confirmed": true, "block_height": 800_000},
        }]));
    });
    server.mock(|when, then| {
        when.method(Method::GET).path("/fee-estimates");
        then.status(200).json_body(json!({"1": 10.2, "6": 5, "25": 2}));
    });
    let broadcast_mock = server.mock(|when, then| {
        when.method(Method::POST).path("/tx");
        then.status(400)
            .json_body(json!({"error": "Transaction already in mempool"}));
    });
    server.mock(|when, then| {
        when.method(Method::GET).path_contains("/status");
        then.status(200)
            .json_body(json!({"confirmed": true, "block_height": 800_001}));
    });

    let state = manager.get_account_state().await.unwrap();
    assert_eq!(state.balance, U256::from(100_000u64));
    assert_eq!(state.unspent_outputs.len(), 1);
    assert!(state.nonce.is_none());

    let intent = TransferIntent::new(U256::from(50_000u64), BECH32_RECIPIENT);
    let fees = manager.estimate_fee(&intent).await.unwrap();
    assert_eq!(
        fees.iter().map(|f| f.amount).collect::<Vec<_>>(),
        vec![U256::from(282u64), U256::from(705u64), U256::from(1_551u64)]
    );

    let mut record = manager
        .build_transaction(intent, wallet_core::fee::select(&fees, FeeTier::Market).unwrap())
        .await
        .unwrap();
    assert_eq!(record.fee.amount, U256::from(705u64));
    // served from the cache
    assert_eq!(address_mock.hits(), 1);
    assert_eq!(utxo_mock.hits(), 1);

    let signed = manager.sign(&mut record, &signer).await.unwrap();
    assert_eq!(signed.tx_hash.len(), 64);

    let hash = manager.send(&mut record).await.unwrap();
    assert_eq!(hash, signed.tx_hash);
    assert_eq!(record.state(), &TransactionState::BroadcastPending);
    broadcast_mock.assert();

    // a second send is refused without touching the network
    assert!(manager.send(&mut record).await.is_err());
    assert_eq!(broadcast_mock.hits(), 1);

    let state = manager.track_pending(&mut record).await.unwrap();
    assert_eq!(state, TransactionState::Confirmed { block: Some(800_001) });

    // broadcasting invalidated the cached account
    manager.get_account_state().await.unwrap();
    assert_eq!(address_mock.hits(), 2);
}

#[tokio::test]
async fn btc_insufficient_funds_surfaces_from_estimate() {
    let server = MockServer::start();
    let signer = LocalKeySigner::new([0x12; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("bitcoin", &server.base_url()),
        Chain::Bitcoin,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();
    let own = manager.address().value.clone();

    server.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}"));
        then.status(200).json_body(json!({
            "address": own,
            "chain_stats": {"funded_txo_sum": 1_000, "spent_txo_sum": 0, "tx_count": 1},
            "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 0, "tx_count": 0},
        }));
    });
    server.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}/utxo"));
        then.status(200).json_body(json!([{
            "txid": "b2".repeat(32),
            "vout": 1,
            "value": 1_000,
            "status": {"confirmed": true},
        }]));
    });
    server.mock(|when, then| {
        when.method(Method::GET).path("/fee-estimates");
        then.status(200).json_body(json!({"1": 3, "6": 2, "25": 1}));
    });

    let err = manager
        .estimate_fee(&TransferIntent::new(U256::from(50_000u64), BECH32_RECIPIENT))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::Build(BuildError::InsufficientFunds { available: 1_000, .. })
    ));

    // invalid destinations never reach the network
    let err = manager
        .estimate_fee(&TransferIntent::new(U256::from(1u64), "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Address(_)));
}

#[tokio::test]
async fn btc_negative_balance_is_a_decode_error() {
    let server = MockServer::start();
    let signer = LocalKeySigner::new([0x13; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("bitcoin", &server.base_url()),
        Chain::Bitcoin,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();
    let own = manager.address().value.clone();

    server.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}"));
        then.status(200).json_body(json!({
            "address": own,
            "chain_stats": {"funded_txo_sum": 1_000, "spent_txo_sum": 0, "tx_count": 1},
            "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 5_000, "tx_count": 1},
        }));
    });
    server.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}/utxo"));
        then.status(200).json_body(json!([]));
    });

    let err = manager.get_account_state().await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Provider(chain_provider::ProviderError::Decode(_))
    ));
}

#[tokio::test]
async fn failed_send_can_be_retried_on_another_endpoint() {
    let primary = MockServer::start();
    let fallback = MockServer::start();
    let config = WalletConfig::from_toml_str(&format!(
        r#"
[[chains]]
chain = "bitcoin"

[[chains.endpoints]]
url = "{}"

[[chains.endpoints]]
url = "{}"
"#,
        primary.base_url(),
        fallback.base_url()
    ))
    .unwrap();
    let signer = LocalKeySigner::new([0x14; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &config,
        Chain::Bitcoin,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();
    let own = manager.address().value.clone();

    primary.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}"));
        then.status(200).json_body(json!({
            "address": own,
            "chain_stats": {"funded_txo_sum": 80_000, "spent_txo_sum": 0, "tx_count": 1},
            "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 0, "tx_count": 0},
        }));
    });
    primary.mock(|when, then| {
        when.method(Method::GET).path(format!("/address/{own}/utxo"));
        then.status(200).json_body(json!([{
            "txid": "c3".repeat(32),
            "vout": 0,
            "value": 80_000,
            "status": {"confirmed": true, "block_height": 800_000},
        }]));
    });
    primary.mock(|when, then| {
        when.method(Method::GET).path("/fee-estimates");
        then.status(200).json_body(json!({"1": 4, "6": 2, "25": 1}));
    });
    let refused = primary.mock(|when, then| {
        when.method(Method::POST).path("/tx");
        then.status(502).body("bad gateway");
    });

    let intent = TransferIntent::new(U256::from(20_000u64), BECH32_RECIPIENT);
    let fees = manager.estimate_fee(&intent).await.unwrap();
    let mut record = manager
        .build_transaction(intent, wallet_core::fee::select(&fees, FeeTier::Market).unwrap())
        .await
        .unwrap();
    let signed = manager.sign(&mut record, &signer).await.unwrap();

    let accepted = fallback.mock(|when, then| {
        when.method(Method::POST).path("/tx");
        then.status(200).body(signed.tx_hash.clone());
    });

    let err = manager.send(&mut record).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Provider(chain_provider::ProviderError::BroadcastFailed { endpoint: 0, .. })
    ));
    assert_eq!(record.state(), &TransactionState::Signed);
    refused.assert_hits(1);
    accepted.assert_hits(0);

    let hash = manager.send_via(&mut record, 1).await.unwrap();
    assert_eq!(hash, signed.tx_hash);
    assert_eq!(record.state(), &TransactionState::BroadcastPending);
    accepted.assert();
    refused.assert_hits(1);
}

#[tokio::test]
async fn watch_pending_reports_confirmation() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::GET).path_contains("/status");
        then.status(200)
            .json_body(json!({"confirmed": true, "block_height": 42}));
    });
    let signer = LocalKeySigner::new([0x13; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("bitcoin", &server.base_url()),
        Chain::Bitcoin,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();

    let mut updates = manager.watch_pending("c3".repeat(32), Duration::from_millis(5));
    let first = tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .unwrap();
    assert_eq!(first, Some(TransactionState::Confirmed { block: Some(42) }));
    // the watcher stops after a terminal state
    let next = tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .unwrap();
    assert_eq!(next, None);
}

// ─── ETH: manager against a mocked JSON-RPC node ────────────────────

#[tokio::test]
async fn eth_manager_full_pipeline() {
    let server = MockServer::start();
    let signer = LocalKeySigner::new([0x11; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("ethereum", &server.base_url()),
        Chain::Ethereum,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();

    let rpc = |method: &'static str, result: serde_json::Value| {
        server.mock(move |when, then| {
            when.method(Method::POST)
                .json_body_partial(json!({ "method": method }).to_string());
            then.status(200).body(rpc_ok(result));
        })
    };
    rpc("eth_estimateGas", json!("0x5208"));
    rpc(
        "eth_feeHistory",
        json!({
            "oldestBlock": "0x10",
            "baseFeePerGas": ["0x218711a00", "0x2540be400"],
            "gasUsedRatio": [0.5],
            "reward": [["0x3b9aca00", "0x77359400", "0xb2d05e00"]],
        }),
    );
    rpc("eth_gasPrice", json!("0x2540be400"));
    rpc("eth_getBalance", json!("0x8ac7230489e80000"));
    rpc("eth_getTransactionCount", json!("0x7"));
    let receipt = rpc("eth_getTransactionReceipt", json!({"status": "0x1", "blockNumber": "0x10"}));
    let send_mock = server.mock(|when, then| {
        when.method(Method::POST)
            .json_body_partial(r#"{"method":"eth_sendRawTransaction"}"#);
        then.status(200).body(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"already known"}}"#,
        );
    });

    let intent = TransferIntent::new(ether(1), ETH_RECIPIENT);
    let fees = manager.estimate_fee(&intent).await.unwrap();
    assert_eq!(fees.len(), 3);
    assert!(fees.windows(2).all(|w| w[0].amount <= w[1].amount));
    let market = wallet_core::fee::select(&fees, FeeTier::Market).unwrap().clone();
    assert!(matches!(
        market.parameters,
        FeeParameters::Eip1559 { gas_limit: 21_000, .. }
    ));

    let mut record = manager.build_transaction(intent, &market).await.unwrap();
    let signed = manager.sign(&mut record, &signer).await.unwrap();
    assert_eq!(signed.raw_tx[0], 0x02);

    let hash = manager.send(&mut record).await.unwrap();
    assert_eq!(hash, signed.tx_hash);
    send_mock.assert();

    let state = manager.track_pending(&mut record).await.unwrap();
    assert_eq!(state, TransactionState::Confirmed { block: Some(16) });
    receipt.assert();

    // settled records are not polled again
    manager.track_pending(&mut record).await.unwrap();
    assert_eq!(receipt.hits(), 1);
}

#[tokio::test]
async fn eth_balance_must_cover_value_and_fee() {
    let server = MockServer::start();
    let signer = LocalKeySigner::new([0x14; 32], Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("ethereum", &server.base_url()),
        Chain::Ethereum,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();
    server.mock(|when, then| {
        when.method(Method::POST)
            .json_body_partial(r#"{"method":"eth_getBalance"}"#);
        then.status(200).body(rpc_ok(json!("0xde0b6b3a7640000")));
    });
    server.mock(|when, then| {
        when.method(Method::POST)
            .json_body_partial(r#"{"method":"eth_getTransactionCount"}"#);
        then.status(200).body(rpc_ok(json!("0x0")));
    });

    let fee = Fee {
        tier: FeeTier::Fast,
        amount: U256::from(21_000u64) * U256::from(50_000_000_000u64),
        parameters: FeeParameters::Eip1559 {
            max_fee_per_gas: U256::from(50_000_000_000u64),
            max_priority_fee_per_gas: U256::from(2_000_000_000u64),
            gas_limit: 21_000,
        },
    };
    let err = manager
        .build_transaction(TransferIntent::new(ether(1), ETH_RECIPIENT), &fee)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::Build(BuildError::InsufficientFunds { .. })
    ));

    // a UTXO fee cannot price an EVM transaction
    let wrong = Fee {
        tier: FeeTier::Fast,
        amount: U256::from(1u64),
        parameters: FeeParameters::Utxo { rate_per_vbyte: 1 },
    };
    assert!(manager
        .build_transaction(TransferIntent::new(U256::from(1u64), ETH_RECIPIENT), &wrong)
        .await
        .is_err());
}

// ─── Cosmos: manager reproduces the gaia vector ─────────────────────

#[tokio::test]
async fn cosmos_manager_matches_gaia_vector() {
    let server = MockServer::start();
    let signer = LocalKeySigner::new(GAIA_KEY, Curve::Secp256k1).unwrap();
    let manager = WalletManager::from_config(
        &single_chain_config("gaia_testnet", &server.base_url()),
        Chain::GaiaTestnet,
        &PublicKey::new(signer.public_key().unwrap()),
        AddressType::Default,
        transport(),
    )
    .unwrap();

    server.mock(|when, then| {
        when.method(Method::GET)
            .path_contains("/cosmos/auth/v1beta1/accounts/");
        then.status(200).json_body(json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": manager.address().value,
                "account_number": "1037",
                "sequence": "8",
            }
        }));
    });
    server.mock(|when, then| {
        when.method(Method::GET).path_contains("/balances/");
        then.status(200)
            .json_body(json!({"balance": {"denom": "muon", "amount": "10000"}}));
    });
    let broadcast = server.mock(|when, then| {
        when.method(Method::POST).path("/cosmos/tx/v1beta1/txs");
        then.status(200).json_body(json!({
            "tx_response": {"height": "0", "txhash": "ignored", "code": 0, "raw_log": ""}
        }));
    });

    let state = manager.get_account_state().await.unwrap();
    assert_eq!(state.nonce, Some(8));
    assert_eq!(state.account_number, Some(1037));

    let fee = Fee {
        tier: FeeTier::Market,
        amount: U256::from(200u64),
        parameters: FeeParameters::Cosmos { gas_limit: 200_000 },
    };
    let mut record = manager
        .build_transaction(TransferIntent::new(U256::from(1u64), GAIA_RECIPIENT), &fee)
        .await
        .unwrap();
    assert_eq!(hex::encode(&record.sign_request().payloads[0]), GAIA_DIGEST);

    let signed = manager.sign(&mut record, &signer).await.unwrap();
    let envelope: serde_json::Value =
        serde_json::from_str(signed.envelope.as_deref().unwrap()).unwrap();
    assert_eq!(envelope["tx_bytes"], STANDARD.encode(&signed.raw_tx));

    manager.send(&mut record).await.unwrap();
    broadcast.assert();
}

// ─── Configuration and wiring ───────────────────────────────────────

#[test]
fn manager_rejects_backend_of_another_family() {
    let config = single_chain_config("bitcoin", "http://127.0.0.1:1");
    let settings = config.settings(Chain::Bitcoin).unwrap();
    let key = PublicKey::new(LocalKeySigner::new([0x11; 32], Curve::Secp256k1).unwrap().public_key().unwrap());
    let account = wallet_core::address::derive(&key, &settings.params, AddressType::Default).unwrap();
    let backend = wallet_core::backend::ChainBackend::new(
        ChainFamily::Evm,
        settings.endpoints.clone(),
        transport(),
        settings.multiplexer,
    )
    .unwrap();

    assert!(matches!(
        WalletManager::new(settings, account, Arc::new(backend)),
        Err(WalletError::Config(_))
    ));
}

#[test]
fn unconfigured_chain_is_a_config_error() {
    let config = single_chain_config("bitcoin", "http://127.0.0.1:1");
    let key = PublicKey::new(vec![0u8; 32]);
    let err = WalletManager::from_config(&config, Chain::Solana, &key, AddressType::Default, transport())
        .unwrap_err();
    assert_eq!(err.to_string(), "configuration error: Solana is not configured");
}
