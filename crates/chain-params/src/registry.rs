use serde::Serialize;

use crate::chain::{Chain, ChainFamily};
use crate::cosmos::{self, CosmosParams};
use crate::error::ParamsError;
use crate::evm::{self, EvmParams};
use crate::solana::{self, SolanaParams};
use crate::substrate::{self, SubstrateParams};
use crate::utxo::{self, UtxoParams};

/// Per-chain constants, one variant per chain family.
#[derive(Debug, Clone, Serialize)]
pub enum NetworkParameters {
    Utxo(UtxoParams),
    Evm(EvmParams),
    Cosmos(CosmosParams),
    Solana(SolanaParams),
    Substrate(SubstrateParams),
}

impl NetworkParameters {
    pub fn family(&self) -> ChainFamily {
        match self {
            NetworkParameters::Utxo(_) => ChainFamily::Utxo,
            NetworkParameters::Evm(_) => ChainFamily::Evm,
            NetworkParameters::Cosmos(_) => ChainFamily::Cosmos,
            NetworkParameters::Solana(_) => ChainFamily::Solana,
            NetworkParameters::Substrate(_) => ChainFamily::Substrate,
        }
    }

    pub fn as_utxo(&self) -> Result<&UtxoParams, ParamsError> {
        match self {
            NetworkParameters::Utxo(p) => Ok(p),
            other => Err(mismatch(other, ChainFamily::Utxo)),
        }
    }

    pub fn as_evm(&self) -> Result<&EvmParams, ParamsError> {
        match self {
            NetworkParameters::Evm(p) => Ok(p),
            other => Err(mismatch(other, ChainFamily::Evm)),
        }
    }

    pub fn as_cosmos(&self) -> Result<&CosmosParams, ParamsError> {
        match self {
            NetworkParameters::Cosmos(p) => Ok(p),
            other => Err(mismatch(other, ChainFamily::Cosmos)),
        }
    }

    pub fn as_solana(&self) -> Result<&SolanaParams, ParamsError> {
        match self {
            NetworkParameters::Solana(p) => Ok(p),
            other => Err(mismatch(other, ChainFamily::Solana)),
        }
    }

    pub fn as_substrate(&self) -> Result<&SubstrateParams, ParamsError> {
        match self {
            NetworkParameters::Substrate(p) => Ok(p),
            other => Err(mismatch(other, ChainFamily::Substrate)),
        }
    }
}

fn mismatch(params: &NetworkParameters, wanted: ChainFamily) -> ParamsError {
    ParamsError::FamilyMismatch(format!(
        "expected {wanted:?} parameters, found {:?}",
        params.family()
    ))
}

// ---------------------------------------------------------------------------
// Static table
// ---------------------------------------------------------------------------

static BITCOIN: NetworkParameters = NetworkParameters::Utxo(utxo::BITCOIN);
static BITCOIN_TESTNET: NetworkParameters = NetworkParameters::Utxo(utxo::BITCOIN_TESTNET);
static LITECOIN: NetworkParameters = NetworkParameters::Utxo(utxo::LITECOIN);
static DOGECOIN: NetworkParameters = NetworkParameters::Utxo(utxo::DOGECOIN);
static ETHEREUM: NetworkParameters = NetworkParameters::Evm(evm::ETHEREUM);
static POLYGON: NetworkParameters = NetworkParameters::Evm(evm::POLYGON);
static ARBITRUM: NetworkParameters = NetworkParameters::Evm(evm::ARBITRUM);
static BASE: NetworkParameters = NetworkParameters::Evm(evm::BASE);
static OPTIMISM: NetworkParameters = NetworkParameters::Evm(evm::OPTIMISM);
static BSC: NetworkParameters = NetworkParameters::Evm(evm::BSC);
static AVALANCHE: NetworkParameters = NetworkParameters::Evm(evm::AVALANCHE);
static SEPOLIA: NetworkParameters = NetworkParameters::Evm(evm::SEPOLIA);
static POLYGON_AMOY: NetworkParameters = NetworkParameters::Evm(evm::POLYGON_AMOY);
static COSMOS_HUB: NetworkParameters = NetworkParameters::Cosmos(cosmos::COSMOS_HUB);
static GAIA_TESTNET: NetworkParameters = NetworkParameters::Cosmos(cosmos::GAIA_TESTNET);
static TERRA_CLASSIC: NetworkParameters = NetworkParameters::Cosmos(cosmos::TERRA_CLASSIC);
static SOLANA: NetworkParameters = NetworkParameters::Solana(solana::MAINNET);
static SOLANA_DEVNET: NetworkParameters = NetworkParameters::Solana(solana::DEVNET);
static POLKADOT: NetworkParameters = NetworkParameters::Substrate(substrate::POLKADOT);
static KUSAMA: NetworkParameters = NetworkParameters::Substrate(substrate::KUSAMA);
static WESTEND: NetworkParameters = NetworkParameters::Substrate(substrate::WESTEND);

/// Returns the static parameters for `chain`.
pub fn parameters(chain: Chain) -> &'static NetworkParameters {
    match chain {
        Chain::Bitcoin => &BITCOIN,
        Chain::BitcoinTestnet => &BITCOIN_TESTNET,
        Chain::Litecoin => &LITECOIN,
        Chain::Dogecoin => &DOGECOIN,
        Chain::Ethereum => &ETHEREUM,
        Chain::Polygon => &POLYGON,
        Chain::Arbitrum => &ARBITRUM,
        Chain::Base => &BASE,
        Chain::Optimism => &OPTIMISM,
        Chain::Bsc => &BSC,
        Chain::Avalanche => &AVALANCHE,
        Chain::Sepolia => &SEPOLIA,
        Chain::PolygonAmoy => &POLYGON_AMOY,
        Chain::CosmosHub => &COSMOS_HUB,
        Chain::GaiaTestnet => &GAIA_TESTNET,
        Chain::TerraClassic => &TERRA_CLASSIC,
        Chain::Solana => &SOLANA,
        Chain::SolanaDevnet => &SOLANA_DEVNET,
        Chain::Polkadot => &POLKADOT,
        Chain::Kusama => &KUSAMA,
        Chain::Westend => &WESTEND,
    }
}

/// Finds the EVM chain with the given chain id.
pub fn evm_chain_by_id(chain_id: u64) -> Option<Chain> {
    Chain::ALL.into_iter().find(|chain| {
        matches!(parameters(*chain), NetworkParameters::Evm(p) if p.chain_id == chain_id)
    })
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Validated view over the static parameter table.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<(Chain, &'static NetworkParameters)>,
}

impl Registry {
    /// Validates every entry and returns the registry, or the first violation.
    pub fn load() -> Result<Self, ParamsError> {
        let entries: Vec<_> = Chain::ALL.into_iter().map(|c| (c, parameters(c))).collect();
        for (chain, params) in &entries {
            validate(*chain, params)?;
        }

        let mut chain_ids: Vec<u64> = entries
            .iter()
            .filter_map(|(_, p)| p.as_evm().ok().map(|e| e.chain_id))
            .collect();
        chain_ids.sort_unstable();
        if let Some(dup) = chain_ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(ParamsError::Invalid {
                chain: "evm".into(),
                reason: format!("chain id {} registered twice", dup[0]),
            });
        }

        Ok(Self { entries })
    }

    pub fn lookup(&self, chain: Chain) -> Result<&'static NetworkParameters, ParamsError> {
        self.entries
            .iter()
            .find(|(c, _)| *c == chain)
            .map(|(_, p)| *p)
            .ok_or_else(|| ParamsError::UnsupportedChain(chain.to_string()))
    }

    pub fn chains(&self) -> impl Iterator<Item = Chain> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }
}

/// Checks the structural constraints of one entry.
pub fn validate(chain: Chain, params: &NetworkParameters) -> Result<(), ParamsError> {
    let invalid = |reason: String| ParamsError::Invalid {
        chain: chain.to_string(),
        reason,
    };

    if params.family() != chain.family() {
        return Err(invalid(format!(
            "parameters are {:?}, chain is {:?}",
            params.family(),
            chain.family()
        )));
    }

    match params {
        NetworkParameters::Utxo(p) => {
            if p.dns_seeds.is_empty() {
                return Err(invalid("no DNS seeds".into()));
            }
            if p.p2pkh_prefix == p.p2sh_prefix {
                return Err(invalid("p2pkh and p2sh prefixes collide".into()));
            }
            if p.dust_threshold == 0 {
                return Err(invalid("dust threshold must be positive".into()));
            }
            if p.min_relay_fee_rate == 0 {
                return Err(invalid("minimum relay fee rate must be positive".into()));
            }
            if let Some(hrp) = p.bech32_hrp {
                if hrp.is_empty() || !hrp.bytes().all(|b| b.is_ascii_lowercase()) {
                    return Err(invalid(format!("bech32 hrp {hrp:?} must be lowercase ASCII")));
                }
            }
        }
        NetworkParameters::Evm(p) => {
            if p.chain_id == 0 {
                return Err(invalid("chain id must be non-zero".into()));
            }
        }
        NetworkParameters::Cosmos(p) => {
            if p.bech32_hrp.is_empty() || p.denom.is_empty() || p.chain_id.is_empty() {
                return Err(invalid("hrp, denom and chain id are required".into()));
            }
            let [slow, market, fast] = p.gas_prices_milli;
            if slow == 0 || slow > market || market > fast {
                return Err(invalid("gas price tiers must be positive and non-decreasing".into()));
            }
        }
        NetworkParameters::Solana(p) => {
            if p.lamports_per_signature == 0 {
                return Err(invalid("lamports per signature must be positive".into()));
            }
        }
        NetworkParameters::Substrate(p) => {
            if p.ss58_network_type > 0x3FFF {
                return Err(invalid(format!(
                    "ss58 network type {} out of range",
                    p.ss58_network_type
                )));
            }
            p.genesis_hash_bytes()?;
        }
    }
    Ok(())
}
