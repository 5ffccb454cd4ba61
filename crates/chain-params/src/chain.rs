use serde::{Deserialize, Serialize};

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    // UTXO
    Bitcoin,
    BitcoinTestnet,
    Litecoin,
    Dogecoin,
    // EVM
    Ethereum,
    Polygon,
    Arbitrum,
    Base,
    Optimism,
    Bsc,
    Avalanche,
    Sepolia,
    PolygonAmoy,
    // Cosmos SDK
    CosmosHub,
    GaiaTestnet,
    TerraClassic,
    // Solana
    Solana,
    SolanaDevnet,
    // Substrate
    Polkadot,
    Kusama,
    Westend,
}

impl Chain {
    pub const ALL: [Chain; 21] = [
        Chain::Bitcoin,
        Chain::BitcoinTestnet,
        Chain::Litecoin,
        Chain::Dogecoin,
        Chain::Ethereum,
        Chain::Polygon,
        Chain::Arbitrum,
        Chain::Base,
        Chain::Optimism,
        Chain::Bsc,
        Chain::Avalanche,
        Chain::Sepolia,
        Chain::PolygonAmoy,
        Chain::CosmosHub,
        Chain::GaiaTestnet,
        Chain::TerraClassic,
        Chain::Solana,
        Chain::SolanaDevnet,
        Chain::Polkadot,
        Chain::Kusama,
        Chain::Westend,
    ];

    /// Which wire/account model the chain uses.
    pub fn family(&self) -> ChainFamily {
        match self {
            Chain::Bitcoin | Chain::BitcoinTestnet | Chain::Litecoin | Chain::Dogecoin => {
                ChainFamily::Utxo
            }
            Chain::Ethereum
            | Chain::Polygon
            | Chain::Arbitrum
            | Chain::Base
            | Chain::Optimism
            | Chain::Bsc
            | Chain::Avalanche
            | Chain::Sepolia
            | Chain::PolygonAmoy => ChainFamily::Evm,
            Chain::CosmosHub | Chain::GaiaTestnet | Chain::TerraClassic => ChainFamily::Cosmos,
            Chain::Solana | Chain::SolanaDevnet => ChainFamily::Solana,
            Chain::Polkadot | Chain::Kusama | Chain::Westend => ChainFamily::Substrate,
        }
    }

    /// BIP-44 coin type for this chain
    pub fn coin_type(&self) -> u32 {
        match self {
            Chain::Bitcoin => 0,
            Chain::BitcoinTestnet => 1,
            Chain::Litecoin => 2,
            Chain::Dogecoin => 3,
            Chain::CosmosHub | Chain::GaiaTestnet => 118,
            Chain::TerraClassic => 330,
            Chain::Solana | Chain::SolanaDevnet => 501,
            Chain::Polkadot => 354,
            Chain::Kusama => 434,
            Chain::Westend => 1,
            _ => 60,
        }
    }

    /// Whether this chain uses secp256k1 (UTXO/EVM/Cosmos) or Ed25519 (Solana/Substrate)
    pub fn curve(&self) -> Curve {
        match self.family() {
            ChainFamily::Solana | ChainFamily::Substrate => Curve::Ed25519,
            _ => Curve::Secp256k1,
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Chain::Bitcoin => "Bitcoin",
            Chain::BitcoinTestnet => "Bitcoin Testnet",
            Chain::Litecoin => "Litecoin",
            Chain::Dogecoin => "Dogecoin",
            Chain::Ethereum => "Ethereum",
            Chain::Polygon => "Polygon",
            Chain::Arbitrum => "Arbitrum One",
            Chain::Base => "Base",
            Chain::Optimism => "Optimism",
            Chain::Bsc => "BNB Smart Chain",
            Chain::Avalanche => "Avalanche C-Chain",
            Chain::Sepolia => "Sepolia Testnet",
            Chain::PolygonAmoy => "Polygon Amoy Testnet",
            Chain::CosmosHub => "Cosmos Hub",
            Chain::GaiaTestnet => "Gaia Testnet",
            Chain::TerraClassic => "Terra Classic",
            Chain::Solana => "Solana",
            Chain::SolanaDevnet => "Solana Devnet",
            Chain::Polkadot => "Polkadot",
            Chain::Kusama => "Kusama",
            Chain::Westend => "Westend",
        }
    }

    /// Native token symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Bitcoin | Chain::BitcoinTestnet => "BTC",
            Chain::Litecoin => "LTC",
            Chain::Dogecoin => "DOGE",
            Chain::Ethereum | Chain::Sepolia | Chain::Arbitrum | Chain::Base | Chain::Optimism => {
                "ETH"
            }
            Chain::Polygon | Chain::PolygonAmoy => "MATIC",
            Chain::Bsc => "BNB",
            Chain::Avalanche => "AVAX",
            Chain::CosmosHub => "ATOM",
            Chain::GaiaTestnet => "MUON",
            Chain::TerraClassic => "LUNC",
            Chain::Solana | Chain::SolanaDevnet => "SOL",
            Chain::Polkadot => "DOT",
            Chain::Kusama => "KSM",
            Chain::Westend => "WND",
        }
    }

    /// Number of decimal places between the display unit and the smallest unit.
    pub fn decimals(&self) -> u8 {
        match self.family() {
            ChainFamily::Utxo => 8,
            ChainFamily::Evm => 18,
            ChainFamily::Cosmos => 6,
            ChainFamily::Solana => 9,
            ChainFamily::Substrate => match self {
                Chain::Polkadot => 10,
                _ => 12,
            },
        }
    }

    /// Whether this is a testnet
    pub fn is_testnet(&self) -> bool {
        matches!(
            self,
            Chain::BitcoinTestnet
                | Chain::Sepolia
                | Chain::PolygonAmoy
                | Chain::GaiaTestnet
                | Chain::SolanaDevnet
                | Chain::Westend
        )
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    Utxo,
    Evm,
    Cosmos,
    Solana,
    Substrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    Secp256k1,
    Ed25519,
}

/// Address format variant. `Default` sorts before `Legacy`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    Default,
    Legacy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_chain_has_a_family_and_symbol() {
        for chain in Chain::ALL {
            assert!(!chain.symbol().is_empty());
            assert!(!chain.display_name().is_empty());
            let _ = chain.family();
        }
    }

    #[test]
    fn curves_follow_family() {
        assert_eq!(Chain::Bitcoin.curve(), Curve::Secp256k1);
        assert_eq!(Chain::CosmosHub.curve(), Curve::Secp256k1);
        assert_eq!(Chain::Solana.curve(), Curve::Ed25519);
        assert_eq!(Chain::Polkadot.curve(), Curve::Ed25519);
    }

    #[test]
    fn coin_types() {
        assert_eq!(Chain::Bitcoin.coin_type(), 0);
        assert_eq!(Chain::Polygon.coin_type(), 60);
        assert_eq!(Chain::CosmosHub.coin_type(), 118);
        assert_eq!(Chain::Solana.coin_type(), 501);
    }

    #[test]
    fn decimals_per_family() {
        assert_eq!(Chain::Dogecoin.decimals(), 8);
        assert_eq!(Chain::Base.decimals(), 18);
        assert_eq!(Chain::GaiaTestnet.decimals(), 6);
        assert_eq!(Chain::Polkadot.decimals(), 10);
        assert_eq!(Chain::Westend.decimals(), 12);
    }

    #[test]
    fn testnets() {
        let testnets: Vec<_> = Chain::ALL.iter().filter(|c| c.is_testnet()).collect();
        assert_eq!(testnets.len(), 6);
        assert!(!Chain::Ethereum.is_testnet());
    }

    #[test]
    fn address_type_ordering() {
        assert!(AddressType::Default < AddressType::Legacy);
        let mut types = vec![AddressType::Legacy, AddressType::Default];
        types.sort();
        assert_eq!(types, vec![AddressType::Default, AddressType::Legacy]);
    }

    #[test]
    fn chain_serializes_as_snake_case() {
        let json = serde_json::to_string(&Chain::BitcoinTestnet).unwrap();
        assert_eq!(json, "\"bitcoin_testnet\"");
        let chain: Chain = serde_json::from_str("\"polygon_amoy\"").unwrap();
        assert_eq!(chain, Chain::PolygonAmoy);
    }
}
