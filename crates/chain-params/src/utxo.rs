//! Constants for the UTXO family (Bitcoin and its forks).

use serde::Serialize;

/// Parameters driving the generic UTXO engine for one network.
#[derive(Debug, Clone, Serialize)]
pub struct UtxoParams {
    pub name: &'static str,
    /// Base58check version byte for pay-to-pubkey-hash addresses.
    pub p2pkh_prefix: u8,
    /// Base58check version byte for pay-to-script-hash addresses.
    pub p2sh_prefix: u8,
    /// Bech32 human-readable part, `None` when the network has no SegWit.
    pub bech32_hrp: Option<&'static str>,
    /// BIP32 extended public / private key header words.
    pub xpub_header: u32,
    pub xprv_header: u32,
    pub magic: u32,
    pub default_port: u16,
    /// Outputs below this many base units are not relayed.
    pub dust_threshold: u64,
    /// Minimum relay fee, in base units per virtual byte.
    pub min_relay_fee_rate: u64,
    pub dns_seeds: &'static [&'static str],
}

impl UtxoParams {
    pub fn supports_segwit(&self) -> bool {
        self.bech32_hrp.is_some()
    }
}

/// Bitcoin mainnet.
pub const BITCOIN: UtxoParams = UtxoParams {
    name: "bitcoin",
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    bech32_hrp: Some("bc"),
    xpub_header: 0x0488_B21E,
    xprv_header: 0x0488_ADE4,
    magic: 0xD9B4_BEF9,
    default_port: 8333,
    dust_threshold: 546,
    min_relay_fee_rate: 1,
    dns_seeds: &[
        "seed.bitcoin.sipa.be",
        "dnsseed.bluematt.me",
        "dnsseed.bitcoin.dashjr.org",
        "seed.bitcoinstats.com",
        "seed.bitcoin.jonasschnelli.ch",
        "seed.btc.petertodd.org",
    ],
};

/// Bitcoin testnet3.
pub const BITCOIN_TESTNET: UtxoParams = UtxoParams {
    name: "bitcoin-testnet",
    p2pkh_prefix: 0x6F,
    p2sh_prefix: 0xC4,
    bech32_hrp: Some("tb"),
    xpub_header: 0x0435_87CF,
    xprv_header: 0x0435_8394,
    magic: 0x0709_110B,
    default_port: 18333,
    dust_threshold: 546,
    min_relay_fee_rate: 1,
    dns_seeds: &[
        "testnet-seed.bitcoin.jonasschnelli.ch",
        "seed.tbtc.petertodd.org",
        "testnet-seed.bluematt.me",
    ],
};

pub const LITECOIN: UtxoParams = UtxoParams {
    name: "litecoin",
    p2pkh_prefix: 0x30,
    p2sh_prefix: 0x32,
    bech32_hrp: Some("ltc"),
    xpub_header: 0x0488_B21E,
    xprv_header: 0x0488_ADE4,
    magic: 0xDBB6_C0FB,
    default_port: 9333,
    dust_threshold: 5460,
    min_relay_fee_rate: 1,
    dns_seeds: &[
        "seed-a.litecoin.loshan.co.uk",
        "dnsseed.thrasher.io",
        "dnsseed.litecointools.com",
        "dnsseed.litecoinpool.org",
    ],
};

/// Dogecoin has no SegWit: every address is P2PKH or P2SH.
pub const DOGECOIN: UtxoParams = UtxoParams {
    name: "dogecoin",
    p2pkh_prefix: 0x1E,
    p2sh_prefix: 0x16,
    bech32_hrp: None,
    xpub_header: 0x02FA_CAFD,
    xprv_header: 0x02FA_C398,
    magic: 0xC0C0_C0C0,
    default_port: 22556,
    dust_threshold: 1_000_000,
    min_relay_fee_rate: 1_000,
    dns_seeds: &["seed.multidoge.org", "seed2.multidoge.org"],
};
