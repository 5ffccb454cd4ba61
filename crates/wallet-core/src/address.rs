//! Address derivation and validation for every chain family.

use chain_params::{AddressType, NetworkParameters};

use crate::error::AddressError;
use crate::types::{Address, PublicKey};

/// Human-readable network name used in address labels.
pub fn network_label(params: &NetworkParameters) -> &'static str {
    match params {
        NetworkParameters::Utxo(p) => p.name,
        NetworkParameters::Evm(p) => p.name,
        NetworkParameters::Cosmos(p) => p.chain_id,
        NetworkParameters::Solana(p) => p.cluster,
        NetworkParameters::Substrate(p) => p.name,
    }
}

/// Address types a network can derive, in sort order.
pub fn supported_types(params: &NetworkParameters) -> &'static [AddressType] {
    match params {
        NetworkParameters::Utxo(_) => &[AddressType::Default, AddressType::Legacy],
        _ => &[AddressType::Default],
    }
}

fn label(params: &NetworkParameters, address_type: AddressType) -> String {
    match address_type {
        AddressType::Default => network_label(params).to_string(),
        AddressType::Legacy => format!("{} legacy", network_label(params)),
    }
}

fn unsupported(params: &NetworkParameters, address_type: AddressType) -> AddressError {
    AddressError::MalformedInput(format!(
        "{} has no {address_type:?} addresses",
        network_label(params)
    ))
}

/// Derives the address of `key` on the network described by `params`.
pub fn derive(
    key: &PublicKey,
    params: &NetworkParameters,
    address_type: AddressType,
) -> Result<Address, AddressError> {
    if !supported_types(params).contains(&address_type) {
        return Err(unsupported(params, address_type));
    }
    let account_key = key.account_key()?;
    let value = match params {
        NetworkParameters::Utxo(p) => match address_type {
            AddressType::Default => chain_btc::address::default_address(&account_key, p)?,
            AddressType::Legacy => chain_btc::address::legacy_address(&account_key, p)?,
        },
        NetworkParameters::Evm(_) => chain_eth::address::address_from_pubkey(&account_key)?,
        NetworkParameters::Cosmos(p) => {
            chain_cosmos::address::address_from_pubkey(&account_key, p.bech32_hrp)?
        }
        NetworkParameters::Solana(_) => chain_sol::address_from_pubkey(&account_key)?,
        NetworkParameters::Substrate(p) => chain_dot::address::address_from_pubkey(&account_key, p)?,
    };

    Ok(Address {
        value,
        address_type,
        public_key: key.clone(),
        label: label(params, address_type),
    })
}

/// One address per supported type, sorted by type.
pub fn derive_all(key: &PublicKey, params: &NetworkParameters) -> Result<Vec<Address>, AddressError> {
    let mut addresses = supported_types(params)
        .iter()
        .map(|&address_type| derive(key, params, address_type))
        .collect::<Result<Vec<_>, _>>()?;
    addresses.sort();
    Ok(addresses)
}

/// 1-of-2 multisig address of `key` and `paired` on a UTXO network:
/// P2WSH for `Default`, P2SH for `Legacy`.
pub fn derive_multisig(
    key: &PublicKey,
    paired: &PublicKey,
    params: &NetworkParameters,
    address_type: AddressType,
) -> Result<Address, AddressError> {
    let NetworkParameters::Utxo(utxo) = params else {
        return Err(AddressError::MalformedInput(format!(
            "{} has no multisig addresses",
            network_label(params)
        )));
    };
    let pair = chain_btc::address::multisig_addresses(
        &key.account_key()?,
        &paired.account_key()?,
        utxo,
    )?;
    let value = match address_type {
        AddressType::Legacy => pair.p2sh,
        AddressType::Default => pair.p2wsh.ok_or_else(|| unsupported(params, address_type))?,
    };
    Ok(Address {
        value,
        address_type,
        public_key: key.clone(),
        label: format!("{} multisig", label(params, address_type)),
    })
}

/// Parses `address` for the network and says why it does not belong there.
pub fn check(address: &str, params: &NetworkParameters) -> Result<(), AddressError> {
    if address.trim().is_empty() {
        return Err(AddressError::MalformedInput("empty address".into()));
    }
    match params {
        NetworkParameters::Utxo(p) => {
            chain_btc::address::decode_address(address, p)?;
        }
        NetworkParameters::Evm(_) => {
            chain_eth::address::parse_address(address)?;
        }
        NetworkParameters::Cosmos(p) => {
            chain_cosmos::address::decode_address(address, p.bech32_hrp)?;
        }
        NetworkParameters::Solana(_) => {
            chain_sol::address_to_bytes(address)?;
        }
        NetworkParameters::Substrate(p) => {
            chain_dot::address::decode_address(address, p)?;
        }
    }
    Ok(())
}

pub fn validate(address: &str, params: &NetworkParameters) -> bool {
    check(address, params).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_params::{parameters, Chain};

    /// The secp256k1 generator point, compressed.
    const G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const ALICE: &str = "8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";

    fn key(hex_key: &str) -> PublicKey {
        PublicKey::new(hex::decode(hex_key).unwrap())
    }

    #[test]
    fn bitcoin_default_and_legacy() {
        let params = parameters(Chain::Bitcoin);
        let all = derive_all(&key(G), params).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].address_type, AddressType::Default);
        assert_eq!(all[0].value, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(all[1].value, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(all[0].label, "bitcoin");
        assert_eq!(all[1].label, "bitcoin legacy");
        for address in &all {
            assert!(validate(&address.value, params));
        }
    }

    #[test]
    fn dogecoin_default_falls_back_to_p2pkh() {
        let params = parameters(Chain::Dogecoin);
        let default = derive(&key(G), params, AddressType::Default).unwrap();
        let legacy = derive(&key(G), params, AddressType::Legacy).unwrap();
        assert_eq!(default.value, legacy.value);
        assert!(default.value.starts_with('D'));
    }

    #[test]
    fn evm_address_is_checksummed() {
        let params = parameters(Chain::Ethereum);
        let address = derive(&key(G), params, AddressType::Default).unwrap();
        assert_eq!(address.value, "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
        assert!(validate(&address.value, parameters(Chain::Polygon)));
        assert!(matches!(
            derive(&key(G), params, AddressType::Legacy),
            Err(AddressError::MalformedInput(_))
        ));
    }

    #[test]
    fn cosmos_solana_and_substrate() {
        let gaia = "0257286ec3f37d33557bbbaa000b27744ac9023aa9967cae75a181d1ff91fa9dc5";
        let cosmos = derive(&key(gaia), parameters(Chain::CosmosHub), AddressType::Default).unwrap();
        assert_eq!(cosmos.value, "cosmos1hsk6jryyqjfhp5dhc55tc9jtckygx0eph6dd02");

        let sol = derive(&key(ALICE), parameters(Chain::Solana), AddressType::Default).unwrap();
        assert!(validate(&sol.value, parameters(Chain::SolanaDevnet)));

        let dot = derive(&key(ALICE), parameters(Chain::Polkadot), AddressType::Default).unwrap();
        assert_eq!(dot.value, "14E5nqKAp3oAJcmzgZhUD2RcptBeUBScxKHgJKU4HPNcKVf3");
    }

    #[test]
    fn round_trip_every_chain() {
        for chain in Chain::ALL {
            let params = parameters(chain);
            let pubkey = match chain.curve() {
                chain_params::Curve::Secp256k1 => key(G),
                chain_params::Curve::Ed25519 => key(ALICE),
            };
            for address in derive_all(&pubkey, params).unwrap() {
                assert!(validate(&address.value, params), "{chain:?} {}", address.value);
            }
        }
    }

    #[test]
    fn check_reports_the_reason() {
        let bitcoin = parameters(Chain::Bitcoin);
        assert!(matches!(
            check("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx", bitcoin),
            Err(AddressError::WrongNetworkType(_))
        ));
        assert!(matches!(
            check("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMJ", bitcoin),
            Err(AddressError::InvalidChecksum(_))
        ));
        assert!(matches!(check("", bitcoin), Err(AddressError::MalformedInput(_))));

        let ethereum = parameters(Chain::Ethereum);
        assert!(matches!(
            check("0x7E5F4552091A69125d5DfCb7b8C2659029395BDF", ethereum),
            Err(AddressError::InvalidChecksum(_))
        ));

        let westend = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
        assert!(matches!(
            check(westend, parameters(Chain::Polkadot)),
            Err(AddressError::WrongNetworkType(_))
        ));
        assert!(matches!(
            check("cosmos1hsk6jryyqjfhp5dhc55tc9jtckygx0eph6dd02", parameters(Chain::TerraClassic)),
            Err(AddressError::WrongNetworkType(_))
        ));
    }

    #[test]
    fn multisig_addresses_on_utxo_only() {
        let first = key(G);
        let second = key("02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5");
        let bitcoin = parameters(Chain::Bitcoin);

        let p2sh = derive_multisig(&first, &second, bitcoin, AddressType::Legacy).unwrap();
        assert!(p2sh.value.starts_with('3'));
        let p2wsh = derive_multisig(&first, &second, bitcoin, AddressType::Default).unwrap();
        assert!(p2wsh.value.starts_with("bc1q"));
        assert_eq!(p2wsh.value.len(), 62);

        let swapped = derive_multisig(&second, &first, bitcoin, AddressType::Default).unwrap();
        assert_eq!(swapped.value, p2wsh.value);

        assert!(derive_multisig(&first, &second, parameters(Chain::Dogecoin), AddressType::Default).is_err());
        assert!(derive_multisig(&first, &second, parameters(Chain::Ethereum), AddressType::Legacy).is_err());
    }
}
