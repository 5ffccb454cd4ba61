use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SolanaParams {
    pub cluster: &'static str,
    /// Base fee charged per required signature, in lamports.
    pub lamports_per_signature: u64,
    /// Minimum balance for a system account to stay rent exempt.
    pub rent_exempt_minimum: u64,
}

pub const MAINNET: SolanaParams = SolanaParams {
    cluster: "mainnet-beta",
    lamports_per_signature: 5_000,
    rent_exempt_minimum: 890_880,
};

pub const DEVNET: SolanaParams = SolanaParams {
    cluster: "devnet",
    lamports_per_signature: 5_000,
    rent_exempt_minimum: 890_880,
};
