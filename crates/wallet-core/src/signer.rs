//! The signing contract consumed by the wallet manager.
//!
//! Keys live outside this crate. A [`Signer`] receives the payloads a built
//! transaction needs signed and returns one raw signature per payload.

use async_trait::async_trait;
use chain_params::Curve;
use ed25519_dalek::Signer as _;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SignError;

/// What a payload is, so the signer knows whether to hash it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// A 32-byte digest, signed as is with secp256k1 ECDSA.
    Secp256k1Digest,
    /// A message signed with Ed25519.
    Ed25519Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub kind: PayloadKind,
    pub payloads: Vec<Vec<u8>>,
    /// Shown to the user by signers that ask for confirmation.
    pub description: String,
}

#[async_trait]
pub trait Signer: Send + Sync {
    /// One signature per payload, in order. ECDSA signatures are the
    /// 64-byte compact `r || s`.
    async fn sign(&self, request: SignRequest) -> Result<Vec<Vec<u8>>, SignError>;
}

/// Signs with a private key held in memory. Meant for tests and scripts.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct LocalKeySigner {
    secret: [u8; 32],
    #[zeroize(skip)]
    curve: Curve,
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

impl LocalKeySigner {
    pub fn new(secret: [u8; 32], curve: Curve) -> Result<Self, SignError> {
        if curve == Curve::Secp256k1 {
            k256::ecdsa::SigningKey::from_bytes(&secret.into())
                .map_err(|e| SignError::SignerUnavailable(format!("invalid secp256k1 key: {e}")))?;
        }
        Ok(Self { secret, curve })
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// SEC1 compressed key for secp256k1, 32 raw bytes for Ed25519.
    pub fn public_key(&self) -> Result<Vec<u8>, SignError> {
        match self.curve {
            Curve::Secp256k1 => {
                let key = self.secp256k1()?;
                Ok(key.verifying_key().to_encoded_point(true).as_bytes().to_vec())
            }
            Curve::Ed25519 => Ok(self.ed25519().verifying_key().to_bytes().to_vec()),
        }
    }

    fn secp256k1(&self) -> Result<k256::ecdsa::SigningKey, SignError> {
        k256::ecdsa::SigningKey::from_bytes(&self.secret.into())
            .map_err(|e| SignError::SignerUnavailable(format!("invalid secp256k1 key: {e}")))
    }

    fn ed25519(&self) -> ed25519_dalek::SigningKey {
        ed25519_dalek::SigningKey::from_bytes(&self.secret)
    }
}

#[async_trait]
impl Signer for LocalKeySigner {
    async fn sign(&self, request: SignRequest) -> Result<Vec<Vec<u8>>, SignError> {
        match (self.curve, request.kind) {
            (Curve::Secp256k1, PayloadKind::Secp256k1Digest) => {
                let key = self.secp256k1()?;
                request
                    .payloads
                    .iter()
                    .map(|digest| {
                        let sig: k256::ecdsa::Signature = key.sign_prehash(digest).map_err(|e| {
                            SignError::SignerUnavailable(format!("prehash signing failed: {e}"))
                        })?;
                        Ok(sig.to_bytes().to_vec())
                    })
                    .collect()
            }
            (Curve::Ed25519, PayloadKind::Ed25519Message) => {
                let key = self.ed25519();
                Ok(request
                    .payloads
                    .iter()
                    .map(|message| key.sign(message).to_bytes().to_vec())
                    .collect())
            }
            (curve, kind) => Err(SignError::SignerUnavailable(format!(
                "{curve:?} key cannot sign {kind:?} payloads"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;
    use k256::ecdsa::signature::hazmat::PrehashVerifier;

    fn request(kind: PayloadKind, payloads: Vec<Vec<u8>>) -> SignRequest {
        SignRequest {
            kind,
            payloads,
            description: "test".into(),
        }
    }

    #[tokio::test]
    async fn secp256k1_signs_each_digest() {
        let signer = LocalKeySigner::new([0x11; 32], Curve::Secp256k1).unwrap();
        let sigs = signer
            .sign(request(PayloadKind::Secp256k1Digest, vec![vec![1; 32], vec![2; 32]]))
            .await
            .unwrap();
        assert_eq!(sigs.len(), 2);

        let public = signer.public_key().unwrap();
        assert_eq!(public.len(), 33);
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&public).unwrap();
        let sig = k256::ecdsa::Signature::from_slice(&sigs[1]).unwrap();
        key.verify_prehash(&[2; 32], &sig).unwrap();
    }

    #[tokio::test]
    async fn ed25519_signs_messages() {
        let signer = LocalKeySigner::new([0x22; 32], Curve::Ed25519).unwrap();
        let sigs = signer
            .sign(request(PayloadKind::Ed25519Message, vec![b"hello".to_vec()]))
            .await
            .unwrap();
        let public: [u8; 32] = signer.public_key().unwrap().try_into().unwrap();
        let key = ed25519_dalek::VerifyingKey::from_bytes(&public).unwrap();
        let sig = ed25519_dalek::Signature::from_slice(&sigs[0]).unwrap();
        key.verify(b"hello", &sig).unwrap();
    }

    #[tokio::test]
    async fn curve_mismatch_is_unavailable() {
        let signer = LocalKeySigner::new([0x22; 32], Curve::Ed25519).unwrap();
        let err = signer
            .sign(request(PayloadKind::Secp256k1Digest, vec![vec![0; 32]]))
            .await
            .unwrap_err();
        assert!(matches!(err, SignError::SignerUnavailable(_)));
    }

    #[test]
    fn random_keys_produce_low_s_signatures() {
        use rand::RngCore;

        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let mut secret = [0u8; 32];
            rng.fill_bytes(&mut secret);
            let Ok(signer) = LocalKeySigner::new(secret, Curve::Secp256k1) else {
                continue;
            };
            let mut digest = vec![0u8; 32];
            rng.fill_bytes(&mut digest);

            let sigs = tokio_test::block_on(
                signer.sign(request(PayloadKind::Secp256k1Digest, vec![digest])),
            )
            .unwrap();
            let sig = k256::ecdsa::Signature::from_slice(&sigs[0]).unwrap();
            assert!(sig.normalize_s().is_none());
        }
    }

    #[test]
    fn rejects_invalid_secp256k1_secret() {
        assert!(LocalKeySigner::new([0u8; 32], Curve::Secp256k1).is_err());
    }

    #[test]
    fn debug_hides_the_secret() {
        let signer = LocalKeySigner::new([0x33; 32], Curve::Ed25519).unwrap();
        let debug = format!("{signer:?}");
        assert!(!debug.contains("51"));
        assert!(debug.contains("Ed25519"));
    }
}
