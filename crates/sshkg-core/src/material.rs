//! Generated key material as a closed sum over the supported algorithms.

use crate::catalog::Algorithm;
use crate::error::{KeygenError, KeygenResult};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::fmt;

/// NIST curve backing an ECDSA key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcdsaCurve {
    P256,
    P384,
    P521,
}

impl EcdsaCurve {
    /// Map a key size in bits to its curve. Sizes are never coerced.
    pub fn from_bits(bits: u32) -> KeygenResult<Self> {
        match bits {
            256 => Ok(EcdsaCurve::P256),
            384 => Ok(EcdsaCurve::P384),
            521 => Ok(EcdsaCurve::P521),
            other => Err(KeygenError::Validation(format!(
                "unsupported ECDSA key size: {other} (supported: 256, 384, 521)"
            ))),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            EcdsaCurve::P256 => 256,
            EcdsaCurve::P384 => 384,
            EcdsaCurve::P521 => 521,
        }
    }
}

impl fmt::Display for EcdsaCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.bits())
    }
}

/// An ECDSA secret key on one of the supported curves.
#[derive(Clone)]
pub enum EcdsaKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl EcdsaKey {
    fn generate(curve: EcdsaCurve) -> Self {
        match curve {
            EcdsaCurve::P256 => EcdsaKey::P256(p256::SecretKey::random(&mut OsRng)),
            EcdsaCurve::P384 => EcdsaKey::P384(p384::SecretKey::random(&mut OsRng)),
            EcdsaCurve::P521 => EcdsaKey::P521(p521::SecretKey::random(&mut OsRng)),
        }
    }

    pub fn curve(&self) -> EcdsaCurve {
        match self {
            EcdsaKey::P256(_) => EcdsaCurve::P256,
            EcdsaKey::P384(_) => EcdsaCurve::P384,
            EcdsaKey::P521(_) => EcdsaCurve::P521,
        }
    }

    /// Uncompressed SEC1 encoding of the public point.
    pub fn public_sec1(&self) -> Vec<u8> {
        use p256::elliptic_curve::sec1::ToEncodedPoint;

        match self {
            EcdsaKey::P256(sk) => sk.public_key().to_encoded_point(false).as_bytes().to_vec(),
            EcdsaKey::P384(sk) => sk.public_key().to_encoded_point(false).as_bytes().to_vec(),
            EcdsaKey::P521(sk) => sk.public_key().to_encoded_point(false).as_bytes().to_vec(),
        }
    }
}

/// Private key material produced by the generation stage.
#[derive(Clone)]
pub enum KeyMaterial {
    Rsa(Box<RsaPrivateKey>),
    Ed25519(SigningKey),
    Ecdsa(EcdsaKey),
}

impl KeyMaterial {
    /// Generate fresh key material from the operating system CSPRNG.
    ///
    /// `bits` is the RSA modulus length or the ECDSA curve size; it is
    /// ignored for ED25519.
    pub fn generate(algorithm: Algorithm, bits: u32) -> KeygenResult<Self> {
        // Surface an unavailable entropy source as an error rather than a panic
        // deep inside the key generator.
        let mut probe = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|e| KeygenError::Generation(format!("randomness source unavailable: {e}")))?;

        match algorithm {
            Algorithm::Rsa => {
                let key = RsaPrivateKey::new(&mut OsRng, bits as usize)
                    .map_err(|e| KeygenError::Generation(e.to_string()))?;
                Ok(KeyMaterial::Rsa(Box::new(key)))
            }
            Algorithm::Ed25519 => Ok(KeyMaterial::Ed25519(SigningKey::generate(&mut OsRng))),
            Algorithm::Ecdsa => {
                let curve = EcdsaCurve::from_bits(bits)?;
                Ok(KeyMaterial::Ecdsa(EcdsaKey::generate(curve)))
            }
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            KeyMaterial::Rsa(_) => Algorithm::Rsa,
            KeyMaterial::Ed25519(_) => Algorithm::Ed25519,
            KeyMaterial::Ecdsa(_) => Algorithm::Ecdsa,
        }
    }

    /// Effective key size in bits.
    pub fn bits(&self) -> u32 {
        match self {
            KeyMaterial::Rsa(key) => (key.size() * 8) as u32,
            KeyMaterial::Ed25519(_) => 256,
            KeyMaterial::Ecdsa(key) => key.curve().bits(),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm())
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_from_bits() {
        assert_eq!(EcdsaCurve::from_bits(256).unwrap(), EcdsaCurve::P256);
        assert_eq!(EcdsaCurve::from_bits(384).unwrap(), EcdsaCurve::P384);
        assert_eq!(EcdsaCurve::from_bits(521).unwrap(), EcdsaCurve::P521);
        assert!(matches!(
            EcdsaCurve::from_bits(512),
            Err(KeygenError::Validation(_))
        ));
        assert_eq!(EcdsaCurve::P521.to_string(), "P-521");
    }

    #[test]
    fn ed25519_ignores_requested_size() {
        let key = KeyMaterial::generate(Algorithm::Ed25519, 4096).unwrap();
        assert_eq!(key.algorithm(), Algorithm::Ed25519);
        assert_eq!(key.bits(), 256);
    }

    #[test]
    fn ecdsa_generates_each_curve() {
        for (bits, point_len) in [(256, 65), (384, 97), (521, 133)] {
            let key = KeyMaterial::generate(Algorithm::Ecdsa, bits).unwrap();
            assert_eq!(key.bits(), bits);
            match &key {
                KeyMaterial::Ecdsa(ec) => assert_eq!(ec.public_sec1().len(), point_len),
                other => panic!("unexpected material {other:?}"),
            }
        }
    }

    #[test]
    fn ecdsa_rejects_512_before_generating() {
        let err = KeyMaterial::generate(Algorithm::Ecdsa, 512).unwrap_err();
        assert!(matches!(err, KeygenError::Validation(_)));
    }

    #[test]
    fn rsa_key_has_requested_modulus() {
        let key = KeyMaterial::generate(Algorithm::Rsa, 2048).unwrap();
        assert_eq!(key.bits(), 2048);
        assert!(format!("{key:?}").contains("Rsa"));
    }
}
