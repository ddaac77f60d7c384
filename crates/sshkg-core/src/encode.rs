//! Private-key containers and OpenSSH `authorized_keys` lines.
//!
//! - RSA private keys: PKCS#1 PEM (`RSA PRIVATE KEY`)
//! - ED25519 / ECDSA private keys: PKCS#8 PEM (`PRIVATE KEY`)
//! - Public keys: `<key-type> <base64(ssh wire format)> [comment]\n`

use crate::catalog::Algorithm;
use crate::error::{KeygenError, KeygenResult};
use crate::material::{EcdsaKey, KeyMaterial};
use pkcs8::{EncodePrivateKey, LineEnding};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use ssh_key::public::{EcdsaPublicKey, Ed25519PublicKey, KeyData, RsaPublicKey};
use ssh_key::{HashAlg, Mpint, PublicKey};
use zeroize::Zeroizing;

/// A rendered public key line plus the metadata shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedKeyLine {
    /// Full line including the trailing newline.
    pub line: String,
    /// Key type token (e.g. "ssh-ed25519", "ecdsa-sha2-nistp256").
    pub key_type: String,
    /// SHA-256 fingerprint (`SHA256:<base64>`).
    pub fingerprint: String,
}

/// Serialize key material into its private-key PEM container.
pub fn encode_private(material: &KeyMaterial, algorithm: Algorithm) -> KeygenResult<Zeroizing<String>> {
    ensure_matches(material, algorithm)?;

    let pem = match material {
        KeyMaterial::Rsa(key) => key.to_pkcs1_pem(LineEnding::LF)?,
        KeyMaterial::Ed25519(key) => key.to_pkcs8_pem(LineEnding::LF)?,
        KeyMaterial::Ecdsa(EcdsaKey::P256(key)) => key.to_pkcs8_pem(LineEnding::LF)?,
        KeyMaterial::Ecdsa(EcdsaKey::P384(key)) => key.to_pkcs8_pem(LineEnding::LF)?,
        KeyMaterial::Ecdsa(EcdsaKey::P521(key)) => key.to_pkcs8_pem(LineEnding::LF)?,
    };
    Ok(pem)
}

/// Public half of the key material in SSH key-data form.
pub fn public_key_data(material: &KeyMaterial) -> KeygenResult<KeyData> {
    match material {
        KeyMaterial::Rsa(key) => {
            let e = Mpint::from_positive_bytes(&key.e().to_bytes_be())?;
            let n = Mpint::from_positive_bytes(&key.n().to_bytes_be())?;
            Ok(KeyData::Rsa(RsaPublicKey { e, n }))
        }
        KeyMaterial::Ed25519(key) => Ok(KeyData::Ed25519(Ed25519PublicKey(
            key.verifying_key().to_bytes(),
        ))),
        KeyMaterial::Ecdsa(key) => Ok(KeyData::Ecdsa(EcdsaPublicKey::from_sec1_bytes(
            &key.public_sec1(),
        )?)),
    }
}

/// Render the public key as a single `authorized_keys` line.
///
/// An empty comment produces no comment segment at all.
pub fn encode_public(
    material: &KeyMaterial,
    algorithm: Algorithm,
    comment: &str,
) -> KeygenResult<AuthorizedKeyLine> {
    ensure_matches(material, algorithm)?;
    if comment.contains(['\n', '\r']) {
        return Err(KeygenError::Encoding(
            "key comment must be a single line".into(),
        ));
    }

    let public = PublicKey::new(public_key_data(material)?, "");
    let encoded = public.to_openssh()?;
    let body = encoded.trim_end();

    let line = if comment.is_empty() {
        format!("{body}\n")
    } else {
        format!("{body} {comment}\n")
    };

    Ok(AuthorizedKeyLine {
        line,
        key_type: public.algorithm().as_str().to_string(),
        fingerprint: public.fingerprint(HashAlg::Sha256).to_string(),
    })
}

/// Unreachable when generation honoured the algorithm tag; checked anyway.
fn ensure_matches(material: &KeyMaterial, algorithm: Algorithm) -> KeygenResult<()> {
    if material.algorithm() == algorithm {
        Ok(())
    } else {
        Err(KeygenError::Encoding(format!(
            "invalid {algorithm} private key: material is {}",
            material.algorithm()
        )))
    }
}
