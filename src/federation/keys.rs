//! Actor signing keys
//!
//! RSA keypairs used for ActivityPub HTTP Signatures. Only the public half
//! is ever rendered into a served document, as PEM SubjectPublicKeyInfo.

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD as BASE64};
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::metrics::KEYS_GENERATED_TOTAL;

/// Smallest RSA modulus accepted for actor keys
pub const MIN_KEY_BITS: usize = 2048;

/// Freshly generated actor keypair
///
/// Holds both halves PEM-encoded. The private half is only reachable through
/// [`KeyPair::into_private_key_pem`], for persisting at provisioning time.
pub struct KeyPair {
    public_key_pem: String,
    private_key_pem: String,
    fingerprint: String,
}

impl KeyPair {
    /// Public key, PEM `PUBLIC KEY` (SPKI)
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// `SHA256:<base64>` digest of the DER-encoded public key
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Consume the pair, handing out the PKCS#8 private key for storage.
    pub fn into_private_key_pem(self) -> String {
        self.private_key_pem
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Generate an RSA keypair
///
/// CPU-bound; call from provisioning, never per request. Async callers should
/// use [`generate_key_pair_async`].
///
/// # Errors
/// - `KeyGeneration` if `bits` is below [`MIN_KEY_BITS`] or the RNG fails
/// - `Encoding` if either half cannot be PEM-encoded
pub fn generate_key_pair(bits: usize) -> Result<KeyPair, AppError> {
    let result = generate(bits);
    let status = if result.is_ok() { "success" } else { "error" };
    KEYS_GENERATED_TOTAL.with_label_values(&[status]).inc();
    result
}

fn generate(bits: usize) -> Result<KeyPair, AppError> {
    if bits < MIN_KEY_BITS {
        return Err(AppError::KeyGeneration(format!(
            "{} bits is below the {} bit minimum",
            bits, MIN_KEY_BITS
        )));
    }

    let mut rng = rand::thread_rng();
    let private_key =
        RsaPrivateKey::new(&mut rng, bits).map_err(|e| AppError::KeyGeneration(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    let public_key_der = public_key
        .to_public_key_der()
        .map_err(|e| AppError::Encoding(e.to_string()))?;
    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| AppError::Encoding(e.to_string()))?;
    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::Encoding(e.to_string()))?
        .to_string();

    let fingerprint = format!(
        "SHA256:{}",
        BASE64.encode(Sha256::digest(public_key_der.as_bytes()))
    );

    Ok(KeyPair {
        public_key_pem,
        private_key_pem,
        fingerprint,
    })
}

/// Generate a keypair on the blocking pool.
pub async fn generate_key_pair_async(bits: usize) -> Result<KeyPair, AppError> {
    tokio::task::spawn_blocking(move || generate_key_pair(bits))
        .await
        .map_err(|e| AppError::KeyGeneration(format!("key generation task failed: {}", e)))?
}

/// Parse PEM SPKI public key material.
pub fn parse_public_key_pem(pem: &str) -> Result<RsaPublicKey, AppError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| AppError::Encoding(e.to_string()))
}
