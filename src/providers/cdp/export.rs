// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ephemeral RSA key exchange for account key export.
//!
//! The platform never returns private keys in the clear. The caller sends a
//! one-time RSA public key with the export request and receives the account
//! key encrypted to it with RSA-OAEP (SHA-256).

use base64ct::{Base64, Encoding};
use rsa::{pkcs8::EncodePublicKey, Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::CdpError;

const EXPORT_KEY_BITS: usize = 2048;

/// One-time key pair used for a single export call.
pub struct ExportKeyPair {
    private_key: RsaPrivateKey,
    public_key_b64: String,
}

impl ExportKeyPair {
    pub fn generate() -> Result<Self, CdpError> {
        let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, EXPORT_KEY_BITS)
            .map_err(|e| CdpError::Export(format!("failed to generate export key: {e}")))?;
        let public_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| CdpError::Export(format!("failed to encode export key: {e}")))?;

        Ok(Self {
            private_key,
            public_key_b64: Base64::encode_string(public_der.as_bytes()),
        })
    }

    /// Base64 SPKI DER public key sent as `exportEncryptionKey`.
    pub fn public_key_b64(&self) -> &str {
        &self.public_key_b64
    }

    /// Decrypt the base64 `encryptedPrivateKey` from an export response.
    pub fn decrypt(&self, encrypted_b64: &str) -> Result<Vec<u8>, CdpError> {
        let ciphertext = Base64::decode_vec(encrypted_b64.trim())
            .map_err(|e| CdpError::Export(format!("encrypted key is not base64: {e}")))?;
        self.private_key
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .map_err(|e| CdpError::Export(format!("failed to decrypt exported key: {e}")))
    }
}

/// Solana secret keys are exported as base58 of `seed || public key`.
pub fn solana_keypair_base58(seed: &[u8], address: &str) -> Result<String, CdpError> {
    let public_key = bs58::decode(address)
        .into_vec()
        .map_err(|e| CdpError::Export(format!("invalid Solana address: {e}")))?;

    // Some responses already carry the full 64-byte keypair.
    let keypair = match (seed.len(), public_key.len()) {
        (64, _) => seed.to_vec(),
        (32, 32) => [seed, public_key.as_slice()].concat(),
        (s, p) => {
            return Err(CdpError::Export(format!(
                "unexpected Solana key lengths: seed {s}, public key {p}"
            )))
        }
    };
    Ok(bs58::encode(keypair).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::DecodePublicKey;

    #[test]
    fn decrypts_keys_encrypted_to_the_public_half() {
        let pair = ExportKeyPair::generate().expect("key pair");
        let der = Base64::decode_vec(pair.public_key_b64()).expect("base64");
        let public = RsaPublicKey::from_public_key_der(&der).expect("spki");

        let secret = [7u8; 32];
        let ciphertext = public
            .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), &secret)
            .expect("encrypt");

        let plaintext = pair
            .decrypt(&Base64::encode_string(&ciphertext))
            .expect("decrypt");
        assert_eq!(plaintext, secret);
    }

    #[test]
    fn rejects_garbage_ciphertext() {
        let pair = ExportKeyPair::generate().expect("key pair");
        assert!(pair.decrypt("%%%").is_err());
        assert!(pair.decrypt(&Base64::encode_string(&[1, 2, 3])).is_err());
    }

    #[test]
    fn solana_keypair_appends_public_key() {
        let public = [9u8; 32];
        let address = bs58::encode(public).into_string();
        let encoded = solana_keypair_base58(&[1u8; 32], &address).expect("keypair");
        let decoded = bs58::decode(encoded).into_vec().unwrap();
        assert_eq!(decoded.len(), 64);
        assert_eq!(&decoded[32..], &public);
    }

    #[test]
    fn solana_keypair_rejects_short_seed() {
        let address = bs58::encode([9u8; 32]).into_string();
        assert!(solana_keypair_base58(&[1u8; 16], &address).is_err());
    }
}
