//! PKCS#12 key store access
//!
//! Digital signing keys live in a PKCS#12 key store on disk. The store is
//! read per signing attempt so key rotation never requires a restart.

use firmado_core::KeyMaterial;
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use x509_certificate::{CapturedX509Certificate, InMemorySigningKeyPair};

use crate::error::{SigningError, SigningResult};

/// Private key and certificate chain loaded from a PKCS#12 key store.
///
/// The chain is ordered leaf first, as stored in the key store.
pub struct SigningKey {
    pub key_pair: InMemorySigningKeyPair,
    pub leaf_certificate: CapturedX509Certificate,
    pub chain: Vec<CapturedX509Certificate>,
}

/// Load the signing key named by `key_material`.
///
/// When no alias is configured, the first private key entry in the store is
/// used. Every failure along the way (unreadable file, wrong passphrase,
/// missing alias, unusable key encoding) reports as `KeyStoreAccessFailed`.
pub async fn load_signing_key(key_material: &KeyMaterial) -> SigningResult<SigningKey> {
    let data = tokio::fs::read(&key_material.store_path).await.map_err(|e| {
        SigningError::KeyStoreAccessFailed(format!(
            "Failed to read key store {}: {}",
            key_material.store_path.display(),
            e
        ))
    })?;

    let store = KeyStore::from_pkcs12(&data, &key_material.passphrase).map_err(|e| {
        SigningError::KeyStoreAccessFailed(format!(
            "Failed to open key store {}: {}",
            key_material.store_path.display(),
            e
        ))
    })?;

    let key_chain: &PrivateKeyChain = match &key_material.alias {
        Some(alias) => match store.entry(alias) {
            Some(KeyStoreEntry::PrivateKeyChain(key_chain)) => key_chain,
            Some(_) => {
                return Err(SigningError::KeyStoreAccessFailed(format!(
                    "Key store entry '{}' is not a private key",
                    alias
                )));
            }
            None => {
                return Err(SigningError::KeyStoreAccessFailed(format!(
                    "No entry named '{}' in key store",
                    alias
                )));
            }
        },
        None => store
            .entries()
            .find_map(|(_, entry)| match entry {
                KeyStoreEntry::PrivateKeyChain(key_chain) => Some(key_chain),
                _ => None,
            })
            .ok_or_else(|| {
                SigningError::KeyStoreAccessFailed(
                    "Key store contains no private key entries".to_string(),
                )
            })?,
    };

    let key_pair = InMemorySigningKeyPair::from_pkcs8_der(key_chain.key()).map_err(|e| {
        SigningError::KeyStoreAccessFailed(format!("Unsupported private key encoding: {}", e))
    })?;

    let mut chain = Vec::with_capacity(key_chain.chain().len());
    for certificate in key_chain.chain() {
        let captured =
            CapturedX509Certificate::from_der(certificate.as_der().to_vec()).map_err(|e| {
                SigningError::KeyStoreAccessFailed(format!(
                    "Invalid certificate in key store: {}",
                    e
                ))
            })?;
        chain.push(captured);
    }

    let leaf_certificate = chain.first().cloned().ok_or_else(|| {
        SigningError::KeyStoreAccessFailed("Key store entry has no certificates".to_string())
    })?;

    tracing::debug!(
        store = %key_material.store_path.display(),
        chain_len = chain.len(),
        "Signing key loaded"
    );

    Ok(SigningKey {
        key_pair,
        leaf_certificate,
        chain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_key_material(alias: Option<&str>, passphrase: &str) -> KeyMaterial {
        let store_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join("signing.p12");
        KeyMaterial {
            store_path,
            passphrase: passphrase.to_string(),
            alias: alias.map(|a| a.to_string()),
        }
    }

    #[tokio::test]
    async fn test_load_first_private_key_without_alias() {
        let key = load_signing_key(&test_key_material(None, "firmado-test"))
            .await
            .unwrap();
        assert!(!key.chain.is_empty());
    }

    #[tokio::test]
    async fn test_load_by_alias() {
        let key = load_signing_key(&test_key_material(Some("firmado"), "firmado-test"))
            .await
            .unwrap();
        assert!(!key.chain.is_empty());
    }

    #[tokio::test]
    async fn test_missing_alias_is_reported() {
        let result = load_signing_key(&test_key_material(Some("nope"), "firmado-test")).await;
        match result {
            Err(SigningError::KeyStoreAccessFailed(msg)) => {
                assert!(msg.contains("nope"), "unexpected message: {}", msg);
            }
            _ => panic!("expected KeyStoreAccessFailed"),
        }
    }

    #[tokio::test]
    async fn test_wrong_passphrase_is_reported() {
        let result = load_signing_key(&test_key_material(None, "wrong")).await;
        assert!(matches!(
            result,
            Err(SigningError::KeyStoreAccessFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_store_file_is_reported() {
        let key_material = KeyMaterial {
            store_path: PathBuf::from("/nonexistent/keystore.p12"),
            passphrase: "firmado-test".to_string(),
            alias: None,
        };
        let result = load_signing_key(&key_material).await;
        match result {
            Err(SigningError::KeyStoreAccessFailed(msg)) => {
                assert!(msg.contains("Failed to read"), "unexpected message: {}", msg);
            }
            _ => panic!("expected KeyStoreAccessFailed"),
        }
    }
}
