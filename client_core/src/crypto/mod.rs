//! Crypto Controller: key storage plus envelope encrypt/decrypt, backed by a
//! persisted keychain rather than keys held only in locals for the lifetime
//! of a single run.

pub mod payload;
pub mod session;

use {
    crate::storage::{KeyValueStorage, StorageError},
    payload::{decode_and_decrypt_type0, encrypt_and_encode, PayloadError, SymKey},
    serde::{Deserialize, Serialize},
    session::{Keypair, SessionError, SessionKey},
    std::{collections::HashMap, sync::RwLock},
};

const KEYCHAIN_PREFIX: &str = "wc@2:client//keychain:";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no key found for topic")]
    KeyNotFound,
}

#[derive(Serialize, Deserialize)]
struct StoredSymKey(#[serde(with = "hex_bytes")] [u8; 32]);

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// Self-held X25519 keypairs awaiting a peer's public key, keyed by our own
/// public key (hex). Kept in memory only: once the peer responds the
/// resulting symmetric key is persisted in the keychain and the keypair
/// itself is discarded.
#[derive(Default)]
struct PendingKeypairs(RwLock<HashMap<String, Keypair>>);

/// Crypto Controller: owns the keychain (`Topic -> SymKey`) and the
/// encrypt/decrypt envelope operations spec.md §4.1 describes.
pub struct Crypto<S> {
    storage: S,
    pending: PendingKeypairs,
}

impl<S: KeyValueStorage> Crypto<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            pending: PendingKeypairs::default(),
        }
    }

    fn keychain_key(topic: &str) -> String {
        format!("{KEYCHAIN_PREFIX}{topic}")
    }

    /// Persists a symmetric key for `topic`.
    pub fn set_sym_key(&self, topic: &str, key: &SymKey) -> Result<(), CryptoError> {
        self.storage
            .set(&Self::keychain_key(topic), &StoredSymKey(*key))?;
        Ok(())
    }

    /// Loads the symmetric key for `topic`, if any.
    pub fn sym_key(&self, topic: &str) -> Result<SymKey, CryptoError> {
        self.storage
            .get::<StoredSymKey>(&Self::keychain_key(topic))?
            .map(|k| k.0)
            .ok_or(CryptoError::KeyNotFound)
    }

    /// Deletes the symmetric key for `topic` (`deleteKeys` in the crypto
    /// controller contract).
    pub fn delete_sym_key(&self, topic: &str) -> Result<(), CryptoError> {
        self.storage.delete(&Self::keychain_key(topic))?;
        Ok(())
    }

    /// Whether a symmetric key is held for `topic` (`hasKeys`).
    pub fn has_keys(&self, topic: &str) -> Result<bool, CryptoError> {
        Ok(self
            .storage
            .get::<StoredSymKey>(&Self::keychain_key(topic))?
            .is_some())
    }

    /// Generates a fresh keypair for the proposer side of a key exchange and
    /// returns its public key (to embed in a pairing URI or proposal).
    /// The keypair is held in memory until [`Self::complete_key_exchange`]
    /// is called with the peer's public key.
    pub fn generate_key_pair(&self) -> Result<[u8; 32], CryptoError> {
        let keypair = Keypair::generate();
        let public_key = *keypair.public_key();

        let mut pending = self
            .pending
            .0
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?;
        pending.insert(hex::encode(public_key), keypair);

        Ok(public_key)
    }

    /// Completes a key exchange previously started with
    /// [`Self::generate_key_pair`]: combines our held keypair (identified by
    /// `our_public_key`) with the peer's public key, derives the settled
    /// topic the same way [`Self::respond_key_exchange`] does on the other
    /// side, persists the resulting symmetric key under it, discards the
    /// keypair, and returns the derived topic.
    pub fn complete_key_exchange(
        &self,
        our_public_key: &[u8; 32],
        peer_public_key: &[u8; 32],
    ) -> Result<String, CryptoError> {
        let keypair = {
            let mut pending = self
                .pending
                .0
                .write()
                .map_err(|_| StorageError::Backend("lock poisoned".into()))?;
            pending
                .remove(&hex::encode(our_public_key))
                .ok_or(CryptoError::KeyNotFound)?
        };

        let session_key = keypair.diffie_hellman(peer_public_key)?;
        let topic = session_key.generate_topic();
        self.set_sym_key(&topic, session_key.symmetric_key())?;
        Ok(topic)
    }

    /// Responder-side key agreement: generates a one-shot keypair, derives
    /// the shared key against `peer_public_key`, persists it under the
    /// derived topic, and returns `(topic, our_public_key)`.
    pub fn respond_key_exchange(
        &self,
        peer_public_key: &[u8; 32],
    ) -> Result<(String, [u8; 32]), CryptoError> {
        let session_key = SessionKey::from_osrng(peer_public_key)?;
        let topic = session_key.generate_topic();
        self.set_sym_key(&topic, session_key.symmetric_key())?;
        Ok((topic, *session_key.diffie_public_key()))
    }

    /// Encrypts `plaintext` for `topic` using the persisted symmetric key.
    pub fn encrypt(&self, topic: &str, plaintext: &str) -> Result<String, CryptoError> {
        let key = self.sym_key(topic)?;
        Ok(encrypt_and_encode(plaintext, &key)?)
    }

    /// Decrypts a hex-encoded envelope received on `topic`.
    pub fn decrypt(&self, topic: &str, envelope: &str) -> Result<String, CryptoError> {
        let key = self.sym_key(topic)?;
        Ok(decode_and_decrypt_type0(envelope, &key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn proposer_and_responder_derive_same_key_and_exchange_messages() {
        let proposer = Crypto::new(MemoryStorage::new());
        let responder = Crypto::new(MemoryStorage::new());

        let our_public_key = proposer.generate_key_pair().unwrap();
        let (topic, their_public_key) = responder.respond_key_exchange(&our_public_key).unwrap();

        let proposer_topic = proposer
            .complete_key_exchange(&our_public_key, &their_public_key)
            .unwrap();
        assert_eq!(proposer_topic, topic);

        let ciphertext = proposer.encrypt(&topic, "hello").unwrap();
        let plaintext = responder.decrypt(&topic, &ciphertext).unwrap();
        assert_eq!(plaintext, "hello");
    }

    #[test]
    fn missing_key_is_an_error() {
        let crypto = Crypto::new(MemoryStorage::new());
        assert!(matches!(
            crypto.encrypt("unknown-topic", "hi"),
            Err(CryptoError::KeyNotFound)
        ));
    }
}
