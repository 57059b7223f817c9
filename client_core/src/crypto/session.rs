//! https://specs.walletconnect.com/2.0/specs/clients/core/crypto/crypto-keys

use {
    hkdf::Hkdf,
    rand::{rngs::OsRng, CryptoRng, RngCore},
    sha2::{Digest, Sha256},
    std::fmt::{Debug, Formatter},
    x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret},
};

/// Session key and topic derivation errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to generate symmetric session key: {0}")]
    SymKeyGeneration(String),
}

#[derive(Clone)]
pub struct SessionKey {
    sym_key: [u8; 32],
    public_key: PublicKey,
}

impl Debug for SessionKey {
    /// Custom debug to hide the symmetrical key.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("sym_key", &"********")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl SessionKey {
    /// Creates new session key from `osrng`.
    ///
    /// Used by the side that already knows the peer's public key and only
    /// needs a one-shot keypair to complete the Diffie-Hellman exchange
    /// (the responder path, e.g. `pair`/`approve`).
    pub fn from_osrng(peer_public_key: &[u8; 32]) -> Result<Self, SessionError> {
        SessionKey::diffie_hellman(OsRng, peer_public_key)
    }

    /// Performs Diffie-Hellman symmetric key derivation using a fresh,
    /// single-use keypair.
    pub fn diffie_hellman<T>(csprng: T, peer_public_key: &[u8; 32]) -> Result<Self, SessionError>
    where
        T: RngCore + CryptoRng,
    {
        let single_use_private_key = EphemeralSecret::random_from_rng(csprng);
        let public_key = PublicKey::from(&single_use_private_key);

        let ikm = single_use_private_key.diffie_hellman(&PublicKey::from(*peer_public_key));

        derive(public_key, ikm.as_bytes())
    }

    /// Gets symmetic key reference.
    pub fn symmetric_key(&self) -> &[u8; 32] {
        &self.sym_key
    }

    /// Gets "our" public key used in symmetric key derivation.
    pub fn diffie_public_key(&self) -> &[u8; 32] {
        self.public_key.as_bytes()
    }

    /// Generates new session topic.
    pub fn generate_topic(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sym_key);
        hex::encode(hasher.finalize())
    }
}

fn derive(public_key: PublicKey, ikm: &[u8]) -> Result<SessionKey, SessionError> {
    let mut session_sym_key = SessionKey {
        sym_key: [0u8; 32],
        public_key,
    };
    let hk = Hkdf::<Sha256>::new(None, ikm);
    hk.expand(b"wc", &mut session_sym_key.sym_key)
        .map_err(|e| SessionError::SymKeyGeneration(e.to_string()))?;

    Ok(session_sym_key)
}

/// A persistent X25519 keypair held by the side that must publish its public
/// key *before* the peer's public key is known (the proposer path: the
/// keypair is generated at `pair`/`connect` time and only later combined with
/// the peer's public key once a response arrives).
///
/// `SessionKey::diffie_hellman` alone only covers the responder path, where
/// an `EphemeralSecret` can be thrown away immediately after deriving the
/// shared secret. The proposer can't do that: it must hold the private half
/// until the peer's public key shows up, so this wraps `StaticSecret`
/// instead.
pub struct Keypair {
    secret: StaticSecret,
    public_key: PublicKey,
}

impl Debug for Keypair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl Keypair {
    /// Generates a new keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public_key = PublicKey::from(&secret);
        Self { secret, public_key }
    }

    /// Our public key, to be sent to the peer ahead of key agreement.
    pub fn public_key(&self) -> &[u8; 32] {
        self.public_key.as_bytes()
    }

    /// Completes the Diffie-Hellman exchange once the peer's public key is
    /// known, deriving the shared [`SessionKey`].
    pub fn diffie_hellman(&self, peer_public_key: &[u8; 32]) -> Result<SessionKey, SessionError> {
        let ikm = self.secret.diffie_hellman(&PublicKey::from(*peer_public_key));
        derive(self.public_key, ikm.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposer_and_responder_agree() {
        let proposer = Keypair::generate();
        let responder = SessionKey::from_osrng(proposer.public_key()).unwrap();

        let proposer_key = proposer
            .diffie_hellman(responder.diffie_public_key())
            .unwrap();

        assert_eq!(proposer_key.symmetric_key(), responder.symmetric_key());
        assert_eq!(proposer_key.generate_topic(), responder.generate_topic());
    }
}
