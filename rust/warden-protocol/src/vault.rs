//! Encrypted storage for wrapped keys held by the in-process network.

use crate::NetworkError;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use std::collections::HashMap;
use warden_credentials::{Address, Ed25519KeyPair};

const NONCE_SIZE: usize = 12;

#[derive(Debug)]
struct SealedKey {
    owner: Address,
    ciphertext: Vec<u8>,
}

/// Wrapped key seeds sealed with AES-256-GCM under a network-held key.
///
/// Each seed is sealed with the key's id and owner address as associated
/// data, so a ciphertext only opens for the key pair it was generated for.
#[derive(Debug, Default)]
pub(crate) struct WrappedKeyVault {
    key: Option<[u8; 32]>,
    entries: HashMap<String, SealedKey>,
}

fn random<const N: usize>() -> Result<[u8; N], NetworkError> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes)
        .map_err(|error| NetworkError::Refused(format!("RNG error: {error}")))?;
    Ok(bytes)
}

fn associated_data(id: &str, owner: &Address) -> Vec<u8> {
    let mut aad = id.as_bytes().to_vec();
    aad.extend_from_slice(owner.as_bytes());
    aad
}

impl WrappedKeyVault {
    fn cipher(&mut self) -> Result<Aes256Gcm, NetworkError> {
        let key = match self.key {
            Some(key) => key,
            None => {
                let key = random::<32>()?;
                self.key = Some(key);
                key
            }
        };
        Aes256Gcm::new_from_slice(&key)
            .map_err(|error| NetworkError::Refused(format!("vault key rejected: {error}")))
    }

    /// Seal `key` under `id` for `owner`.
    pub(crate) fn seal(
        &mut self,
        id: &str,
        owner: Address,
        key: &Ed25519KeyPair,
    ) -> Result<(), NetworkError> {
        let cipher = self.cipher()?;
        let nonce = random::<NONCE_SIZE>()?;
        let seed = key.seed();
        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &seed,
                    aad: &associated_data(id, &owner),
                },
            )
            .map_err(|_| NetworkError::Refused("wrapped key encryption failed".into()))?;

        let mut ciphertext = nonce.to_vec();
        ciphertext.extend_from_slice(&sealed);
        self.entries
            .insert(id.to_string(), SealedKey { owner, ciphertext });
        Ok(())
    }

    /// Open the key sealed under `id`, provided `owner` owns it.
    pub(crate) fn open(
        &mut self,
        id: &str,
        owner: &Address,
    ) -> Result<Ed25519KeyPair, NetworkError> {
        let cipher = self.cipher()?;
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| NetworkError::Refused("unknown wrapped key".into()))?;
        if entry.owner != *owner {
            return Err(NetworkError::Refused(
                "wrapped key belongs to another key pair".into(),
            ));
        }
        if entry.ciphertext.len() < NONCE_SIZE {
            return Err(NetworkError::Refused("wrapped key is corrupt".into()));
        }

        let (nonce, sealed) = entry.ciphertext.split_at(NONCE_SIZE);
        let seed = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: &associated_data(id, owner),
                },
            )
            .map_err(|_| NetworkError::Refused("wrapped key decryption failed".into()))?;
        let seed: [u8; 32] = seed
            .as_slice()
            .try_into()
            .map_err(|_| NetworkError::Refused("wrapped key is corrupt".into()))?;

        Ok(Ed25519KeyPair::from_seed(&seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_opens_a_sealed_key_for_its_owner() -> TestResult {
        let mut vault = WrappedKeyVault::default();
        let owner = Address::new([1; 20]);
        let key = Ed25519KeyPair::from_seed(&[7u8; 32]);

        vault.seal("wk-1", owner, &key)?;
        assert_eq!(vault.open("wk-1", &owner)?.public_key(), key.public_key());
        Ok(())
    }

    #[test]
    fn it_refuses_other_owners_and_unknown_ids() -> TestResult {
        let mut vault = WrappedKeyVault::default();
        let owner = Address::new([1; 20]);
        vault.seal("wk-1", owner, &Ed25519KeyPair::from_seed(&[7u8; 32]))?;

        assert!(vault.open("wk-1", &Address::new([2; 20])).is_err());
        assert!(vault.open("wk-2", &owner).is_err());
        Ok(())
    }

    #[test]
    fn it_does_not_store_the_seed_in_the_clear() -> TestResult {
        let mut vault = WrappedKeyVault::default();
        let key = Ed25519KeyPair::from_seed(&[7u8; 32]);
        vault.seal("wk-1", Address::new([1; 20]), &key)?;

        let ciphertext = &vault.entries["wk-1"].ciphertext;
        assert!(!ciphertext.windows(32).any(|window| window == key.seed()));
        Ok(())
    }
}
