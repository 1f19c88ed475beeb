// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command bundle encryption (§4.3 step 2): AES-256-CBC, PKCS#7 padded, key
//! is the first 32 bytes of the execution's bearer token, random IV
//! prepended to the ciphertext.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::error::AgentError;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

fn derive_key(token: &str) -> Result<[u8; KEY_LEN], AgentError> {
    let bytes = token.as_bytes();
    if bytes.len() < KEY_LEN {
        return Err(AgentError::TokenTooShort(KEY_LEN));
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes[..KEY_LEN]);
    Ok(key)
}

/// Encrypt `plaintext` with `token[:32]` as key and a fresh random IV,
/// returning `iv || ciphertext`.
pub fn encrypt(token: &str, plaintext: &[u8]) -> Result<Vec<u8>, AgentError> {
    let key = derive_key(token)?;
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Encryptor::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`encrypt`], mainly exercised by tests to confirm the bundle
/// round-trips; the agent binary performs the real decryption remotely.
pub fn decrypt(token: &str, iv_and_ciphertext: &[u8]) -> Result<Vec<u8>, AgentError> {
    let key = derive_key(token)?;
    if iv_and_ciphertext.len() < IV_LEN {
        return Err(AgentError::Decrypt("ciphertext shorter than IV".to_string()));
    }
    let (iv, ciphertext) = iv_and_ciphertext.split_at(IV_LEN);
    let mut buf = ciphertext.to_vec();
    let plaintext = Decryptor::new(&key.into(), iv.into())
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| AgentError::Decrypt(e.to_string()))?;
    Ok(plaintext.to_vec())
}

#[cfg(test)]
#[path = "crypto_tests.rs"]
mod tests;
