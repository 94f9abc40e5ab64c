//! Symmetric transform applied to every outbound record.
//!
//! AES-128 in CBC mode with PKCS#7 padding, keyed by a pre-shared key and IV
//! that never change for the lifetime of the process. Equal plaintexts always
//! map to equal ciphertexts; the remote protocol depends on that. There is no
//! rotation mechanism and no inbound decryption: responses arrive as plain
//! protobuf.

use aes::Aes128;
use bytes::Bytes;
use cbc::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use thiserror::Error;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// Pre-shared key expected by the game endpoints.
pub const PROTOCOL_KEY: [u8; 16] = *b"Yg&tc%DEuh6%Zc^8";
/// Pre-shared initialization vector expected by the game endpoints.
pub const PROTOCOL_IV: [u8; 16] = *b"6oyZDr22E3ychjM%";

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("ciphertext is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Deterministic AES-CBC encryptor.
#[derive(Clone)]
pub struct CipherTransform {
    key: [u8; 16],
    iv: [u8; 16],
}

impl CipherTransform {
    pub fn new(key: [u8; 16], iv: [u8; 16]) -> Self {
        Self { key, iv }
    }

    /// Transform keyed with the protocol's pre-shared constants.
    pub fn protocol() -> Self {
        Self::new(PROTOCOL_KEY, PROTOCOL_IV)
    }

    /// Pads and encrypts `plaintext`, returning lower-case hex.
    pub fn encrypt(&self, plaintext: &[u8]) -> String {
        hex::encode(self.encrypt_raw(plaintext))
    }

    fn encrypt_raw(&self, plaintext: &[u8]) -> Vec<u8> {
        Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }
}

impl Default for CipherTransform {
    fn default() -> Self {
        Self::protocol()
    }
}

impl std::fmt::Debug for CipherTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherTransform").finish_non_exhaustive()
    }
}

/// Converts a hex ciphertext into the raw body bytes posted on the wire.
pub fn ciphertext_body(ciphertext_hex: &str) -> Result<Bytes, CipherError> {
    Ok(Bytes::from(hex::decode(ciphertext_hex)?))
}
