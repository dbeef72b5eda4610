//! Symmetric field encryption.
//!
//! User nickname, email and password columns hold AES-256-CBC ciphertexts
//! encoded in base64. The IV is the first 16 bytes of the key, so a given
//! plaintext always maps to the same ciphertext. This mirrors the legacy
//! storage format; it is not a password-hashing scheme.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use rand::RngCore;
use rand::rngs::OsRng;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_LENGTH: usize = 32;
const IV_LENGTH: usize = 16;
const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key length is {value} while at least {expected} is expected")]
    KeyLength { value: usize, expected: usize },
}

/// Field cipher with a fixed key and derived IV.
pub struct Cipher {
    key: [u8; KEY_LENGTH],
    iv: [u8; IV_LENGTH],
}

impl Cipher {
    /// Create a new [`Cipher`] from injected key material.
    ///
    /// The key must be at least 32 bytes; only the first 32 are used, and
    /// the first 16 double as the IV.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        let raw = key.as_ref();
        if raw.len() < KEY_LENGTH {
            return Err(CryptoError::KeyLength {
                value: raw.len(),
                expected: KEY_LENGTH,
            });
        }

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&raw[..KEY_LENGTH]);
        let mut iv = [0u8; IV_LENGTH];
        iv.copy_from_slice(&raw[..IV_LENGTH]);

        Ok(Self { key, iv })
    }

    /// Encrypt a string field. Empty input is returned unchanged.
    pub fn encrypt(&self, text: &str) -> String {
        if text.is_empty() {
            return String::default();
        }

        let cipher_text = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(text.as_bytes());

        BASE64.encode(cipher_text)
    }

    /// Decrypt a string field.
    ///
    /// Inputs that are not valid ciphertexts are returned unchanged. Rows
    /// written before encryption was introduced still hold plaintext, and
    /// the API keeps serving them.
    pub fn decrypt(&self, text: &str) -> String {
        if text.is_empty() {
            return text.to_owned();
        }

        let Ok(data) = BASE64.decode(text) else {
            return text.to_owned();
        };

        let plain = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&data);

        match plain.map(String::from_utf8) {
            Ok(Ok(plain)) => plain,
            _ => text.to_owned(),
        }
    }
}

/// Generate a random hex token for verification and deactivation links.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a 6-digit account deletion code.
pub fn deletion_code() -> String {
    OsRng.gen_range(100_000..1_000_000).to_string()
}
