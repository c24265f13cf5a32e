//! AES-256-CBC encryption of text payloads.
//!
//! The key is a single SHA-256 pass over the password and the ciphertext
//! carries no authentication tag. Both are kept so that payloads stay
//! readable by existing decoders; use an AEAD with a real password KDF for
//! anything new.
//!
//! Wire format: `base64(iv || ciphertext)` with a 16-byte random IV and
//! PKCS#7 padding.

use std::io::{Read, Write};

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Name written into the envelope's `algorithm` field.
pub const ALGORITHM: &str = "AES-256-CBC";

/// Key size (256 bits).
pub const KEY_SIZE: usize = 32;

/// IV and block size (128 bits).
pub const IV_SIZE: usize = 16;

/// Sample text used by [`self_test`].
pub const SELF_TEST_SAMPLE: &str = "Test data for the encryption round trip";

/// Errors from the crypto codec.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The cipher could not be initialised.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The decoded input is too short or not block aligned.
    #[error("decryption failed: truncated input ({len} bytes)")]
    Truncated { len: usize },

    /// Padding check failed after decryption (usually a wrong password).
    #[error("decryption failed: invalid padding (wrong password or corrupted data)")]
    InvalidPadding,

    /// The plaintext is not valid UTF-8.
    #[error("decryption failed: plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// The transport encoding is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// zlib compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

/// Derives the 32-byte key as `SHA-256(password)`.
pub fn derive_key(password: &str) -> [u8; KEY_SIZE] {
    Sha256::digest(password.as_bytes()).into()
}

/// Encrypts `plaintext` under `password` and returns `base64(iv || ciphertext)`.
///
/// # Example
///
/// ```rust
/// use qrseal::crypto::{decrypt, encrypt};
///
/// let sealed = encrypt("hello", "hunter2").unwrap();
/// assert_eq!(decrypt(&sealed, "hunter2").unwrap(), "hello");
/// ```
pub fn encrypt(plaintext: &str, password: &str) -> Result<String, CryptoError> {
    let key = derive_key(password);
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(&key, &iv)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut sealed = Vec::with_capacity(IV_SIZE + ciphertext.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);
    debug!(plaintext_len = plaintext.len(), sealed_len = sealed.len(), "encrypted payload");

    Ok(STANDARD.encode(sealed))
}

/// Reverses [`encrypt`].
///
/// Fails with [`CryptoError::InvalidPadding`] for most wrong passwords, but
/// there is no MAC, so a wrong password can occasionally yield garbage that
/// happens to unpad cleanly and then fails as [`CryptoError::InvalidUtf8`]
/// (or, very rarely, succeeds).
pub fn decrypt(encoded: &str, password: &str) -> Result<String, CryptoError> {
    let sealed = STANDARD.decode(encoded.trim())?;
    if sealed.len() < 2 * IV_SIZE || (sealed.len() - IV_SIZE) % IV_SIZE != 0 {
        return Err(CryptoError::Truncated { len: sealed.len() });
    }
    let (iv, ciphertext) = sealed.split_at(IV_SIZE);

    let key = derive_key(password);
    let cipher = Aes256CbcDec::new_from_slices(&key, iv)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::InvalidPadding)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
}

/// zlib-compresses `data` and base64-encodes the result.
pub fn compress(data: &[u8]) -> Result<String, CryptoError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Reverses [`compress`].
pub fn decompress(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let compressed = STANDARD.decode(encoded.trim())?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Encrypts and decrypts [`SELF_TEST_SAMPLE`] under `password` and returns
/// the recovered text.
pub fn self_test(password: &str) -> Result<String, CryptoError> {
    let sealed = encrypt(SELF_TEST_SAMPLE, password)?;
    decrypt(&sealed, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_sha256() {
        // SHA-256("abc")
        let key = derive_key("abc");
        assert_eq!(key[..4], [0xba, 0x78, 0x16, 0xbf]);
        assert_eq!(key[28..], [0xf2, 0x00, 0x15, 0xad]);
        assert_eq!(derive_key("abc"), key);
        assert_ne!(derive_key("abd"), key);
    }

    #[test]
    fn test_roundtrip() {
        let long = "x".repeat(1000);
        for text in ["", "a", "exactly sixteen!", "Привет, мир 🌍", long.as_str()] {
            let sealed = encrypt(text, "p@ss").unwrap();
            assert_eq!(decrypt(&sealed, "p@ss").unwrap(), text);
        }
    }

    #[test]
    fn test_layout_is_iv_plus_padded_blocks() {
        for len in [0usize, 1, 15, 16, 17, 33] {
            let text = "a".repeat(len);
            let sealed = STANDARD.decode(encrypt(&text, "k").unwrap()).unwrap();
            let ciphertext_len = sealed.len() - IV_SIZE;
            assert_eq!(ciphertext_len % IV_SIZE, 0);
            assert_eq!(ciphertext_len, (len / IV_SIZE + 1) * IV_SIZE);
        }
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let a = encrypt("same", "same").unwrap();
        let b = encrypt("same", "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password_does_not_recover_plaintext() {
        let sealed = encrypt("attack at dawn", "right").unwrap();
        match decrypt(&sealed, "wrong") {
            Ok(text) => assert_ne!(text, "attack at dawn"),
            Err(e) => assert!(matches!(
                e,
                CryptoError::InvalidPadding | CryptoError::InvalidUtf8
            )),
        }
    }

    #[test]
    fn test_truncated_input() {
        let short = STANDARD.encode([0u8; 10]);
        assert!(matches!(decrypt(&short, "p"), Err(CryptoError::Truncated { len: 10 })));

        let iv_only = STANDARD.encode([0u8; 16]);
        assert!(matches!(decrypt(&iv_only, "p"), Err(CryptoError::Truncated { len: 16 })));

        let misaligned = STANDARD.encode([0u8; 40]);
        assert!(matches!(decrypt(&misaligned, "p"), Err(CryptoError::Truncated { .. })));
    }

    #[test]
    fn test_bad_base64() {
        assert!(matches!(decrypt("not base64!!", "p"), Err(CryptoError::Base64(_))));
    }

    #[test]
    fn test_compress_roundtrip() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\x00\xff";
        let packed = compress(data).unwrap();
        assert_eq!(decompress(&packed).unwrap(), data);
        assert_eq!(decompress(&compress(b"").unwrap()).unwrap(), b"");
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let not_zlib = STANDARD.encode(b"plain bytes");
        assert!(matches!(decompress(&not_zlib), Err(CryptoError::Compression(_))));
    }

    #[test]
    fn test_self_test() {
        assert_eq!(self_test("demo").unwrap(), SELF_TEST_SAMPLE);
    }
}
