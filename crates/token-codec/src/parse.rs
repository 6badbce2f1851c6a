//! Token decoding, the inverse of [`TokenCodec::encrypt`](crate::TokenCodec::encrypt).
//!
//! Relays holding the same configuration use this to recover the payload.
//! There is no authentication tag: a token that decrypts and parses is
//! accepted, so bit-flipped ciphertext can yield a different valid payload.

use aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use aes::{Aes128, Aes192, Aes256};
use data_encoding::BASE64URL_NOPAD;

use crate::config::Configuration;
use crate::error::{Result, TokenError};
use crate::iv::IV_LEN;
use crate::payload::TokenPayload;

const BLOCK_LEN: usize = 16;

/// Decode and decrypt a token string.
///
/// Trailing `=` padding and surrounding whitespace are tolerated.
pub fn decrypt(token: &str, config: &Configuration) -> Result<TokenPayload> {
    let encoded = token.trim().trim_end_matches('=');
    let raw = BASE64URL_NOPAD
        .decode(encoded.as_bytes())
        .map_err(|_| TokenError::InvalidEncoding)?;

    if raw.len() < IV_LEN + BLOCK_LEN {
        return Err(TokenError::TooShort(raw.len()));
    }

    let (iv, ciphertext) = raw.split_at(IV_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(TokenError::Decrypt);
    }

    let plaintext = cbc_decrypt(config.crypto().key().as_bytes(), iv, ciphertext)?;

    let payload: TokenPayload =
        serde_json::from_slice(&plaintext).map_err(|e| TokenError::Payload(e.to_string()))?;

    if payload.id.is_empty() || payload.api_key.is_empty() || payload.provider.is_empty() {
        return Err(TokenError::Payload("missing required fields".to_string()));
    }

    Ok(payload)
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        n => return Err(TokenError::InvalidKeyLength(n)),
    };

    plaintext
        .map_err(|_| TokenError::InvalidKeyLength(key.len()))?
        .map_err(|_| TokenError::Decrypt)
}
