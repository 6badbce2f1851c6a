//! Token issuance and encryption.

use aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use aes::{Aes128, Aes192, Aes256};
use chrono::{DateTime, Utc};
use data_encoding::BASE64URL_NOPAD;

use crate::config::Configuration;
use crate::error::{Result, TokenError};
use crate::iv::{IV_LEN, generate_iv};
use crate::parse::decrypt;
use crate::payload::{IdScheme, TokenOptions, TokenPayload};

/// An issued token handed to the caller.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The opaque token string (base64url, no padding).
    pub token: String,
    /// Payload id, for logging and correlation with relay records.
    pub id: String,
    pub expire_time: DateTime<Utc>,
}

/// Builds and encrypts tokens under one validated configuration.
///
/// Holds no mutable state, so a single codec can be shared across threads.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    config: Configuration,
    id_scheme: IdScheme,
}

impl TokenCodec {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            id_scheme: IdScheme::default(),
        }
    }

    /// Select how payload ids are generated.
    pub fn with_id_scheme(mut self, id_scheme: IdScheme) -> Self {
        self.id_scheme = id_scheme;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Build a payload issued now.
    pub fn create_payload(&self, options: &TokenOptions) -> Result<TokenPayload> {
        TokenPayload::issue(options, self.id_scheme, Utc::now())
    }

    /// Encrypt a payload into its wire form.
    ///
    /// Layout: `base64url_nopad(IV || AES-CBC-PKCS7(json(payload)))`.
    pub fn encrypt(&self, payload: &TokenPayload) -> Result<String> {
        // Serialize in declaration order
        let plaintext = serde_json::to_vec(payload)?;

        // Fresh IV, mixed with the configured seed
        let iv = generate_iv(self.config.crypto().iv_seed());

        seal(self.config.crypto().key().as_bytes(), &iv, &plaintext)
    }

    /// Build and encrypt a token in one step.
    pub fn issue(&self, options: &TokenOptions) -> Result<IssuedToken> {
        let payload = self.create_payload(options)?;
        let token = self.encrypt(&payload)?;

        log::debug!(
            "issued token {} for provider {} (max_calls={}, expires {})",
            payload.id,
            payload.provider,
            payload.max_calls,
            payload.expire_time
        );

        Ok(IssuedToken {
            token,
            id: payload.id,
            expire_time: payload.expire_time,
        })
    }

    /// Decode a token issued under the same configuration.
    pub fn decrypt(&self, token: &str) -> Result<TokenPayload> {
        decrypt(token, &self.config)
    }
}

/// Encrypt `plaintext` under `iv` and encode the token string.
fn seal(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<String> {
    let ciphertext = cbc_encrypt(key, iv, plaintext)?;

    // Build the raw token: IV (16) + ciphertext
    let mut raw = Vec::with_capacity(IV_LEN + ciphertext.len());
    raw.extend_from_slice(iv);
    raw.extend_from_slice(&ciphertext);

    // Encode as base64url (no padding)
    Ok(BASE64URL_NOPAD.encode(&raw))
}

fn cbc_encrypt(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        n => return Err(TokenError::InvalidKeyLength(n)),
    };
    ciphertext.map_err(|_| TokenError::InvalidKeyLength(key.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{TEST_KEY, TEST_SEED, raw_config, test_config};
    use crate::iv::mix;
    use data_encoding::HEXLOWER;

    // Reference vectors computed with `openssl enc -aes-256-cbc` under
    // TEST_KEY, with the IV equal to the seed (zero randomness).
    const KNOWN_PLAINTEXT: &str = r#"{"id":"token-1","api_key":"k"}"#;
    const KNOWN_CIPHERTEXT: &str =
        "cd4682242518c1041675eca51199dd6e5140a3e2decd904691832a1798fb771c";
    const KNOWN_TOKEN: &str = "ZmVkY2JhOTg3NjU0MzIxMM1GgiQlGMEEFnXspRGZ3W5RQKPi3s2QRpGDKheY-3cc";

    fn codec() -> TokenCodec {
        TokenCodec::new(test_config())
    }

    fn is_url_safe(token: &str) -> bool {
        !token.is_empty()
            && token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    fn test_key() -> Vec<u8> {
        HEXLOWER.decode(TEST_KEY.as_bytes()).unwrap()
    }

    fn zero_random_iv() -> [u8; IV_LEN] {
        mix(&[0u8; IV_LEN], TEST_SEED.as_bytes().try_into().unwrap())
    }

    #[test]
    fn test_cbc_encrypt_known_answer() {
        let ciphertext =
            cbc_encrypt(&test_key(), &zero_random_iv(), KNOWN_PLAINTEXT.as_bytes()).unwrap();
        assert_eq!(HEXLOWER.encode(&ciphertext), KNOWN_CIPHERTEXT);
    }

    #[test]
    fn test_seal_known_token() {
        let token = seal(&test_key(), &zero_random_iv(), KNOWN_PLAINTEXT.as_bytes()).unwrap();
        assert_eq!(token, KNOWN_TOKEN);
    }

    #[test]
    fn test_token_is_url_safe() {
        let issued = codec().issue(&TokenOptions::new("test-api-key")).unwrap();
        assert!(is_url_safe(&issued.token));
        assert!(issued.id.starts_with("token-"));
    }

    #[test]
    fn test_token_length_matches_layout() {
        let codec = codec();
        let payload = codec.create_payload(&TokenOptions::new("test-api-key")).unwrap();
        let json_len = serde_json::to_vec(&payload).unwrap().len();
        let padded = (json_len / 16 + 1) * 16;

        let token = codec.encrypt(&payload).unwrap();
        let raw = BASE64URL_NOPAD.decode(token.as_bytes()).unwrap();
        assert_eq!(raw.len(), IV_LEN + padded);
    }

    #[test]
    fn test_same_payload_encrypts_differently() {
        let codec = codec();
        let payload = codec.create_payload(&TokenOptions::new("test-api-key")).unwrap();
        let t1 = codec.encrypt(&payload).unwrap();
        let t2 = codec.encrypt(&payload).unwrap();
        assert_ne!(t1, t2);
        assert_eq!(codec.decrypt(&t1).unwrap(), payload);
        assert_eq!(codec.decrypt(&t2).unwrap(), payload);
    }

    #[test]
    fn test_every_aes_key_size() {
        for hex_len in [32, 48, 64] {
            let mut raw = raw_config();
            raw.crypto.as_mut().unwrap().aes_key = "5a".repeat(hex_len / 2);
            let codec = TokenCodec::new(Configuration::validate(raw).unwrap());
            assert_eq!(codec.config().crypto().key_bits(), hex_len * 4);

            let payload = codec.create_payload(&TokenOptions::new("k")).unwrap();
            let token = codec.encrypt(&payload).unwrap();
            assert!(is_url_safe(&token));
            assert_eq!(codec.decrypt(&token).unwrap(), payload);
        }
    }

    #[test]
    fn test_empty_api_key_fails() {
        let result = codec().issue(&TokenOptions::new(""));
        assert!(matches!(result, Err(TokenError::EmptyApiKey)));
    }

    #[test]
    fn test_cbc_encrypt_rejects_bad_key() {
        let result = cbc_encrypt(&[0u8; 10], &[0u8; IV_LEN], b"data");
        assert!(matches!(result, Err(TokenError::InvalidKeyLength(10))));
    }

    #[test]
    fn test_uuid_id_scheme() {
        let codec = codec().with_id_scheme(IdScheme::UuidV7);
        let issued = codec.issue(&TokenOptions::new("k")).unwrap();
        let payload = codec.decrypt(&issued.token).unwrap();
        assert_eq!(payload.id, issued.id);
        assert_eq!(payload.id.len(), "token-".len() + 36);
    }

    #[test]
    fn test_codec_is_shareable_across_threads() {
        let codec = std::sync::Arc::new(codec());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let codec = codec.clone();
                std::thread::spawn(move || {
                    let options = TokenOptions::new(format!("key-{i}"));
                    let issued = codec.issue(&options).unwrap();
                    codec.decrypt(&issued.token).unwrap().api_key
                })
            })
            .collect();

        let mut keys: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        keys.sort();
        assert_eq!(keys, vec!["key-0", "key-1", "key-2", "key-3"]);
    }
}
