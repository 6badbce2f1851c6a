//! Self-contained, encrypted relay access tokens.
//!
//! This crate provides functionality for:
//! - Validating the relay configuration (`server` and `crypto` sections)
//! - Building token payloads carrying an upstream API key, call budget and expiry
//! - Encrypting payloads into opaque, URL-safe token strings
//! - Decoding tokens again, as a relay holding the same configuration does
//! - Building relay server URLs that carry a token
//!
//! # Token Format
//!
//! `base64url_nopad(IV || AES-CBC-PKCS7(json(payload)))`
//!
//! The 16-byte IV is fresh randomness XOR-ed word-wise with the configured
//! `aes_iv_seed`. The payload JSON has a fixed field order:
//! `id, api_key, max_calls, expire_time, created_at, provider, ext_info`.
//!
//! # Security Notes
//!
//! - Keys are zeroized when the configuration is dropped
//! - IVs come from the operating system CSPRNG
//! - Tokens carry no MAC: they are confidential but malleable
//!
//! # Example
//!
//! ```rust
//! use token_codec::{ApiEndpoint, Configuration, RaiFile, TokenCodec, TokenOptions};
//!
//! let raw: RaiFile = serde_json::from_str(r#"{
//!     "version": "1.0.0",
//!     "server": {"host": "http://localhost", "port": 8840, "base_path": "/relayapi/"},
//!     "crypto": {
//!         "method": "aes",
//!         "aes_key": "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
//!         "aes_iv_seed": "fedcba9876543210"
//!     }
//! }"#).unwrap();
//!
//! let codec = TokenCodec::new(Configuration::validate(raw).unwrap());
//! let issued = codec.issue(&TokenOptions::new("sk-upstream").with_max_calls(10)).unwrap();
//!
//! let url = codec.config().urls().endpoint_url(ApiEndpoint::ChatCompletions, &issued.token);
//! assert!(url.starts_with("http://localhost:8840/relayapi/chat/completions?token="));
//!
//! let payload = codec.decrypt(&issued.token).unwrap();
//! assert_eq!(payload.max_calls, 10);
//! ```

mod config;
mod error;
mod iv;
mod parse;
mod payload;
mod token;
mod url;

// Public re-exports
pub use config::{Configuration, CryptoConfig, CryptoMethod, CryptoSection, RaiFile, ServerConfig};
pub use error::{ConfigError, Result, TokenError, UnknownEndpoint};
pub use iv::{IV_LEN, generate_iv, mix};
pub use parse::decrypt;
pub use payload::{
    DEFAULT_EXPIRE_DAYS, DEFAULT_MAX_CALLS, DEFAULT_PROVIDER, IdScheme, TokenOptions, TokenPayload,
};
pub use token::{IssuedToken, TokenCodec};
pub use url::{ApiEndpoint, HEALTH_PATH, ServerUrls, with_token};
