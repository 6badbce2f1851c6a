//! Error types for configuration validation and token operations.

use thiserror::Error;

/// Errors raised while validating a relay configuration.
///
/// These are always fatal to codec construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A top-level section (`server` or `crypto`) is absent.
    #[error("Invalid config: missing {0} section")]
    MissingSection(&'static str),

    /// Only AES is supported.
    #[error("Unsupported encryption method: {0}")]
    UnsupportedMethod(String),

    /// A required field is absent or empty.
    #[error("Invalid config: missing or empty {0}")]
    MissingField(&'static str),

    /// `aes_key` is not valid hex.
    #[error("Invalid AES key: not a hex string")]
    InvalidKeyEncoding,

    /// `aes_key` decoded to a length AES does not accept.
    #[error("Invalid AES key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    /// `aes_iv_seed` is not exactly one cipher block.
    #[error("Invalid AES IV seed length: {0} bytes (expected 16)")]
    InvalidIvSeedLength(usize),

    /// Server port must be positive.
    #[error("Invalid server port")]
    InvalidPort,
}

/// Errors that can occur while building, encrypting or decoding a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Tokens must carry a non-empty upstream API key.
    #[error("API key must not be empty")]
    EmptyApiKey,

    /// Expiry would fall outside the representable time range.
    #[error("Expiry of {0} days is out of range")]
    ExpiryOutOfRange(u32),

    /// Payload could not be serialized.
    #[error("Failed to serialize token payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key length rejected by the cipher.
    #[error("Unsupported key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// Token text is not base64url.
    #[error("Invalid token encoding")]
    InvalidEncoding,

    /// Decoded token is shorter than an IV plus one cipher block.
    #[error("Token too short: {0} bytes")]
    TooShort(usize),

    /// Ciphertext failed to decrypt or unpad (wrong key, tampered data).
    #[error("Failed to decrypt token")]
    Decrypt,

    /// Decrypted bytes are not a valid token payload.
    #[error("Invalid token payload: {0}")]
    Payload(String),
}

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// API type name that does not map to a relay endpoint.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported API type: {0}")]
pub struct UnknownEndpoint(pub String);
