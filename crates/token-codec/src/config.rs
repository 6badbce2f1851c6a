//! Relay configuration and its validation.
//!
//! A [`RaiFile`] is the configuration as it arrives (every section optional
//! so absence can be reported precisely). [`Configuration::validate`] turns it
//! into the immutable [`Configuration`] every codec operation reads from.

use std::fmt;
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ConfigError;
use crate::iv::IV_LEN;

/// Unvalidated configuration as read from a `.rai` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaiFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto: Option<CryptoSection>,
}

/// Where the relay server listens. Only used to build request URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Scheme and host, e.g. `http://localhost`.
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub base_path: String,
}

/// Raw `crypto` section. Empty strings stand in for absent fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoSection {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub aes_key: String,
    #[serde(default)]
    pub aes_iv_seed: String,
}

/// Supported encryption methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoMethod {
    Aes,
}

impl CryptoMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoMethod::Aes => "aes",
        }
    }
}

impl fmt::Display for CryptoMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes" => Ok(CryptoMethod::Aes),
            other => Err(ConfigError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Decoded AES key. Cleared from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct CipherKey(Vec<u8>);

impl CipherKey {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Validated crypto settings.
#[derive(Clone)]
pub struct CryptoConfig {
    method: CryptoMethod,
    key: CipherKey,
    iv_seed: [u8; IV_LEN],
    fingerprint: String,
}

impl CryptoConfig {
    pub fn method(&self) -> CryptoMethod {
        self.method
    }

    /// AES key size in bits.
    pub fn key_bits(&self) -> usize {
        self.key.as_bytes().len() * 8
    }

    pub(crate) fn key(&self) -> &CipherKey {
        &self.key
    }

    pub(crate) fn iv_seed(&self) -> &[u8; IV_LEN] {
        &self.iv_seed
    }
}

impl fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("method", &self.method)
            .field("key", &self.key)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Immutable, validated relay configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    version: Option<String>,
    server: ServerConfig,
    crypto: CryptoConfig,
}

impl Configuration {
    /// Validate a raw configuration.
    ///
    /// Fails when a section is missing, the method is not `aes`, the key or
    /// seed is absent, the key is not 16/24/32 bytes of hex, or the seed is
    /// not exactly 16 UTF-8 bytes.
    pub fn validate(raw: RaiFile) -> Result<Self, ConfigError> {
        let crypto = raw.crypto.ok_or(ConfigError::MissingSection("crypto"))?;
        let server = raw.server.ok_or(ConfigError::MissingSection("server"))?;

        let method: CryptoMethod = crypto.method.parse()?;

        if crypto.aes_key.is_empty() {
            return Err(ConfigError::MissingField("aes_key"));
        }
        if crypto.aes_iv_seed.is_empty() {
            return Err(ConfigError::MissingField("aes_iv_seed"));
        }
        if server.host.is_empty() {
            return Err(ConfigError::MissingField("host"));
        }
        if server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        let key = HEXLOWER_PERMISSIVE
            .decode(crypto.aes_key.as_bytes())
            .map_err(|_| ConfigError::InvalidKeyEncoding)?;
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(ConfigError::InvalidKeyLength(key.len()));
        }

        let iv_seed: [u8; IV_LEN] = crypto
            .aes_iv_seed
            .as_bytes()
            .try_into()
            .map_err(|_| ConfigError::InvalidIvSeedLength(crypto.aes_iv_seed.len()))?;

        let fingerprint = fingerprint(method, &crypto.aes_key, &crypto.aes_iv_seed);

        Ok(Self {
            version: raw.version,
            server,
            crypto: CryptoConfig {
                method,
                key: CipherKey(key),
                iv_seed,
                fingerprint,
            },
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn crypto(&self) -> &CryptoConfig {
        &self.crypto
    }

    /// SHA-256 hex digest identifying this crypto configuration.
    ///
    /// Safe to log; used to tell apart tokens issued under different keys.
    pub fn fingerprint(&self) -> &str {
        &self.crypto.fingerprint
    }
}

impl TryFrom<RaiFile> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RaiFile) -> Result<Self, Self::Error> {
        Configuration::validate(raw)
    }
}

fn fingerprint(method: CryptoMethod, aes_key: &str, aes_iv_seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(aes_key.as_bytes());
    hasher.update(aes_iv_seed.as_bytes());
    HEXLOWER.encode(&hasher.finalize())
}
