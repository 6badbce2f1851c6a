//! Token payload: the plaintext record carried inside every token.

use std::fmt;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TokenError};

/// Default call budget for a token.
pub const DEFAULT_MAX_CALLS: u64 = 100;
/// Default lifetime in days.
pub const DEFAULT_EXPIRE_DAYS: u32 = 1;
/// Default upstream provider.
pub const DEFAULT_PROVIDER: &str = "dashscope";

/// Plaintext token contents.
///
/// Field order is the serialization order and must stay stable: relays parse
/// this exact JSON shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: String,
    pub api_key: String,
    pub max_calls: u64,
    #[serde(with = "timestamp")]
    pub expire_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub provider: String,
    #[serde(default)]
    pub ext_info: String,
}

impl TokenPayload {
    /// Build a payload issued at `now`.
    ///
    /// `now` is truncated to millisecond precision so the payload survives a
    /// serialize/parse cycle unchanged.
    pub fn issue(options: &TokenOptions, id_scheme: IdScheme, now: DateTime<Utc>) -> Result<Self> {
        if options.api_key.is_empty() {
            return Err(TokenError::EmptyApiKey);
        }

        let created_at = now.trunc_subsecs(3);
        let expire_time = created_at
            .checked_add_signed(TimeDelta::days(i64::from(options.expire_days)))
            .ok_or(TokenError::ExpiryOutOfRange(options.expire_days))?;

        Ok(Self {
            id: id_scheme.generate(created_at),
            api_key: options.api_key.clone(),
            max_calls: options.max_calls,
            expire_time,
            created_at,
            provider: options.provider.clone(),
            ext_info: options.ext_info.clone(),
        })
    }

    /// True once `now` is past the expiry time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_time
    }

    /// Model the relay should substitute into forwarded requests, if any.
    pub fn model_override(&self) -> Option<String> {
        if self.ext_info.is_empty() {
            return None;
        }
        let ext: ExtInfo = serde_json::from_str(&self.ext_info).ok()?;
        ext.rep_m.filter(|m| !m.is_empty())
    }
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPayload")
            .field("id", &self.id)
            .field("api_key", &"<redacted>")
            .field("max_calls", &self.max_calls)
            .field("expire_time", &self.expire_time)
            .field("created_at", &self.created_at)
            .field("provider", &self.provider)
            .field("ext_info", &self.ext_info)
            .finish()
    }
}

/// Structured form of `ext_info` understood by relays.
#[derive(Debug, Deserialize)]
struct ExtInfo {
    #[serde(default)]
    rep_m: Option<String>,
}

/// How token ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdScheme {
    /// `token-<unix millis>`. Not unique across concurrent issuers.
    #[default]
    Timestamp,
    /// `token-<uuidv7>`. Time-ordered and collision resistant.
    UuidV7,
}

impl IdScheme {
    fn generate(&self, now: DateTime<Utc>) -> String {
        match self {
            IdScheme::Timestamp => format!("token-{}", now.timestamp_millis()),
            IdScheme::UuidV7 => format!("token-{}", Uuid::now_v7()),
        }
    }
}

/// Caller-supplied inputs for a new token.
#[derive(Clone)]
pub struct TokenOptions {
    pub api_key: String,
    pub max_calls: u64,
    pub expire_days: u32,
    pub provider: String,
    pub ext_info: String,
}

impl TokenOptions {
    /// Options for `api_key` with default budget, lifetime and provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            max_calls: DEFAULT_MAX_CALLS,
            expire_days: DEFAULT_EXPIRE_DAYS,
            provider: DEFAULT_PROVIDER.to_string(),
            ext_info: String::new(),
        }
    }

    pub fn with_max_calls(mut self, max_calls: u64) -> Self {
        self.max_calls = max_calls;
        self
    }

    pub fn with_expire_days(mut self, expire_days: u32) -> Self {
        self.expire_days = expire_days;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_ext_info(mut self, ext_info: impl Into<String>) -> Self {
        self.ext_info = ext_info.into();
        self
    }

    /// Ask the relay to replace the request's `model` with `model`.
    ///
    /// Overwrites any previous `ext_info`.
    pub fn with_model_override(mut self, model: impl Into<String>) -> Self {
        self.ext_info = serde_json::json!({ "rep_m": model.into() }).to_string();
        self
    }
}

impl fmt::Debug for TokenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenOptions")
            .field("api_key", &"<redacted>")
            .field("max_calls", &self.max_calls)
            .field("expire_days", &self.expire_days)
            .field("provider", &self.provider)
            .field("ext_info", &self.ext_info)
            .finish()
    }
}

/// RFC 3339 UTC timestamps with millisecond precision (`...T12:00:00.000Z`).
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        t: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
