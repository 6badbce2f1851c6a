//! Relay server URLs.
//!
//! Tokens travel as the single `token` query parameter.

use std::fmt;
use std::str::FromStr;

use crate::config::{Configuration, ServerConfig};
use crate::error::UnknownEndpoint;

/// Liveness path; served from the server root, outside the base path.
pub const HEALTH_PATH: &str = "health";

/// Relay endpoints a token can be used against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEndpoint {
    ChatCompletions,
    ImagesGenerations,
    Embeddings,
}

impl ApiEndpoint {
    /// Path below the server base path.
    pub fn path(&self) -> &'static str {
        match self {
            ApiEndpoint::ChatCompletions => "chat/completions",
            ApiEndpoint::ImagesGenerations => "images/generations",
            ApiEndpoint::Embeddings => "embeddings",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiEndpoint::ChatCompletions => "chat_completions",
            ApiEndpoint::ImagesGenerations => "images_generations",
            ApiEndpoint::Embeddings => "embeddings",
        }
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiEndpoint {
    type Err = UnknownEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat_completions" => Ok(ApiEndpoint::ChatCompletions),
            "images_generations" => Ok(ApiEndpoint::ImagesGenerations),
            "embeddings" => Ok(ApiEndpoint::Embeddings),
            other => Err(UnknownEndpoint(other.to_string())),
        }
    }
}

/// URL builder over a server section.
#[derive(Debug, Clone, Copy)]
pub struct ServerUrls<'a> {
    server: &'a ServerConfig,
}

impl<'a> ServerUrls<'a> {
    pub fn new(server: &'a ServerConfig) -> Self {
        Self { server }
    }

    /// `host:port`.
    pub fn origin(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// `host:port/<base_path>/<path>` with exactly one slash at each join.
    ///
    /// At most one leading slash is stripped from `path`. Exactly `health`
    /// skips the base path; `/health` does not.
    pub fn url(&self, path: &str) -> String {
        if path == HEALTH_PATH {
            return self.health_url();
        }
        let path = path.strip_prefix('/').unwrap_or(path);

        let base = self.server.base_path.trim_matches('/');
        if base.is_empty() {
            format!("{}/{}", self.origin(), path)
        } else {
            format!("{}/{}/{}", self.origin(), base, path)
        }
    }

    pub fn health_url(&self) -> String {
        format!("{}/{}", self.origin(), HEALTH_PATH)
    }

    /// Full endpoint URL carrying `token`.
    pub fn endpoint_url(&self, endpoint: ApiEndpoint, token: &str) -> String {
        with_token(&self.url(endpoint.path()), token)
    }
}

/// Append the token query parameter to `url`.
pub fn with_token(url: &str, token: &str) -> String {
    format!("{}?token={}", url, token.trim())
}

impl Configuration {
    pub fn urls(&self) -> ServerUrls<'_> {
        ServerUrls::new(self.server())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(base_path: &str) -> ServerConfig {
        ServerConfig {
            host: "http://localhost".to_string(),
            port: 8840,
            base_path: base_path.to_string(),
        }
    }

    #[test]
    fn test_base_path_slash_normalized() {
        for base in ["/relayapi/", "/relayapi", "relayapi", "relayapi/"] {
            let server = server(base);
            let urls = ServerUrls::new(&server);
            assert_eq!(urls.url("v1/chat"), "http://localhost:8840/relayapi/v1/chat");
            assert_eq!(urls.url("/v1/chat"), "http://localhost:8840/relayapi/v1/chat");
        }
    }

    #[test]
    fn test_only_one_leading_slash_trimmed() {
        let server = server("/relayapi/");
        let urls = ServerUrls::new(&server);
        assert_eq!(urls.url("//x"), "http://localhost:8840/relayapi//x");
    }

    #[test]
    fn test_empty_base_path() {
        for base in ["", "/"] {
            let server = server(base);
            let urls = ServerUrls::new(&server);
            assert_eq!(urls.url("embeddings"), "http://localhost:8840/embeddings");
        }
    }

    #[test]
    fn test_empty_path() {
        let server = server("/relayapi");
        assert_eq!(ServerUrls::new(&server).url(""), "http://localhost:8840/relayapi/");
    }

    #[test]
    fn test_health_skips_base_path() {
        let server = server("/relayapi/");
        let urls = ServerUrls::new(&server);
        assert_eq!(urls.url("health"), "http://localhost:8840/health");
        assert_eq!(urls.health_url(), "http://localhost:8840/health");
    }

    #[test]
    fn test_slashed_health_stays_under_base_path() {
        let server = server("/relayapi/");
        let urls = ServerUrls::new(&server);
        assert_eq!(urls.url("/health"), "http://localhost:8840/relayapi/health");
    }

    #[test]
    fn test_endpoint_url() {
        let server = server("/relayapi/");
        let urls = ServerUrls::new(&server);
        assert_eq!(
            urls.endpoint_url(ApiEndpoint::ChatCompletions, "abc_-1\n"),
            "http://localhost:8840/relayapi/chat/completions?token=abc_-1"
        );
        assert_eq!(
            urls.endpoint_url(ApiEndpoint::ImagesGenerations, "t"),
            "http://localhost:8840/relayapi/images/generations?token=t"
        );
    }

    #[test]
    fn test_endpoint_from_name() {
        for endpoint in [
            ApiEndpoint::ChatCompletions,
            ApiEndpoint::ImagesGenerations,
            ApiEndpoint::Embeddings,
        ] {
            assert_eq!(endpoint.name().parse::<ApiEndpoint>(), Ok(endpoint));
        }
        assert_eq!(
            "completions".parse::<ApiEndpoint>(),
            Err(UnknownEndpoint("completions".to_string()))
        );
    }
}
