//! Relay token issuing front end.
//!
//! Resolves a [`ConfigSource`] into a validated configuration and hands it to
//! [`token_codec::TokenCodec`]. Everything cryptographic lives in `token-codec`.

pub mod source;

pub use source::{ConfigSource, LoadError, load_file};
pub use token_codec;
