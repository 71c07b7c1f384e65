use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

/// Bearer token supplied by whoever runs the engine. Never printed.
#[derive(Clone)]
pub struct Credential(Arc<SecretString>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::new(token.into())))
    }

    /// clap value parser.
    pub fn parse(raw: &str) -> std::result::Result<Self, Infallible> {
        Ok(Self::new(raw.trim()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }

    /// True when a `${VAR}` placeholder survived environment substitution.
    pub fn is_unresolved_placeholder(&self) -> bool {
        let token = self.expose();
        token.starts_with("${") && token.ends_with('}')
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::new(token))
    }
}
