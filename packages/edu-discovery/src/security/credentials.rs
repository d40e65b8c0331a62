//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A secret string that won't be logged or displayed.
///
/// Uses `secrecy::SecretBox` to ensure API keys are never accidentally
/// exposed in logs, debug output, or error messages.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Google Custom Search credentials.
///
/// The engine id (`cx`) is not secret, but it is useless without the key.
#[derive(Clone)]
pub struct GoogleCseCredentials {
    pub api_key: SecretString,
    pub cx: String,
}

impl GoogleCseCredentials {
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            cx: cx.into(),
        }
    }
}

impl fmt::Debug for GoogleCseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCseCredentials")
            .field("api_key", &"[REDACTED]")
            .field("cx", &self.cx)
            .finish()
    }
}

/// Keys for the API-backed search providers. Scraping backends need none.
#[derive(Debug, Clone, Default)]
pub struct BackendCredentials {
    pub google: Option<GoogleCseCredentials>,
    pub tavily_api_key: Option<SecretString>,
}

impl BackendCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Google credentials; blank values are ignored.
    pub fn with_google(mut self, api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        let creds = GoogleCseCredentials::new(api_key, cx);
        if !creds.api_key.is_blank() && !creds.cx.trim().is_empty() {
            self.google = Some(creds);
        }
        self
    }

    /// Set the Tavily key; a blank key is ignored.
    pub fn with_tavily(mut self, api_key: impl Into<String>) -> Self {
        let key = SecretString::new(api_key);
        if !key.is_blank() {
            self.tavily_api_key = Some(key);
        }
        self
    }
}
