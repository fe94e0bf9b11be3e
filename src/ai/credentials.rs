use std::fmt;

/// Environment variables checked for the completion API key, in order
pub const API_KEY_VARS: [&str; 2] = ["GROQ_API_KEY", "STUDYAI_API_KEY"];

const REDACTED: &str = "[REDACTED]";

/// API key resolved from the environment.
///
/// Debug and Display never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// First non-empty value among `API_KEY_VARS`
    pub fn resolve<F>(lookup: &F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(*name))
            .find_map(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Remove every occurrence of the key from `text`
    pub fn redact(&self, text: &str) -> String {
        text.replace(&self.0, REDACTED)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(")?;
        f.write_str(REDACTED)?;
        f.write_str(")")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Redact with an optional key; a no-op when none is configured
pub fn redact(key: Option<&ApiKey>, text: &str) -> String {
    match key {
        Some(key) => key.redact(text),
        None => text.to_string(),
    }
}
