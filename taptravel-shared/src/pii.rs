use serde::{Deserialize, Serialize};
use std::fmt;

/// Wrapper for secrets (payment client secrets, ephemeral keys, session tokens).
///
/// `Debug` and `Display` print a fixed mask so a secret never reaches a log line
/// through `tracing::info!("{:?}", ..)`. Serialization is transparent because the
/// backend and the payment sheet need the real value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the secret. Call sites are the only places a secret leaves the wrapper.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked(********)")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_hidden_from_formatting() {
        let secret = Masked::new("pi_123_secret_abc".to_string());

        assert_eq!(format!("{}", secret), "********");
        assert!(!format!("{:?}", secret).contains("pi_123"));
        assert_eq!(secret.expose(), "pi_123_secret_abc");
    }

    #[test]
    fn test_serializes_real_value() {
        let secret = Masked::new("ek_live_1".to_string());
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"ek_live_1\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_inner(), "ek_live_1");
    }
}
