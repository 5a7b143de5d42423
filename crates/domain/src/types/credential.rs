//! Short-lived bearer credentials

use std::fmt;

/// Access token issued by the identity provider.
///
/// Call-scoped: acquired for one attempt of one operation and dropped
/// afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential {
    access_token: String,
    /// Declared lifetime in seconds, if the provider reported one.
    expires_in: Option<u64>,
}

impl BearerCredential {
    pub fn new(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self { access_token: access_token.into(), expires_in }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredential")
            .field("access_token", &format_args!("[REDACTED; {} chars]", self.access_token.len()))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_token() {
        let credential = BearerCredential::new("eyJ0eXAiOiJKV1Qi", Some(3599));
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("eyJ0eXAiOiJKV1Qi"));
        assert!(rendered.contains("16 chars"));
        assert_eq!(credential.expires_in(), Some(3599));
    }
}
