use std::fmt;

/// Opaque OAuth access token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First four characters followed by a fixed mask, for logs and status lines
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}****")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&self.masked()).finish()
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_masked() {
        let token = AccessToken::new("ghp_supersecret");
        let debug = format!("{token:?}");
        assert_eq!(debug, "AccessToken(\"ghp_****\")");
        assert!(!debug.contains("supersecret"));
    }

    #[test]
    fn short_tokens_mask_cleanly() {
        assert_eq!(AccessToken::new("ab").masked(), "ab****");
    }
}
