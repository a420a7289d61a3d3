//! Secret detection and redaction utilities.
//!
//! Remote API keys and credential-looking configuration options (for example
//! `gpt_api_key` or `volcano_tts_access_token`) must never reach logs verbatim.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// Uses case-insensitive pattern matching to detect common secret-related
/// naming conventions.
///
/// # Examples
///
/// ```
/// use confhub_shared::is_secret_key;
///
/// assert!(is_secret_key("CONFHUB_REMOTE_API_KEY"));
/// assert!(is_secret_key("volcano_tts_access_token"));
/// assert!(is_secret_key("ali_nls_key_secret"));
/// assert!(!is_secret_key("tts_module"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use confhub_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("gpt_api_key", "sk-123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("asr_mode", "funasr"), "funasr");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_well_known_credential_options() {
        assert!(is_secret_key("ali_nls_key_id"));
        assert!(is_secret_key("ali_tss_key_secret"));
        assert!(is_secret_key("ms_tts_key"));
        assert!(is_secret_key("baidu_emotion_api_key"));
        assert!(is_secret_key("gpt_api_key"));
        assert!(is_secret_key("volcano_tts_access_token"));
        assert!(is_secret_key("X-API-Key"));
    }

    #[test]
    fn leaves_plain_options_alone() {
        assert!(!is_secret_key("tts_module"));
        assert!(!is_secret_key("local_asr_port"));
        assert!(!is_secret_key("gpt_base_url"));
        assert!(!is_secret_key("CONFHUB_REMOTE_TIMEOUT_MS"));
    }

    #[test]
    fn redacts_secret_values() {
        assert_eq!(redact_if_secret("gpt_api_key", "sk-123456"), REDACTED);
        assert_eq!(redact_if_secret("start_mode", "web"), "web");
    }

    #[test]
    fn secret_string_redacts_display_and_debug() {
        let secret = SecretString::new("shh");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "shh");
    }
}
