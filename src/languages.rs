//! Display names for language label codes
//!
//! Label codes are the short strings carried by the training corpus; the
//! serving response maps them to human-readable names. Unregistered codes
//! fall back to the raw code so a retrained checkpoint with new labels keeps
//! working without a table update.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static LANGUAGE_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ar", "Arabic"),
        ("bg", "Bulgarian"),
        ("de", "German"),
        ("el", "Greek"),
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("hi", "Hindi"),
        ("it", "Italian"),
        ("ja", "Japanese"),
        ("nl", "Dutch"),
        ("pl", "Polish"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("sw", "Swahili"),
        ("th", "Thai"),
        ("tr", "Turkish"),
        ("ur", "Urdu"),
        ("vi", "Vietnamese"),
        ("zh", "Chinese"),
    ])
});

/// Human-readable name for a label code, or the code itself if unregistered
pub fn display_name(code: &str) -> &str {
    LANGUAGE_NAMES.get(code).copied().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(display_name("fr"), "French");
        assert_eq!(display_name("zh"), "Chinese");
    }

    #[test]
    fn unknown_codes_fall_back_to_raw() {
        assert_eq!(display_name("xx"), "xx");
        assert_eq!(display_name(""), "");
    }
}
