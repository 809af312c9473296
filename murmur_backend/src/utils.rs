use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;

pub const APP_NAME: &str = "murmur_backend";

static SLUG_RE: OnceLock<Regex> = OnceLock::new();
static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Group slugs: letters, digits, dashes and underscores, nothing else.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE
        .get_or_init(|| Regex::new("^[-a-zA-Z0-9_]+$").expect("slug pattern"))
        .is_match(slug)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE
        .get_or_init(|| Regex::new("^[a-zA-Z0-9_]{3,30}$").expect("username pattern"))
        .is_match(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("rustaceans"));
        assert!(is_valid_slug("test-slug_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("cyrillic-группа"));
    }

    #[test]
    fn username_rules() {
        assert!(is_valid_username("bob_42"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("contains-dash"));
        assert!(!is_valid_username(&"x".repeat(31)));
    }
}
