//! Key derivation from display labels

use regex::Regex;
use std::sync::OnceLock;

/// Slug used when a label has no ASCII letters or digits (e.g. CJK-only labels)
pub const FALLBACK_SLUG: &str = "node";

/// Upper bound on slug length before disambiguation suffixes
const MAX_SLUG_LEN: usize = 64;

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug regex is valid"))
}

/// Lowercase, URL-safe slug of `label`
///
/// Runs of characters outside `[a-z0-9]` collapse into a single `-`; leading
/// and trailing separators are dropped.
///
/// # Examples
/// ```
/// # use navtree_core::utils::slugify;
/// assert_eq!(slugify("User Login & SSO"), "user-login-sso");
/// assert_eq!(slugify("用户登录"), "node");
/// ```
pub fn slugify(label: &str) -> String {
    let lowered = label.to_lowercase();
    let slug = separator_regex().replace_all(&lowered, "-");
    let mut slug = slug.trim_matches('-').to_string();

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-2`, `base-3`, … for which `is_taken` is false
pub fn unique_slug(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (2u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Payment Gateway"), "payment-gateway");
        assert_eq!(slugify("  --API v2!! "), "api-v2");
    }

    #[test]
    fn test_slugify_non_ascii_falls_back() {
        assert_eq!(slugify("支付"), FALLBACK_SLUG);
        assert_eq!(slugify(""), FALLBACK_SLUG);
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(200);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_unique_slug_disambiguates() {
        let taken: HashSet<&str> = ["login", "login-2"].into_iter().collect();
        assert_eq!(unique_slug("login", |s| taken.contains(s)), "login-3");
        assert_eq!(unique_slug("logout", |s| taken.contains(s)), "logout");
    }
}
