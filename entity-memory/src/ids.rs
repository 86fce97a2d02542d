//! Identifier helpers shared by the repositories and services.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));
static MINT_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("valid mint regex"));

pub fn create_id() -> String {
    Uuid::new_v4().to_string()
}

/// Epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn normalize_symbol(symbol: Option<&str>) -> Option<String> {
    let normalized = symbol?.trim().to_uppercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// Lowercase, runs of anything outside `[a-z0-9]` collapse to `-`, no
/// leading or trailing hyphens.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    NON_SLUG.replace_all(&lowered, "-").trim_matches('-').to_string()
}

/// Base58 string of plausible mint length.
pub fn is_mint_shaped(value: &str) -> bool {
    MINT_SHAPE.is_match(value)
}

/// Base36 rendering of the current epoch millis, used to disambiguate
/// unverified slugs that have no mint.
pub fn time_suffix() -> String {
    to_base36(now_millis().max(0) as u64)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Jupiter Exchange!! "), "jupiter-exchange");
        assert_eq!(slugify("$WIF (dog) -- hat"), "wif-dog-hat");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Ünïcode Coin"), "n-code-coin");
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(Some(" sol ")), Some("SOL".to_string()));
        assert_eq!(normalize_symbol(Some("   ")), None);
        assert_eq!(normalize_symbol(None), None);
    }

    #[test]
    fn test_mint_shape() {
        assert!(is_mint_shaped("So11111111111111111111111111111111111111112"));
        assert!(!is_mint_shaped("solana"));
        assert!(!is_mint_shaped("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl"));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }
}
