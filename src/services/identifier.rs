//! Classification of free-form recipient strings.
//!
//! Pure string logic only; the resolver decides which provider to call for
//! each shape.

use ethers::types::Address;
use regex::Regex;
use std::sync::OnceLock;

use crate::constants::{BASENAME_SUFFIX, ENS_SUFFIX};

static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
static LABEL_RE: OnceLock<Regex> = OnceLock::new();
static STRICT_BASENAME_RE: OnceLock<Regex> = OnceLock::new();
static HANDLE_RE: OnceLock<Regex> = OnceLock::new();

fn address_re() -> &'static Regex {
    ADDRESS_RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"))
}

fn label_re() -> &'static Regex {
    LABEL_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+$").expect("static regex"))
}

fn strict_basename_re() -> &'static Regex {
    STRICT_BASENAME_RE
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+\.base\.eth$").expect("static regex"))
}

fn handle_re() -> &'static Regex {
    HANDLE_RE.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").expect("static regex"))
}

/// `0x` followed by exactly 40 hex digits, any casing.
pub fn is_address_literal(input: &str) -> bool {
    address_re().is_match(input)
}

/// Parses an address literal. Mixed-case input is accepted without checksum
/// verification, matching wallet UIs that paste lower-cased addresses.
pub fn parse_address(input: &str) -> Option<Address> {
    let trimmed = input.trim();
    if !is_address_literal(trimmed) {
        return None;
    }
    trimmed.parse::<Address>().ok()
}

/// Returns the fully-qualified basename (`label.base.eth`) when the input has
/// basename shape and passes strict format validation.
pub fn basename_candidate(input: &str) -> Option<String> {
    let lower = input.trim().to_ascii_lowercase();

    let name = if !lower.contains('.') {
        if !label_re().is_match(&lower) {
            return None;
        }
        format!("{lower}{BASENAME_SUFFIX}")
    } else {
        let label = lower.strip_suffix(BASENAME_SUFFIX)?;
        if !label_re().is_match(label) {
            return None;
        }
        lower.clone()
    };

    strict_basename_re().is_match(&name).then_some(name)
}

/// Label part of a `label.base.eth` name.
pub fn basename_label(name: &str) -> &str {
    name.strip_suffix(BASENAME_SUFFIX).unwrap_or(name)
}

/// Farcaster username for inputs like `bob`, `@bob` or `bob_smith`.
pub fn farcaster_handle(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let handle = stripped.to_ascii_lowercase();
    if handle.contains('.') || !handle_re().is_match(&handle) {
        return None;
    }
    Some(handle)
}

/// Mainnet ENS name (`*.eth` that is not a basename).
pub fn ens_candidate(input: &str) -> Option<String> {
    let lower = input.trim().to_ascii_lowercase();
    if lower.len() <= ENS_SUFFIX.len()
        || !lower.ends_with(ENS_SUFFIX)
        || lower.ends_with(BASENAME_SUFFIX)
    {
        return None;
    }
    Some(lower)
}

/// User-facing message for an identifier no provider could resolve.
pub fn unresolved_message(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains('.') {
        format!(
            "Could not resolve \"{}\". This name may not be registered.",
            trimmed
        )
    } else {
        format!(
            "Could not find a user named \"{}\". Please check the spelling.",
            trimmed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_literal_requires_exact_length() {
        assert!(is_address_literal(
            "0x52908400098527886E0F7030069857D2E4169EE7"
        ));
        assert!(!is_address_literal("0x1234"));
        assert!(!is_address_literal(
            "52908400098527886E0F7030069857D2E4169EE7"
        ));
        assert!(!is_address_literal(
            "0x52908400098527886E0F7030069857D2E4169EEZ"
        ));
    }

    #[test]
    fn parse_address_trims_whitespace() {
        assert!(parse_address("  0x52908400098527886e0f7030069857d2e4169ee7 ").is_some());
        assert!(parse_address("alice").is_none());
    }

    #[test]
    fn bare_label_becomes_basename() {
        assert_eq!(basename_candidate("alice").as_deref(), Some("alice.base.eth"));
        assert_eq!(basename_candidate("Alice").as_deref(), Some("alice.base.eth"));
        assert_eq!(
            basename_candidate("alice.base.eth").as_deref(),
            Some("alice.base.eth")
        );
    }

    #[test]
    fn basename_rejects_non_alphanumeric_labels() {
        assert!(basename_candidate("@alice").is_none());
        assert!(basename_candidate("bob_smith").is_none());
        assert!(basename_candidate("a-b.base.eth").is_none());
        assert!(basename_candidate("vitalik.eth").is_none());
        assert!(basename_candidate("").is_none());
    }

    #[test]
    fn basename_label_strips_suffix() {
        assert_eq!(basename_label("alice.base.eth"), "alice");
    }

    #[test]
    fn farcaster_handle_strips_at_sign() {
        assert_eq!(farcaster_handle("@bob").as_deref(), Some("bob"));
        assert_eq!(farcaster_handle("Bob_Smith").as_deref(), Some("bob_smith"));
        assert_eq!(farcaster_handle("dan-romero").as_deref(), Some("dan-romero"));
        assert!(farcaster_handle("vitalik.eth").is_none());
        assert!(farcaster_handle("@").is_none());
    }

    #[test]
    fn ens_excludes_basenames() {
        assert_eq!(ens_candidate("Vitalik.eth").as_deref(), Some("vitalik.eth"));
        assert!(ens_candidate("alice.base.eth").is_none());
        assert!(ens_candidate(".eth").is_none());
        assert!(ens_candidate("alice").is_none());
    }

    #[test]
    fn unresolved_message_distinguishes_dotted_names() {
        assert!(unresolved_message("nobody.eth").contains("may not be registered"));
        assert!(unresolved_message("nobdy").contains("check the spelling"));
    }
}
