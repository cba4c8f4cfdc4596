//! Email address entered in the first wizard step.

use std::fmt;

use serde::Serialize;

const REQUIRED: &str = "Email is required";
const MALFORMED: &str = "Please enter a valid email address";

/// An email address that passed the `local@domain.tld` shape check.
///
/// Shape only, not RFC 5322. The verification service validates further.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse user input, returning the validation messages on failure.
    ///
    /// Exactly one message is returned for any invalid input.
    pub fn parse(input: &str) -> Result<Self, Vec<String>> {
        if input.trim().is_empty() {
            return Err(vec![REQUIRED.to_string()]);
        }
        if !has_email_shape(input) {
            return Err(vec![MALFORMED.to_string()]);
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_atom_char(c: char) -> bool {
    c != '@' && !c.is_whitespace()
}

/// `[^\s@]+ @ [^\s@]+ \. [^\s@]+`, anchored at both ends.
fn has_email_shape(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(is_atom_char) {
        return false;
    }
    if !domain.chars().all(is_atom_char) {
        return false;
    }
    // Some dot must have at least one character on either side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_addresses() {
        for input in [
            "user@example.com",
            "first.last+tag@sub.example.co.uk",
            "a@b.c",
            "user@domain..com",
            "user@.domain.com",
        ] {
            assert!(EmailAddress::parse(input).is_ok(), "{input} should parse");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for input in [
            "not-an-email",
            "user@example",
            "@example.com",
            "user@",
            "user@example.",
            "user@.com",
            "us er@example.com",
            "user@exa mple.com",
            "user@@example.com",
            "user@example@other.com",
            " user@example.com",
        ] {
            let errors = EmailAddress::parse(input).unwrap_err();
            assert_eq!(errors, vec![MALFORMED.to_string()], "{input}");
        }
    }

    #[test]
    fn test_blank_is_required_error() {
        assert_eq!(
            EmailAddress::parse("   ").unwrap_err(),
            vec![REQUIRED.to_string()]
        );
        assert_eq!(EmailAddress::parse("").unwrap_err().len(), 1);
    }

    #[test]
    fn test_preserves_input() {
        let email = EmailAddress::parse("User@Example.com").unwrap();
        assert_eq!(email.as_str(), "User@Example.com");
        assert_eq!(
            serde_json::to_string(&email).unwrap(),
            "\"User@Example.com\""
        );
    }
}
