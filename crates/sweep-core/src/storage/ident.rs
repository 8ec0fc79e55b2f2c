use crate::errors::{Result, SweepError};
use regex::Regex;
use std::sync::OnceLock;

const IDENT_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENT_PATTERN).expect("identifier pattern is valid"))
}

/// Table and column names cannot be bound as parameters, so they are
/// restricted to plain identifiers and always quoted.
pub fn validate(name: &str) -> Result<&str> {
    if ident_re().is_match(name) {
        Ok(name)
    } else {
        Err(SweepError::InvalidIdentifier(name.to_string()))
    }
}

pub fn quote(name: &str) -> Result<String> {
    validate(name).map(|n| format!("\"{}\"", n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert_eq!(quote("solution_time_in_seconds").unwrap(), "\"solution_time_in_seconds\"");
        assert!(validate("_x1").is_ok());
    }

    #[test]
    fn pattern_compiles_and_matches() {
        assert!(ident_re().is_match("exhaustive"));
        assert!(!ident_re().is_match("exhaustive\n"));
    }

    #[test]
    fn rejects_injection_attempts() {
        for bad in ["", "1abc", "a b", "t; DROP TABLE x", "a\"b", "name--"] {
            assert!(validate(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
