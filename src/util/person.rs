use once_cell::sync::Lazy;
use regex::Regex;

// All four patterns are literals; they compile or the crate does not ship.
static EMAIL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^@]+@[^\s]+)\s+\(([^@]+)\)$").expect("valid regex"));
static NAME_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^@]+)\s+\(([^@]+@[^)]+)\)$").expect("valid regex"));
static NAME_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^@()]+)$").expect("valid regex"));
static EMAIL_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^@()]+@[^@()]+)$").expect("valid regex"));

/// A person parsed from an RSS author string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameAddress {
    pub name: String,
    pub email: String,
}

/// Parses author strings such as `"jdoe@example.com (John Doe)"` or
/// `"John Doe (jdoe@example.com)"`.
///
/// Returns `None` when the string matches none of the known shapes; the
/// caller keeps the raw value.
pub fn parse_name_address(raw: &str) -> Option<NameAddress> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = EMAIL_NAME.captures(s) {
        return Some(NameAddress {
            name: caps[2].to_string(),
            email: caps[1].to_string(),
        });
    }

    if let Some(caps) = NAME_EMAIL.captures(s) {
        return Some(NameAddress {
            name: caps[1].to_string(),
            email: caps[2].to_string(),
        });
    }

    if let Some(caps) = NAME_ONLY.captures(s) {
        return Some(NameAddress {
            name: caps[1].to_string(),
            email: String::new(),
        });
    }

    EMAIL_ONLY.captures(s).map(|caps| NameAddress {
        name: String::new(),
        email: caps[1].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(s: &str) -> (String, String) {
        let p = parse_name_address(s).unwrap();
        (p.name, p.email)
    }

    #[test]
    fn test_email_then_name() {
        assert_eq!(
            parsed("test@example.com (Test Name)"),
            ("Test Name".into(), "test@example.com".into())
        );
    }

    #[test]
    fn test_name_then_email() {
        assert_eq!(
            parsed("Test Name (test@example.com)"),
            ("Test Name".into(), "test@example.com".into())
        );
    }

    #[test]
    fn test_name_only() {
        assert_eq!(parsed("Test Name"), ("Test Name".into(), String::new()));
    }

    #[test]
    fn test_email_only() {
        assert_eq!(
            parsed("test@example.com"),
            (String::new(), "test@example.com".into())
        );
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_name_address("").is_none());
        assert!(parse_name_address("a@b@c (x)").is_none());
    }
}
