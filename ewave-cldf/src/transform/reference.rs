//! Source references of the form `key[pages]`.

use std::fmt;

/// A citation of a bibliography entry, optionally with a page or context note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub source: String,
    pub description: String,
}

impl Reference {
    /// Brackets in the description become parentheses; they would end the
    /// `[...]` part early.
    pub fn new(source: impl Into<String>, description: &str) -> Self {
        Self {
            source: source.into(),
            description: description.replace('[', "(").replace(']', ")"),
        }
    }

    /// Split a formatted reference back into key and description.
    pub fn parse(formatted: &str) -> Self {
        match formatted.split_once('[') {
            Some((source, rest)) if rest.ends_with(']') => Self {
                source: source.to_string(),
                description: rest[..rest.len() - 1].to_string(),
            },
            _ => Self {
                source: formatted.to_string(),
                description: String::new(),
            },
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}[{}]", self.source, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_become_parentheses() {
        let r = Reference::new("abc", "see [x]");
        let s = r.to_string();
        assert_eq!(s, "abc[see (x)]");
        assert!(s.contains("(x)"));
        assert!(!s.contains("[x]"));
    }

    #[test]
    fn test_without_description() {
        assert_eq!(Reference::new("abc", "").to_string(), "abc");
    }

    #[test]
    fn test_parse() {
        let r = Reference::parse("Smith2001[12-14]");
        assert_eq!(r.source, "Smith2001");
        assert_eq!(r.description, "12-14");
        assert_eq!(Reference::parse("Smith2001").source, "Smith2001");
    }
}
