//! URI comparison for destination and recipient matching.

use url::Url;

/// Comparison strategy for endpoint URLs.
pub trait UriComparator: Send + Sync {
    /// Returns true when the two URLs refer to the same endpoint.
    fn equal(&self, a: &str, b: &str) -> bool;
}

/// Comparator that treats scheme-default ports as equal.
///
/// `https://sp.example:443/acs` and `https://sp.example/acs` name the same
/// endpoint; identity providers disagree on which form they emit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUriComparator;

impl UriComparator for DefaultUriComparator {
    fn equal(&self, a: &str, b: &str) -> bool {
        match (Url::parse(a), Url::parse(b)) {
            // Url normalizes scheme-default ports away during parsing.
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_normalized_equality() {
        let cmp = DefaultUriComparator;
        assert!(cmp.equal("https://sp.example:443/acs", "https://sp.example/acs"));
        assert!(cmp.equal("http://sp.example:80/acs", "http://sp.example/acs"));
        assert!(!cmp.equal("https://sp.example:8443/acs", "https://sp.example/acs"));
    }

    #[test]
    fn distinct_paths_differ() {
        let cmp = DefaultUriComparator;
        assert!(!cmp.equal("https://sp.example/acs", "https://sp.example/acs2"));
        assert!(!cmp.equal("https://sp.example/acs", "https://other.example/acs"));
    }

    #[test]
    fn unparseable_inputs_fall_back_to_string_equality() {
        let cmp = DefaultUriComparator;
        assert!(cmp.equal("not a url", "not a url"));
        assert!(!cmp.equal("not a url", "also not a url"));
    }
}
