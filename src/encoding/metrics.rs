//! Derived URL metrics

use serde::{Deserialize, Serialize};

/// Characters counted by `special_chars`
pub const DEFAULT_SPECIAL_CHARS: &str = "[$&+,:;=?@#|'<>.^*()%!-]";

/// Numeric shape of a request target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMetrics {
    pub params_number: usize,
    pub length: usize,
    pub url_depth: usize,
    pub upper_cases: usize,
    /// Everything that is not uppercase, digits and punctuation included
    pub lower_cases: usize,
    pub special_chars: usize,
}

impl UrlMetrics {
    pub fn measure(url: &str, special_chars: &str) -> Self {
        let mut length = 0;
        let mut upper_cases = 0;
        let mut special = 0;
        let mut url_depth = 0;
        let mut ampersands = 0;

        for c in url.chars() {
            length += 1;
            if c.is_uppercase() {
                upper_cases += 1;
            }
            if special_chars.contains(c) {
                special += 1;
            }
            match c {
                '/' => url_depth += 1,
                '&' => ampersands += 1,
                _ => {}
            }
        }

        Self {
            params_number: ampersands + 1,
            length,
            url_depth,
            upper_cases,
            lower_cases: length - upper_cases,
            special_chars: special,
        }
    }
}

/// Split a request line into its method and its target.
///
/// The first space-separated token is the method; the remaining tokens
/// (target and protocol) are concatenated without separators.
pub fn split_request(request: &str) -> (String, String) {
    let mut tokens = request.split(' ');
    let method = tokens.next().unwrap_or_default().to_string();
    let url: String = tokens.collect();
    (method, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_request() {
        assert_eq!(
            split_request("GET /index.php?id=1 HTTP/1.1"),
            ("GET".to_string(), "/index.php?id=1HTTP/1.1".to_string())
        );
        assert_eq!(split_request("-"), ("-".to_string(), String::new()));
        assert_eq!(split_request(""), (String::new(), String::new()));
    }

    #[test]
    fn test_measure_query_string() {
        let m = UrlMetrics::measure("/a/b.php?x=1&y=2&Z=3", DEFAULT_SPECIAL_CHARS);
        assert_eq!(m.params_number, 3);
        assert_eq!(m.length, 20);
        assert_eq!(m.url_depth, 2);
        assert_eq!(m.upper_cases, 1);
        assert_eq!(m.lower_cases, 19);
        // . ? = & = & =
        assert_eq!(m.special_chars, 7);

        // array-style parameters: . ? [ ] =
        let m = UrlMetrics::measure("/a.php?x[]=1", DEFAULT_SPECIAL_CHARS);
        assert_eq!(m.special_chars, 5);
    }

    #[test]
    fn test_measure_empty() {
        let m = UrlMetrics::measure("", DEFAULT_SPECIAL_CHARS);
        assert_eq!(m.params_number, 1);
        assert_eq!(m.length, 0);
        assert_eq!(m.lower_cases, 0);
    }

    #[test]
    fn test_custom_special_set() {
        let m = UrlMetrics::measure("/a/b", "/");
        assert_eq!(m.special_chars, 2);
    }
}
