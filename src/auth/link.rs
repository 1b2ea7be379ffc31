//! Parameter lookup in links the provider sends users back with.
//!
//! Values are percent-decoded but otherwise kept as they are: a `+` stays a
//! `+` and surrounding whitespace is not stripped, since tokens are opaque.

use url::form_urlencoded;

/// The query and fragment parts of a pasted link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LinkParts<'a> {
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> LinkParts<'a> {
    /// A string without `?` or a scheme is treated as a bare query string, so a
    /// pasted `access_token=...` works too.
    pub(crate) fn split(raw: &'a str) -> Self {
        let raw = raw.trim();
        let (before, fragment) = match raw.split_once('#') {
            Some((before, fragment)) => (before, Some(fragment)),
            None => (raw, None),
        };

        let query = match before.split_once('?') {
            Some((_, query)) => Some(query),
            None if !before.contains("://") && before.contains('=') => Some(before),
            None => None,
        };

        Self {
            query,
            fragment: fragment.map(fragment_query),
        }
    }

    /// Both parts, fragment first, for lookups where either may carry the value.
    pub(crate) fn fragment_then_query(&self) -> impl Iterator<Item = &'a str> {
        [self.fragment, self.query].into_iter().flatten()
    }
}

/// Hash-routed pages put a path in front of the fragment query
/// (`#/reset?access_token=...`). The prefix is only a route when it holds no `=`.
fn fragment_query(fragment: &str) -> &str {
    match fragment.split_once('?') {
        Some((route, query)) if !route.contains('=') => query,
        _ => fragment,
    }
}

/// First non-blank value of `name`, percent-decoded with `+` kept literal.
pub(crate) fn find_param(query: &str, name: &str) -> Option<String> {
    let query = query.replace('+', "%2B");
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == name && !value.trim().is_empty())
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_query_and_fragment() {
        let parts = LinkParts::split("https://x/page?a=1#b=2");
        assert_eq!(parts.query, Some("a=1"));
        assert_eq!(parts.fragment, Some("b=2"));
    }

    #[test]
    fn bare_query_string() {
        let parts = LinkParts::split(" a=1&b=2 ");
        assert_eq!(parts.query, Some("a=1&b=2"));
        assert_eq!(parts.fragment, None);
        assert_eq!(LinkParts::split("https://x/page").query, None);
    }

    #[test]
    fn hash_route_prefix_is_dropped() {
        assert_eq!(
            LinkParts::split("https://x/#/reset?access_token=DDD").fragment,
            Some("access_token=DDD")
        );
    }

    #[test]
    fn question_mark_inside_fragment_query_is_kept() {
        let parts = LinkParts::split("https://x/#access_token=CCC?x=1");
        assert_eq!(parts.fragment, Some("access_token=CCC?x=1"));
        assert_eq!(
            find_param(parts.fragment.unwrap_or_default(), "access_token"),
            Some("CCC?x=1".to_string())
        );
    }

    #[test]
    fn plus_signs_and_spaces_are_preserved() {
        assert_eq!(find_param("token=ab+cd", "token"), Some("ab+cd".to_string()));
        assert_eq!(find_param("token=ab%2Bcd", "token"), Some("ab+cd".to_string()));
        assert_eq!(find_param("token=%20ab", "token"), Some(" ab".to_string()));
    }

    #[test]
    fn blank_values_are_skipped() {
        assert_eq!(find_param("token=&token=x", "token"), Some("x".to_string()));
        assert_eq!(find_param("token=%20", "token"), None);
    }
}
