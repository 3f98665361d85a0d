//! `Link` header pagination (RFC 5988) as returned by the factory API.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::PagesInfo;

// <url>; rel="next"
static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="(\w+)""#).expect("link regex is valid"));

static MAX_ITEMS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]maxItems=(\d+)").expect("maxItems regex is valid"));

static SKIP_COUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]skipCount=(\d+)").expect("skipCount regex is valid"));

/// Parse a `Link` header into `rel -> url`.
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    LINK_REGEX
        .captures_iter(header)
        .map(|caps| (caps[2].to_string(), caps[1].to_string()))
        .collect()
}

fn query_number(regex: &Regex, url: &str) -> Option<u32> {
    regex.captures(url)?.get(1)?.as_str().parse().ok()
}

pub fn max_items_of(url: &str) -> Option<u32> {
    query_number(&MAX_ITEMS_REGEX, url)
}

pub fn skip_count_of(url: &str) -> Option<u32> {
    query_number(&SKIP_COUNT_REGEX, url)
}

/// Page number of a `skipCount` within pages of `max_items`, one-based.
pub fn page_number(skip_count: u32, max_items: u32) -> u32 {
    if max_items == 0 {
        return 1;
    }
    skip_count / max_items + 1
}

/// Derive pagination facts from the request window and the response links.
///
/// `countOfPages` comes from the `last` link; without it the total is unknown.
pub fn pages_info(max_items: u32, skip_count: u32, links: &HashMap<String, String>) -> PagesInfo {
    let count_of_pages = links.get("last").and_then(|url| {
        let max = max_items_of(url).unwrap_or(max_items);
        skip_count_of(url).map(|skip| page_number(skip, max))
    });
    PagesInfo {
        current_page_number: Some(page_number(skip_count, max_items)),
        count_of_pages,
    }
}

/// Build the `Link` header value a paginating server would answer with.
pub fn build_link_header(base_url: &str, total: usize, max_items: u32, skip_count: u32) -> String {
    let max = max_items.max(1) as usize;
    let skip = skip_count as usize;
    let last_skip = if total == 0 { 0 } else { (total - 1) / max * max };
    let sep = if base_url.contains('?') { '&' } else { '?' };
    let link = |skip: usize, rel: &str| {
        format!("<{base_url}{sep}skipCount={skip}&maxItems={max}>; rel=\"{rel}\"")
    };

    let mut parts = vec![link(0, "first")];
    if skip > 0 {
        parts.push(link(skip.saturating_sub(max), "prev"));
    }
    if skip + max < total {
        parts.push(link(skip + max, "next"));
    }
    parts.push(link(last_skip, "last"));
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = concat!(
        "<http://localhost/api/factory/find?creator.userId=u1&skipCount=0&maxItems=15>; rel=\"first\", ",
        "<http://localhost/api/factory/find?creator.userId=u1&skipCount=30&maxItems=15>; rel=\"next\", ",
        "<http://localhost/api/factory/find?creator.userId=u1&skipCount=60&maxItems=15>; rel=\"last\""
    );

    #[test]
    fn test_parse_link_header() {
        let links = parse_link_header(HEADER);
        assert_eq!(links.len(), 3);
        assert!(links["next"].contains("skipCount=30"));
        assert!(!links.contains_key("prev"));
    }

    #[test]
    fn test_parse_link_header_garbage() {
        assert!(parse_link_header("").is_empty());
        assert!(parse_link_header("not a link header").is_empty());
    }

    #[test]
    fn test_query_numbers() {
        let url = "http://x/api/factory/find?maxItems=15&skipCount=45";
        assert_eq!(max_items_of(url), Some(15));
        assert_eq!(skip_count_of(url), Some(45));
        assert_eq!(skip_count_of("http://x/api"), None);
    }

    #[test]
    fn test_pages_info_with_last_link() {
        let links = parse_link_header(HEADER);
        let info = pages_info(15, 15, &links);
        assert_eq!(info.current_page_number, Some(2));
        assert_eq!(info.count_of_pages, Some(5));
    }

    #[test]
    fn test_pages_info_without_last_link() {
        let info = pages_info(15, 0, &HashMap::new());
        assert_eq!(info.current_page_number, Some(1));
        assert_eq!(info.count_of_pages, None);
    }

    #[test]
    fn test_build_link_header_middle_page() {
        let header = build_link_header("http://h/api/factory/find?creator.userId=u", 12, 5, 5);
        let links = parse_link_header(&header);
        assert_eq!(skip_count_of(&links["first"]), Some(0));
        assert_eq!(skip_count_of(&links["prev"]), Some(0));
        assert_eq!(skip_count_of(&links["next"]), Some(10));
        assert_eq!(skip_count_of(&links["last"]), Some(10));
        assert_eq!(pages_info(5, 5, &links).count_of_pages, Some(3));
    }

    #[test]
    fn test_build_link_header_single_page() {
        let header = build_link_header("http://h/api/workspace", 3, 5, 0);
        let links = parse_link_header(&header);
        assert!(!links.contains_key("next"));
        assert!(!links.contains_key("prev"));
        assert_eq!(pages_info(5, 0, &links).count_of_pages, Some(1));
    }
}
