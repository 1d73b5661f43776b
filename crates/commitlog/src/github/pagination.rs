//! Link header pagination.
//!
//! GitHub advertises pagination through the `Link` response header:
//! `<https://api.github.com/repos/o/r/commits?per_page=100&page=2>; rel="next", <...&page=7>; rel="last"`.
//! The fetcher only needs the last page; every intermediate URL is derived
//! from the `rel="last"` URL by rewriting its `page` parameter.

use url::Url;

/// Pagination information extracted from a Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// The last page number (from rel="last").
    pub last_page: Option<u32>,
    /// The next page number (from rel="next").
    pub next_page: Option<u32>,
    /// The full rel="last" URL.
    pub last_url: Option<String>,
}

impl LinkPagination {
    /// Returns the total number of pages if known.
    pub fn total_pages(&self) -> Option<u32> {
        self.last_page
    }

    /// URLs for pages `2..=last`, in page order.
    ///
    /// Empty when there is no rel="last" link or it points at page 1.
    pub fn remaining_page_urls(&self) -> Vec<String> {
        let (Some(last_url), Some(last_page)) = (self.last_url.as_deref(), self.last_page) else {
            return Vec::new();
        };
        (2..=last_page)
            .filter_map(|page| with_page(last_url, page))
            .collect()
    }
}

/// Parse the Link header to extract pagination info.
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment
                .strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
            {
                url = Some(inner);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        let (Some(url), Some(rel)) = (url, rel) else {
            continue;
        };
        let Some(page) = extract_page_from_url(url) else {
            continue;
        };
        match rel {
            "last" => {
                info.last_page = Some(page);
                info.last_url = Some(url.to_string());
            }
            "next" => info.next_page = Some(page),
            _ => {}
        }
    }

    info
}

/// Extract the `page` query parameter from a URL.
pub fn extract_page_from_url(url: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Rewrite the `page` parameter of `url`, leaving every other parameter
/// (including `per_page`) untouched.
pub fn with_page(url: &str, page: u32) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            if k == "page" {
                (k.into_owned(), page.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    Some(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.github.com/repositories/1296269/commits";

    #[test]
    fn test_parse_link_header_full() {
        let header = format!(
            r#"<{BASE}?per_page=100&page=2>; rel="next", <{BASE}?per_page=100&page=3>; rel="last""#
        );

        let info = parse_link_header(&header);
        assert_eq!(info.next_page, Some(2));
        assert_eq!(info.last_page, Some(3));
        assert_eq!(info.total_pages(), Some(3));
        assert_eq!(
            info.last_url.as_deref(),
            Some(format!("{BASE}?per_page=100&page=3").as_str())
        );
    }

    #[test]
    fn test_parse_link_header_on_middle_page() {
        let header = format!(
            r#"<{BASE}?page=1>; rel="prev", <{BASE}?page=5>; rel="next", <{BASE}?page=9>; rel="last", <{BASE}?page=1>; rel="first""#
        );
        let info = parse_link_header(&header);
        assert_eq!(info.next_page, Some(5));
        assert_eq!(info.last_page, Some(9));
    }

    #[test]
    fn test_parse_link_header_without_last() {
        let header = format!(r#"<{BASE}?per_page=100&page=2>; rel="next""#);
        let info = parse_link_header(&header);
        assert_eq!(info.next_page, Some(2));
        assert_eq!(info.last_page, None);
        assert!(info.remaining_page_urls().is_empty());
    }

    #[test]
    fn test_parse_link_header_empty_and_garbage() {
        assert_eq!(parse_link_header(""), LinkPagination::default());
        assert_eq!(parse_link_header("garbage"), LinkPagination::default());
        assert_eq!(
            parse_link_header(r#"<not a url>; rel="last""#),
            LinkPagination::default()
        );
    }

    #[test]
    fn test_extract_page_from_url() {
        assert_eq!(extract_page_from_url(&format!("{BASE}?page=5")), Some(5));
        assert_eq!(
            extract_page_from_url(&format!("{BASE}?per_page=100&page=3")),
            Some(3)
        );
        assert_eq!(extract_page_from_url(&format!("{BASE}?per_page=100")), None);
        assert_eq!(extract_page_from_url(&format!("{BASE}?page=abc")), None);
    }

    #[test]
    fn remaining_urls_rewrite_only_page_parameter() {
        let header = format!(r#"<{BASE}?author=a&per_page=100&page=100>; rel="last""#);
        let urls = parse_link_header(&header).remaining_page_urls();

        assert_eq!(urls.len(), 99);
        assert_eq!(urls[0], format!("{BASE}?author=a&per_page=100&page=2"));
        assert_eq!(urls[98], format!("{BASE}?author=a&per_page=100&page=100"));
        assert!(urls.iter().all(|u| u.contains("per_page=100")));
    }

    #[test]
    fn remaining_urls_empty_for_single_page() {
        let header = format!(r#"<{BASE}?page=1>; rel="last""#);
        assert!(parse_link_header(&header).remaining_page_urls().is_empty());
    }
}
