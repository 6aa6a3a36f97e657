//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};

/// Default page size when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard cap on the page size a client may request
pub const MAX_PAGE_SIZE: usize = 1000;

/// Page size settings of a list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageSettings {
    pub fn new(default_page_size: usize, max_page_size: usize) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }
}

/// Ordering requested by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    /// Parse `field` or `-field`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// Everything a list request asks of the query pipeline
///
/// # Example
/// ```text
/// GET /products?search=lamp&min_price=10&ordering=-price&page=2&page_size=12
/// GET /products?pagination=false
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Free-text term
    pub search: Option<String>,

    /// Raw `name=value` pairs, repeated names preserved in order
    pub filters: Vec<(String, String)>,

    pub ordering: Option<OrderBy>,

    /// False when the client disabled pagination
    pub paginate: bool,

    /// Page number (starts at 1)
    pub page: usize,

    pub page_size: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            search: None,
            filters: Vec::new(),
            ordering: None,
            paginate: true,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    /// Build a spec from query-string pairs
    ///
    /// Reserved names are `search`, `ordering`, `page`/`_page`,
    /// `page_size`/`_page_size` and `pagination`; everything else is kept
    /// as a filter candidate. Malformed paging values fall back to defaults
    /// and oversized pages are capped.
    pub fn from_pairs(pairs: &[(String, String)], settings: &PageSettings) -> Self {
        let mut spec = QuerySpec {
            page_size: settings.default_page_size,
            ..QuerySpec::default()
        };

        for (name, value) in pairs {
            match name.as_str() {
                "search" => {
                    let term = value.trim();
                    spec.search = (!term.is_empty()).then(|| term.to_string());
                }
                "ordering" => spec.ordering = OrderBy::parse(value),
                "page" | "_page" => {
                    spec.page = value.trim().parse::<usize>().ok().filter(|p| *p >= 1).unwrap_or(1);
                }
                "page_size" | "_page_size" => {
                    spec.page_size = value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|s| *s >= 1)
                        .map(|s| s.min(settings.max_page_size))
                        .unwrap_or(settings.default_page_size);
                }
                "pagination" => spec.paginate = !is_disabled_flag(value),
                _ => spec.filters.push((name.clone(), value.clone())),
            }
        }

        spec
    }

    /// Builder-style helpers, mostly for tests and internal callers
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((name.into(), value.into()));
        self
    }

    pub fn with_ordering(mut self, raw: &str) -> Self {
        self.ordering = OrderBy::parse(raw);
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.max(1);
        self
    }

    pub fn without_pagination(mut self) -> Self {
        self.paginate = false;
        self
    }

    /// All values supplied for a filter name, in order
    pub fn filter_values(&self, name: &str) -> Vec<&str> {
        self.filters
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

fn is_disabled_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

/// One page of a query result
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    /// Number of items after search and filter, before paging
    pub total_count: usize,
}

impl<T> PagedResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.total_count == 0 {
            0
        } else {
            self.total_count.div_ceil(self.page_size.max(1))
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub page: usize,
    pub page_size: usize,
    /// Total number of items (after search and filters)
    pub count: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub results: Vec<T>,
}

impl<T> From<PagedResult<T>> for PaginatedResponse<T> {
    fn from(result: PagedResult<T>) -> Self {
        Self {
            page: result.page,
            page_size: result.page_size,
            count: result.total_count,
            total_pages: result.total_pages(),
            has_next: result.has_next(),
            has_prev: result.has_prev(),
            results: result.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let spec = QuerySpec::from_pairs(&[], &PageSettings::new(12, 1000));
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, 12);
        assert!(spec.paginate);
        assert!(spec.search.is_none());
        assert!(spec.ordering.is_none());
    }

    #[test]
    fn test_reserved_names_and_filters() {
        let spec = QuerySpec::from_pairs(
            &pairs(&[
                ("search", " lamp "),
                ("ordering", "-price"),
                ("_page", "3"),
                ("_page_size", "5"),
                ("categories", "a"),
                ("categories", "b"),
            ]),
            &PageSettings::default(),
        );
        assert_eq!(spec.search.as_deref(), Some("lamp"));
        assert_eq!(
            spec.ordering,
            Some(OrderBy {
                field: "price".into(),
                descending: true
            })
        );
        assert_eq!(spec.page, 3);
        assert_eq!(spec.page_size, 5);
        assert_eq!(spec.filter_values("categories"), vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_paging_falls_back() {
        let spec = QuerySpec::from_pairs(
            &pairs(&[("page", "abc"), ("page_size", "-4")]),
            &PageSettings::default(),
        );
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);

        let spec = QuerySpec::from_pairs(
            &pairs(&[("page", "0"), ("page_size", "0")]),
            &PageSettings::default(),
        );
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_size_capped() {
        let spec = QuerySpec::from_pairs(&pairs(&[("page_size", "5000")]), &PageSettings::default());
        assert_eq!(spec.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_pagination_flag() {
        for v in ["false", "0", "no", "OFF"] {
            let spec = QuerySpec::from_pairs(&pairs(&[("pagination", v)]), &PageSettings::default());
            assert!(!spec.paginate, "{v} should disable pagination");
        }
        let spec = QuerySpec::from_pairs(&pairs(&[("pagination", "true")]), &PageSettings::default());
        assert!(spec.paginate);
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("-"), None);
        assert_eq!(OrderBy::parse(""), None);
        assert!(!OrderBy::parse("name").unwrap().descending);
    }

    #[test]
    fn test_paged_result_meta() {
        let result = PagedResult {
            items: vec![1],
            page: 3,
            page_size: 12,
            total_count: 25,
        };
        assert_eq!(result.total_pages(), 3);
        assert!(!result.has_next());
        assert!(result.has_prev());

        let response = PaginatedResponse::from(result.map(|n| n * 2));
        assert_eq!(response.count, 25);
        assert_eq!(response.results, vec![2]);
    }

    #[test]
    fn test_page_settings_clamps_default() {
        let settings = PageSettings::new(50, 10);
        assert_eq!(settings.default_page_size, 10);
    }
}
