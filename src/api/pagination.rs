use crate::config::ApiConfig;
use serde::Serialize;

/// Clamped pagination window derived from `limit`/`offset` query params.
/// Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn from_query(limit: Option<i64>, offset: Option<i64>, api: &ApiConfig) -> Self {
        Self {
            limit: limit.unwrap_or(api.default_page_size).clamp(1, api.max_page_size),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiConfig {
        ApiConfig {
            default_page_size: 25,
            max_page_size: 100,
            max_upload_bytes: 1024,
        }
    }

    #[test]
    fn missing_params_use_defaults() {
        let page = Page::from_query(None, None, &api());
        assert_eq!(page, Page { limit: 25, offset: 0 });
    }

    #[test]
    fn oversized_limit_clamps_to_ceiling() {
        let page = Page::from_query(Some(10_000), None, &api());
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn non_positive_values_clamp_up() {
        let page = Page::from_query(Some(0), Some(-5), &api());
        assert_eq!(page, Page { limit: 1, offset: 0 });

        let page = Page::from_query(Some(-3), None, &api());
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn in_range_values_pass_through() {
        let page = Page::from_query(Some(50), Some(75), &api());
        assert_eq!(page, Page { limit: 50, offset: 75 });
    }
}
