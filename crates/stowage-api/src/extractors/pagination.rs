//! Pagination query parameter extractor.

use serde::{Deserialize, Serialize};

use stowage_core::types::coerce;
use stowage_core::types::pagination::PageRequest;

/// Query parameters for paginated endpoints.
///
/// Query strings carry every value as text, so the numeric fields go
/// through the lenient coercion helpers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    #[serde(default, deserialize_with = "coerce::parse_number_opt")]
    pub page: Option<u64>,
    /// Items per page (default: 25, max: 100).
    #[serde(default, alias = "per_page", deserialize_with = "coerce::parse_number_opt")]
    pub page_size: Option<u64>,
    /// Free-text filter, where the endpoint supports one.
    #[serde(default, deserialize_with = "coerce::trim_string_opt")]
    pub search: Option<String>,
}

impl PaginationParams {
    /// Converts to a normalized `PageRequest`.
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_strings_are_coerced() {
        let params: PaginationParams =
            serde_json::from_value(serde_json::json!({"page": "3", "per_page": "500", "search": "  ann "}))
                .unwrap();
        let page = params.page_request();
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 100);
        assert_eq!(params.search.as_deref(), Some("ann"));
    }

    #[test]
    fn test_defaults() {
        let page = PaginationParams::default().page_request();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 25);
    }
}
