//! Listing query model
//!
//! Filter, sort and pagination values that together form the query key of a
//! listing request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// FILTER VALUES
// ============================================================================

/// Tri-state featured filter. `Unset` means no filtering at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Featured {
    #[default]
    Unset,
    Only,
    Excluded,
}

impl Featured {
    pub fn as_param(&self) -> &'static str {
        match self {
            Featured::Unset => "",
            Featured::Only => "true",
            Featured::Excluded => "false",
        }
    }

    /// Unset -> Only -> Excluded -> Unset
    pub fn cycle(self) -> Self {
        match self {
            Featured::Unset => Featured::Only,
            Featured::Only => Featured::Excluded,
            Featured::Excluded => Featured::Unset,
        }
    }
}

impl FromStr for Featured {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Featured::Unset),
            "true" => Ok(Featured::Only),
            "false" => Ok(Featured::Excluded),
            other => Err(format!("invalid featured filter '{}' (expected true, false or all)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    CreatedAt,
    Title,
    FileSize,
}

impl SortBy {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "createdAt",
            SortBy::Title => "title",
            SortBy::FileSize => "fileSize",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortBy::CreatedAt => SortBy::Title,
            SortBy::Title => SortBy::FileSize,
            SortBy::FileSize => SortBy::CreatedAt,
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortBy::CreatedAt),
            "title" => Ok(SortBy::Title),
            "fileSize" => Ok(SortBy::FileSize),
            other => Err(format!("invalid sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("invalid sort order '{}'", other)),
        }
    }
}

impl fmt::Display for Featured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Featured::Unset => "all images",
            Featured::Only => "featured only",
            Featured::Excluded => "not featured",
        };
        f.write_str(label)
    }
}

// ============================================================================
// FILTER CRITERIA
// ============================================================================

/// Complete filter set. Always replaced wholesale, never patched.
/// `Default` is the cleared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub category: String,
    pub tags: String,
    pub featured: Featured,
    pub search: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

// ============================================================================
// PAGINATION
// ============================================================================

/// `page`/`limit` are chosen by the client; `total`/`total_pages` come from
/// the server and are overwritten on every successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl PaginationState {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// The pagination bar is only shown when there is more than one page.
    pub fn shows_controls(&self) -> bool {
        self.total_pages > 1
    }
}

// ============================================================================
// QUERY KEY
// ============================================================================

/// Everything that determines a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: FilterCriteria,
}

impl ListQuery {
    /// Query string pairs in wire order. Empty filter fields are kept; the
    /// backend treats them as "no filter".
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("category", self.filters.category.clone()),
            ("tags", self.filters.tags.clone()),
            ("featured", self.filters.featured.as_param().to_string()),
            ("search", self.filters.search.clone()),
            ("sortBy", self.filters.sort_by.as_param().to_string()),
            ("sortOrder", self.filters.sort_order.as_param().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_filters() {
        let filters = FilterCriteria::default();
        assert_eq!(filters.category, "");
        assert_eq!(filters.tags, "");
        assert_eq!(filters.featured.as_param(), "");
        assert_eq!(filters.search, "");
        assert_eq!(filters.sort_by.as_param(), "createdAt");
        assert_eq!(filters.sort_order.as_param(), "desc");
    }

    #[test]
    fn test_params_keep_empty_fields() {
        let query = ListQuery {
            page: 1,
            limit: 12,
            filters: FilterCriteria {
                category: "nature".to_string(),
                ..FilterCriteria::default()
            },
        };

        let encoded: Vec<String> = query
            .to_params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        assert_eq!(
            encoded.join("&"),
            "page=1&limit=12&category=nature&tags=&featured=&search=&sortBy=createdAt&sortOrder=desc"
        );
    }

    #[test]
    fn test_featured_parse_and_cycle() {
        assert_eq!("true".parse::<Featured>().unwrap(), Featured::Only);
        assert_eq!("false".parse::<Featured>().unwrap(), Featured::Excluded);
        assert_eq!("".parse::<Featured>().unwrap(), Featured::Unset);
        assert!("yes".parse::<Featured>().is_err());

        assert_eq!(Featured::Unset.cycle(), Featured::Only);
        assert_eq!(Featured::Excluded.cycle(), Featured::Unset);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("fileSize".parse::<SortBy>().unwrap(), SortBy::FileSize);
        assert!("size".parse::<SortBy>().is_err());
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::Asc.toggle(), SortOrder::Desc);
    }

    #[test]
    fn test_pagination_boundaries() {
        let mut p = PaginationState {
            page: 1,
            limit: 12,
            total: 30,
            total_pages: 3,
        };
        assert!(!p.has_previous());
        assert!(p.has_next());
        assert!(p.shows_controls());

        p.page = 3;
        assert!(p.has_previous());
        assert!(!p.has_next());

        let single = PaginationState {
            total_pages: 1,
            ..p
        };
        assert!(!single.shows_controls());
    }

    #[test]
    fn test_pagination_wire_format() {
        let p: PaginationState =
            serde_json::from_str(r#"{"page":2,"limit":12,"total":30,"totalPages":3}"#).unwrap();
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
    }
}
