//! 分页参数与分页响应
//! Pagination query params and paged response envelope

use serde::{Deserialize, Serialize};

/// 默认页码 / Default page number
pub const DEFAULT_PAGE: i64 = 1;
/// 默认每页条数 / Default page size
pub const DEFAULT_PAGE_SIZE: i64 = 5;
/// 每页条数上限 / Page size ceiling
pub const MAX_PAGE_SIZE: i64 = 100;

/// 分页查询参数，来自 query string
/// Pagination query params, deserialized from the query string
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// 规范化后的页码，最小为 1
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE)
    }

    /// 规范化后的每页条数，范围 [1, MAX_PAGE_SIZE]
    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    /// SQL OFFSET
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }

    /// SQL LIMIT
    pub fn limit(&self) -> i64 {
        self.page_size()
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: None,
            page_size: None,
        }
    }
}

/// 分页响应信封 / Paged response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

impl<T> Paged<T> {
    pub fn new(data: Vec<T>, total: i64, query: &PageQuery) -> Self {
        Self {
            data,
            total,
            page: query.page(),
            page_size: query.page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), 5);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_offset_math() {
        let q = PageQuery {
            page: Some(3),
            page_size: Some(10),
        };
        assert_eq!(q.offset(), 20);
        assert_eq!(q.limit(), 10);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let q = PageQuery {
            page: Some(0),
            page_size: Some(-2),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), 5);
    }

    #[test]
    fn test_page_size_is_capped() {
        let q = PageQuery {
            page: Some(1),
            page_size: Some(10_000),
        };
        assert_eq!(q.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_envelope_serialization() {
        let q = PageQuery {
            page: Some(2),
            page_size: Some(5),
        };
        let paged = Paged::new(vec![1, 2, 3], 13, &q);
        let v = serde_json::to_value(&paged).unwrap();
        assert_eq!(v["total"], 13);
        assert_eq!(v["page"], 2);
        assert_eq!(v["pageSize"], 5);
        assert_eq!(v["data"].as_array().unwrap().len(), 3);
    }
}
