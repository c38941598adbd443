use serde::{Deserialize, Serialize};

use super::value_objects::{OrderStatus, OrderType};

// ============================================================================
// Paging - envelope returned by list endpoints and the query that produced it
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn empty(size: u32) -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            number: 0,
            size,
            first: true,
            last: true,
        }
    }

    /// Slice `items` into the page described by `query`
    pub fn from_slice(items: &[T], query: &PageQuery) -> Self
    where
        T: Clone,
    {
        let size = query.size.max(1);
        let total_elements = items.len() as u64;
        let total_pages = items.len().div_ceil(size as usize) as u32;
        let start = (query.page as usize).saturating_mul(size as usize);
        let content = items.iter().skip(start).take(size as usize).cloned().collect();

        Self {
            content,
            total_elements,
            total_pages,
            number: query.page,
            size,
            first: query.page == 0,
            last: query.page.saturating_add(1) >= total_pages,
        }
    }
}

/// Page index, size and optional filters for an order listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl PageQuery {
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size,
            order_type: None,
            status: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_middle_page() {
        let items: Vec<u32> = (0..25).collect();
        let page = Page::from_slice(&items, &PageQuery::new(10).with_page(1));

        assert_eq!(page.content, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);
    }

    #[test]
    fn test_from_slice_last_page() {
        let items: Vec<u32> = (0..25).collect();
        let page = Page::from_slice(&items, &PageQuery::new(10).with_page(2));

        assert_eq!(page.content.len(), 5);
        assert!(page.last);
    }

    #[test]
    fn test_page_index_past_the_end() {
        let items: Vec<u32> = (0..5).collect();
        let page = Page::from_slice(&items, &PageQuery::new(10).with_page(u32::MAX));

        assert!(page.content.is_empty());
        assert_eq!(page.number, u32::MAX);
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn test_page_envelope_wire_format() {
        let json = r#"{"content":[1,2],"totalElements":2,"totalPages":1,"first":true,"last":true}"#;
        let page: Page<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(page.content, vec![1, 2]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.number, 0);
    }
}
