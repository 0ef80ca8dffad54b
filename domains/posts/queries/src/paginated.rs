use serde::{Deserialize, Serialize};

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: usize, page: u32, page_size: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        }
        else {
            total.div_ceil(page_size as usize) as u32
        };
        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool { self.page < self.total_pages }
}
