use serde::{Deserialize, Serialize};

/// Pagination metadata attached to every paged listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };
        PageMeta {
            page,
            page_size,
            total,
            pages,
        }
    }
}

/// Envelope for paged listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub result: Vec<T>,
    pub meta: PageMeta,
}

/// Clamps a requested page/size pair to a usable (offset, limit) window.
/// Size is at least 1, page at least 0.
pub fn page_window(page: i64, size: i64) -> (i64, i64) {
    let limit = size.max(1);
    let offset = page.max(0) * limit;
    (offset, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps_degenerate_inputs() {
        assert_eq!(page_window(0, 10), (0, 10));
        assert_eq!(page_window(2, 25), (50, 25));
        assert_eq!(page_window(-3, 0), (0, 1));
    }

    #[test]
    fn page_meta_rounds_page_count_up() {
        let meta = PageMeta::new(0, 10, 31);
        assert_eq!(meta.pages, 4);
        assert_eq!(PageMeta::new(0, 10, 0).pages, 0);
        assert_eq!(PageMeta::new(0, 10, 30).pages, 3);
    }
}
