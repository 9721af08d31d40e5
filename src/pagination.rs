// src/pagination.rs
use serde::Serialize;

/// Opakowanie dla odpowiedzi stronicowanych.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub per_page: i64,
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_items: i64, limit: i64, offset: i64) -> Self {
        let per_page = limit.max(1);
        let total_pages = (total_items + per_page - 1) / per_page;
        let current_page = offset / per_page + 1;

        PaginatedResponse {
            total_items,
            total_pages,
            current_page,
            per_page,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_pages_from_limit_and_offset() {
        let page: PaginatedResponse<i32> = PaginatedResponse::new(vec![1, 2, 3], 25, 10, 20);

        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.per_page, 10);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 0, 10, 0);

        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current_page, 1);
    }
}
