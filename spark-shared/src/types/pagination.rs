use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

const MAX_PER_PAGE: u64 = 100;

impl PaginationParams {
    /// Saturates instead of overflowing for absurd page numbers.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// `offset()` as a SQL `OFFSET`, never negative.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }

    pub fn sql_limit(&self) -> i64 {
        self.limit() as i64
    }

    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// Same params with `per_page` further capped, for endpoints with a tighter limit.
    pub fn capped(&self, max_per_page: u64) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.min(max_per_page.max(1)),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        let total_pages = if total == 0 { 0 } else { total.div_ceil(per_page) };
        Self {
            items,
            total,
            page: params.page.max(1),
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_zero_offset() {
        let params = PaginationParams::default();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        let params = PaginationParams { page: 0, per_page: 10 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn per_page_is_clamped() {
        let params = PaginationParams { page: 3, per_page: 500 };
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 200);

        let zero = PaginationParams { page: 1, per_page: 0 };
        assert_eq!(zero.limit(), 1);
    }

    #[test]
    fn huge_page_saturates() {
        let params = PaginationParams { page: u64::MAX, per_page: 20 }.capped(50);
        assert_eq!(params.offset(), u64::MAX);
        assert_eq!(params.sql_offset(), i64::MAX);

        let params = PaginationParams { page: 500_000_000_000_000_000, per_page: 20 };
        assert!(params.sql_offset() > 0);
        assert_eq!(params.sql_offset(), i64::MAX);
    }

    #[test]
    fn sql_values_match_for_normal_pages() {
        let params = PaginationParams { page: 4, per_page: 25 };
        assert_eq!(params.sql_offset(), 75);
        assert_eq!(params.sql_limit(), 25);
    }

    #[test]
    fn capped_tightens_limit() {
        let params = PaginationParams { page: 2, per_page: 80 }.capped(50);
        assert_eq!(params.limit(), 50);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams { page: 1, per_page: 20 };
        let page: Paginated<u8> = Paginated::new(vec![], 41, &params);
        assert_eq!(page.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}
