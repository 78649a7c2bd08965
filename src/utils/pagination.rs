use serde::Deserialize;
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,
    #[schema(example = 15)]
    pub per_page: Option<u32>,
}

/// One page cut out of an in-memory result.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: u32,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let page = self.page();
        let per_page = self.per_page();
        let total = items.len();
        let total_pages = total.div_ceil(per_page as usize) as u32;
        let offset = (page as usize - 1).saturating_mul(per_page as usize);

        Page {
            data: items.into_iter().skip(offset).take(per_page as usize).collect(),
            page,
            per_page,
            total,
            total_pages,
        }
    }
}
