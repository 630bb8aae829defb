//! Business operations, called by the HTTP handlers and the CLI commands.

pub mod ingredient_service;
pub mod membership_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod subscription_service;
pub mod tag_service;
pub mod user_service;

/// Who is performing a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub is_admin: bool,
}

impl Actor {
    /// Authors manage their own content, admins manage everything
    pub fn can_manage(&self, owner_id: i32) -> bool {
        self.is_admin || self.user_id == owner_id
    }
}

/// Largest page size a client may ask for
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page number served, keeps the row offset within SQLite's i64
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        Self {
            page: page.filter(|&p| p > 0).unwrap_or(1).min(MAX_PAGE),
            limit: limit
                .filter(|&l| l > 0)
                .unwrap_or(default_limit)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Zero-based index for sea-orm paginators
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

/// One page of results with the total row count
#[derive(Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
