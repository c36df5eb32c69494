//! Route handlers grouped by resource.

pub mod appointments;
pub mod audit;
pub mod auth;
pub mod batch;
pub mod employees;
pub mod services;
pub mod users;

use pathlab_core::repository::{PaginatedResult, Pagination};
use serde::{Deserialize, Serialize};

/// Offset/limit query parameters shared by list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        let default = Pagination::default();
        Pagination {
            offset: query.offset.unwrap_or(default.offset),
            limit: query.limit.unwrap_or(default.limit),
        }
    }
}

/// Serializable page envelope for list responses.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> From<PaginatedResult<T>> for ListResponse<T> {
    fn from(page: PaginatedResult<T>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

impl<T> ListResponse<T> {
    pub fn map<U>(page: PaginatedResult<T>, f: impl FnMut(T) -> U) -> ListResponse<U> {
        ListResponse {
            items: page.items.into_iter().map(f).collect(),
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}
