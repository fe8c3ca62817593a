use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// 201 with the created row.
    pub fn created(data: T) -> (StatusCode, Self) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

impl PaginationQuery {
    /// `(page, per_page)` with page >= 1 and per_page in 1..=100.
    pub fn resolve(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok(7)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "data": 7, "message": null})
        );
    }

    #[test]
    fn created_is_201() {
        let (status, resp) = ApiResponse::created("row");
        assert_eq!(status, StatusCode::CREATED);
        assert!(resp.success);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginatedResponse::<i32>::new(vec![], 101, 1, 20).total_pages, 6);
        assert_eq!(PaginatedResponse::<i32>::new(vec![], 60, 1, 20).total_pages, 3);
        assert_eq!(PaginatedResponse::<i32>::new(vec![], 0, 1, 20).total_pages, 0);
        assert_eq!(PaginatedResponse::<i32>::new(vec![], 10, 1, 0).total_pages, 0);
    }

    #[test]
    fn resolve_defaults() {
        let q = PaginationQuery {
            page: None,
            per_page: None,
        };
        assert_eq!(q.resolve(), (1, 20));
    }

    #[test]
    fn resolve_clamps_out_of_range() {
        let q = PaginationQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(q.resolve(), (1, 100));
    }
}
