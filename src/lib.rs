pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

pub use db::Store;
pub use error::{AppError, AppResult};
pub use response::{ApiResponse, PaginatedResponse, PaginationQuery};
