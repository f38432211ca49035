mod dto;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod seed;
pub mod services;
#[cfg(test)]
mod test_support;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
