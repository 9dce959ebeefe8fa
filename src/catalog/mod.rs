pub mod dto;
pub mod handlers;
mod types;

pub use types::{Catalog, CoffeeType, UnknownCoffeeType};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
