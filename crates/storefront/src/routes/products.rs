//! Product catalog route handlers.

use axum::{Json, extract::State};

use crate::db::products::ProductRepository;
use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

/// `GET /products`
///
/// Public product listing, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}
