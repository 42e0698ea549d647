//! Product and collection pickers for the coupon form.

use axum::Json;
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::ShopSession;
use crate::shopify::CatalogItem;

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<CatalogItem>,
}

#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub success: bool,
    pub collections: Vec<CatalogItem>,
}

/// GET /api/products
pub async fn products(session: ShopSession) -> Result<Json<ProductsResponse>, AppError> {
    let products = session.admin.products().await?;
    Ok(Json(ProductsResponse {
        success: true,
        products,
    }))
}

/// GET /api/collections
pub async fn collections(session: ShopSession) -> Result<Json<CollectionsResponse>, AppError> {
    let collections = session.admin.collections().await?;
    Ok(Json(CollectionsResponse {
        success: true,
        collections,
    }))
}
