use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, ProductImage};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ImageInput {
    pub url: String,
    pub public_id: String,
}

/// `images`, when present, replaces the whole image set for the product.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub images: Option<Vec<ImageInput>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithImages {
    pub product: Product,
    pub images: Vec<ProductImage>,
}
