use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ContactQuery;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateQueryRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQueryStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryList {
    pub items: Vec<ContactQuery>,
}
