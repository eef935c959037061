use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Booking, BookingItem};

/// Checkout payload. `unit_price` and `total` are taken as submitted;
/// the booking path does not re-price against the catalog.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub governorate: String,
    pub area: String,
    pub address_line: Option<String>,
    pub payment_method: String,
    pub total: i64,
    pub items: Vec<BookingLineInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookingLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingWithItems {
    pub booking: Booking,
    pub items: Vec<BookingItem>,
}
