use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Invoice, InvoiceItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvoiceLineInput {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
}

/// Standalone invoice creation. Rates are whole percents; subtotal, tax
/// and total are always recomputed server-side from the lines.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub billing_address: String,
    pub discount_rate: Option<i64>,
    pub tax_rate: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<InvoiceLineInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub billing_address: Option<String>,
    pub discount_rate: Option<i64>,
    pub tax_rate: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceList {
    pub items: Vec<Invoice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceWithItems {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}
