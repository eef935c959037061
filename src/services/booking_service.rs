use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{BookingLineInput, CreateBookingRequest},
    entity::{
        booking_items::{ActiveModel as BookingItemActive, Model as BookingItemModel},
        bookings::{ActiveModel as BookingActive, Model as BookingModel},
    },
    error::{AppError, AppResult},
    models::{Booking, BookingItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const BOOKING_STATUSES: [&str; 3] = ["pending", "confirmed", "cancelled"];

/// Public checkout. Prices and the grand total are taken as submitted;
/// only presence and shape are validated here.
pub async fn create_booking(
    state: &AppState,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    validate_booking(&payload)?;

    let txn = state.orm.begin().await?;

    let booking_id = Uuid::new_v4();
    let reference = booking_reference(booking_id);

    let booking = BookingActive {
        id: Set(booking_id),
        reference: Set(reference),
        customer_name: Set(payload.customer_name),
        customer_email: Set(payload.customer_email),
        customer_phone: Set(payload.customer_phone),
        governorate: Set(payload.governorate),
        area: Set(payload.area),
        address_line: Set(payload.address_line),
        payment_method: Set(payload.payment_method),
        status: Set("pending".into()),
        total: Set(payload.total),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &payload.items {
        BookingItemActive {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "booking_create",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id, "reference": booking.reference })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    // Items are not re-fetched; the checkout response carries the parent only.
    Ok(ApiResponse::success(
        "Booking created",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

fn validate_booking(payload: &CreateBookingRequest) -> Result<(), AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest("customer_name is required".into()));
    }
    if payload.customer_phone.trim().is_empty() {
        return Err(AppError::BadRequest("customer_phone is required".into()));
    }
    if payload.governorate.trim().is_empty() {
        return Err(AppError::BadRequest("governorate is required".into()));
    }
    if payload.area.trim().is_empty() {
        return Err(AppError::BadRequest("area is required".into()));
    }
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }
    for line in &payload.items {
        validate_line(line)?;
    }
    Ok(())
}

fn validate_line(line: &BookingLineInput) -> Result<(), AppError> {
    if line.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }
    if line.unit_price < 0 {
        return Err(AppError::BadRequest("unit_price must not be negative".into()));
    }
    Ok(())
}

pub fn validate_booking_status(status: &str) -> Result<(), AppError> {
    if BOOKING_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid booking status".into()))
    }
}

/// The display number is the record's own key, shortened.
pub fn booking_reference(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("BK-{}", hex[..8].to_uppercase())
}

pub(crate) fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        reference: model.reference,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        governorate: model.governorate,
        area: model.area,
        address_line: model.address_line,
        payment_method: model.payment_method,
        status: model.status,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn booking_item_from_entity(model: BookingItemModel) -> BookingItem {
    BookingItem {
        id: model.id,
        booking_id: model.booking_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_prefixed_short_key() {
        let id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(booking_reference(id), "BK-A1B2C3D4");
    }

    #[test]
    fn status_set_is_closed() {
        assert!(validate_booking_status("pending").is_ok());
        assert!(validate_booking_status("confirmed").is_ok());
        assert!(validate_booking_status("cancelled").is_ok());
        assert!(validate_booking_status("shipped").is_err());
        assert!(validate_booking_status("").is_err());
    }
}
