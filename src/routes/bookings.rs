use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::bookings::CreateBookingRequest,
    error::AppResult,
    models::Booking,
    response::ApiResponse,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_booking))
}

#[utoipa::path(
    post,
    path = "/api/booking",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Create booking (public checkout)", body = ApiResponse<Booking>),
        (status = 400, description = "Missing customer/delivery fields or empty items")
    ),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::create_booking(&state, payload).await?;
    Ok(Json(resp))
}
