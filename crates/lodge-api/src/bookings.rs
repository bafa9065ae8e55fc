use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};
use uuid::Uuid;

use lodge_db::NewBooking;
use lodge_types::api::{BookingCreated, BookingResponse, CreateBookingRequest};
use lodge_types::stay::StayRange;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::session::AuthUser;
use crate::state::{AppState, with_db};

/// POST /bookings: Books `[checkIn, checkOut)` of a listing for the caller.
///
/// Returns `{ success: true, booking }` (201). Every failure, including a
/// missing session, comes back as `{ success: false, error }`.
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let range = StayRange::new(req.check_in, req.check_out)?;

    let booking_id = Uuid::new_v4();
    let listing_id = req.listing_id;
    let guest_id = user.id();
    let row = with_db(&state, move |db| {
        db.create_booking(&NewBooking {
            id: &booking_id.to_string(),
            listing_id: &listing_id.to_string(),
            guest_id: &guest_id.to_string(),
            range,
        })
    })
    .await
    .map_err(|e| match e {
        ApiError::Unavailable => {
            warn!(
                "Booking rejected for {}: listing {} unavailable {}..{}",
                guest_id, listing_id, req.check_in, req.check_out
            );
            ApiError::Unavailable
        }
        ApiError::Internal(_) => ApiError::Internal("Failed to create booking"),
        e => e,
    })?;

    info!("{} booked listing {} ({})", user.0.username, listing_id, booking_id);
    Ok((
        StatusCode::CREATED,
        Json(BookingCreated::new(convert::booking(row))),
    ))
}

/// GET /bookings: The caller's bookings as a guest.
pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let guest_id = user.id().to_string();
    let rows = with_db(&state, move |db| db.bookings_for_guest(&guest_id)).await?;
    Ok(Json(rows.into_iter().map(convert::booking).collect()))
}

/// GET /bookings/{booking_id}: Visible to the guest and the listing's host.
pub async fn get_booking(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<Uuid>,
    user: AuthUser,
) -> Result<Json<BookingResponse>, ApiError> {
    let caller = user.id().to_string();
    let row = with_db(&state, move |db| db.get_booking(&booking_id.to_string()))
        .await?
        .filter(|b| b.guest_id == caller || b.host_id == caller)
        .ok_or(ApiError::NotFound("booking"))?;
    Ok(Json(convert::booking(row)))
}

/// POST /bookings/{booking_id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<Uuid>,
    user: AuthUser,
) -> Result<Json<BookingResponse>, ApiError> {
    let caller = user.id().to_string();
    let row = with_db(&state, move |db| db.cancel_booking(&booking_id.to_string(), &caller)).await?;
    Ok(Json(convert::booking(row)))
}

/// GET /listings/{listing_id}/bookings: Host view of a listing's bookings.
pub async fn listing_bookings(
    State(state): State<AppState>,
    ApiPath(listing_id): ApiPath<Uuid>,
    user: AuthUser,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let owner_id = user.id().to_string();
    let rows = with_db(&state, move |db| {
        db.bookings_for_listing(&listing_id.to_string(), &owner_id)
    })
    .await?;
    Ok(Json(rows.into_iter().map(convert::booking).collect()))
}
