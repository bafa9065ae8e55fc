use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use lodge_db::InventoryUpdate;
use lodge_types::api::{InventoryDayResponse, SetInventoryRequest};
use lodge_types::stay::StayRange;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::listings::validate_price;
use crate::session::AuthUser;
use crate::state::{AppState, with_db};

/// Calendar window `[from, to)`.
#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /listings/{listing_id}/inventory?from=..&to=..: Public calendar.
pub async fn get_inventory(
    State(state): State<AppState>,
    ApiPath(listing_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<InventoryQuery>,
) -> Result<Json<Vec<InventoryDayResponse>>, ApiError> {
    let range = StayRange::new(query.from, query.to)?;
    let rows = with_db(&state, move |db| db.inventory(&listing_id.to_string(), &range)).await?;
    Ok(Json(rows.into_iter().map(convert::inventory_day).collect()))
}

/// PUT /listings/{listing_id}/inventory: Host sets price/availability for a range.
pub async fn set_inventory(
    State(state): State<AppState>,
    ApiPath(listing_id): ApiPath<Uuid>,
    user: AuthUser,
    ApiJson(req): ApiJson<SetInventoryRequest>,
) -> Result<Json<Vec<InventoryDayResponse>>, ApiError> {
    let update = InventoryUpdate {
        range: StayRange::new(req.from, req.to)?,
        nightly_price: req.nightly_price.map(validate_price).transpose()?,
        available: req.available,
    };

    let owner_id = user.id().to_string();
    let rows = with_db(&state, move |db| {
        db.set_inventory(&listing_id.to_string(), &owner_id, &update)
    })
    .await?;

    Ok(Json(rows.into_iter().map(convert::inventory_day).collect()))
}
