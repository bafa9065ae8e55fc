use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use lodge_db::{ListingChanges, NewListing};
use lodge_types::api::{CreateListingRequest, ListingResponse, UpdateListingRequest};

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::session::AuthUser;
use crate::state::{AppState, with_db};

const MAX_TITLE_CHARS: usize = 120;
const MAX_DESCRIPTION_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validate_title(&req.title)?;
    validate_description(&req.description)?;
    let currency = validate_currency(&req.currency)?;
    let price_per_night = validate_price(req.price_per_night)?;

    let listing_id = Uuid::new_v4();
    let owner_id = user.id();
    let description = req.description;
    let row = with_db(&state, move |db| {
        db.create_listing(&NewListing {
            id: &listing_id.to_string(),
            owner_id: &owner_id.to_string(),
            title: &title,
            description: &description,
            price_per_night,
            currency: &currency,
        })
    })
    .await?;

    info!("Listing {} created by {}", listing_id, owner_id);
    Ok((StatusCode::CREATED, Json(convert::listing(row))))
}

pub async fn get_listing(
    State(state): State<AppState>,
    ApiPath(listing_id): ApiPath<Uuid>,
) -> Result<Json<ListingResponse>, ApiError> {
    let row = with_db(&state, move |db| db.get_listing(&listing_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("listing"))?;
    Ok(Json(convert::listing(row)))
}

pub async fn list_listings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let rows = with_db(&state, move |db| db.list_listings(limit, query.offset)).await?;
    Ok(Json(rows.into_iter().map(convert::listing).collect()))
}

pub async fn my_listings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    let owner_id = user.id().to_string();
    let rows = with_db(&state, move |db| db.listings_for_owner(&owner_id)).await?;
    Ok(Json(rows.into_iter().map(convert::listing).collect()))
}

pub async fn update_listing(
    State(state): State<AppState>,
    ApiPath(listing_id): ApiPath<Uuid>,
    user: AuthUser,
    ApiJson(req): ApiJson<UpdateListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    let title = req.title.as_deref().map(validate_title).transpose()?;
    if let Some(description) = &req.description {
        validate_description(description)?;
    }
    let currency = req.currency.as_deref().map(validate_currency).transpose()?;
    let price_per_night = req.price_per_night.map(validate_price).transpose()?;
    let description = req.description;

    let owner_id = user.id().to_string();
    let row = with_db(&state, move |db| {
        db.update_listing(
            &listing_id.to_string(),
            &owner_id,
            &ListingChanges {
                title: title.as_deref(),
                description: description.as_deref(),
                price_per_night,
                currency: currency.as_deref(),
            },
        )
    })
    .await?;

    Ok(Json(convert::listing(row)))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    ApiPath(listing_id): ApiPath<Uuid>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    let owner_id = user.id().to_string();
    with_db(&state, move |db| db.delete_listing(&listing_id.to_string(), &owner_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::Validation(format!(
            "title must be 1 to {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ApiError::Validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

/// Three ASCII letters, normalized to upper case.
fn validate_currency(currency: &str) -> Result<String, ApiError> {
    let currency = currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::Validation(
            "currency must be a three-letter code".into(),
        ));
    }
    Ok(currency.to_ascii_uppercase())
}

pub(crate) fn validate_price(price: u64) -> Result<i64, ApiError> {
    i64::try_from(price).map_err(|_| ApiError::Validation("price is out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_currency() {
        assert_eq!(validate_currency(" usd ").unwrap(), "USD");
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("U5D").is_err());
    }

    #[test]
    fn trims_and_bounds_title() {
        assert_eq!(validate_title("  Cabin  ").unwrap(), "Cabin");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_CHARS + 1)).is_err());
    }

    #[test]
    fn price_must_fit_storage() {
        assert_eq!(validate_price(100).unwrap(), 100);
        assert!(validate_price(u64::MAX).is_err());
    }
}
