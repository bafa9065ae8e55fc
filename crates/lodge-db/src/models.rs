//! Database row types. These map directly to SQLite rows and stay separate
//! from the lodge-types API models so the DB layer has no HTTP concerns.
//! Ids are kept as the TEXT they are stored as.

use chrono::{DateTime, NaiveDate, Utc};
use lodge_types::models::BookingStatus;
use rusqlite::Row;
use rusqlite::types::Type;

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ListingRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub price_per_night: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct InventoryRow {
    pub id: String,
    pub listing_id: String,
    pub date: NaiveDate,
    pub nightly_price: i64,
    pub available: bool,
    pub booking_id: Option<String>,
}

#[derive(Debug)]
pub struct BookingRow {
    pub id: String,
    pub listing_id: String,
    pub guest_id: String,
    /// Owner of the booked listing.
    pub host_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    /// Nights whose inventory rows point at this booking. Empty once cancelled.
    pub dates: Vec<NaiveDate>,
}

pub(crate) const USER_COLUMNS: &str = "id, username, password, created_at";

pub(crate) const LISTING_COLUMNS: &str =
    "id, owner_id, title, description, price_per_night, currency, created_at, updated_at";

pub(crate) const INVENTORY_COLUMNS: &str =
    "id, listing_id, date, nightly_price, available, booking_id";

/// Bookings are always read joined with their listing (`b` and `l`).
pub(crate) const BOOKING_COLUMNS: &str = "b.id, b.listing_id, b.guest_id, l.owner_id, b.check_in, \
     b.check_out, b.total_price, l.currency, b.status, b.created_at";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl ListingRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            price_per_night: row.get(4)?,
            currency: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl InventoryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            listing_id: row.get(1)?,
            date: row.get(2)?,
            nightly_price: row.get(3)?,
            available: row.get(4)?,
            booking_id: row.get(5)?,
        })
    }
}

impl BookingRow {
    /// Maps a [`BOOKING_COLUMNS`] row; `dates` is filled in separately.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(8)?;
        let status = BookingStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                Type::Text,
                format!("unknown booking status '{status}'").into(),
            )
        })?;

        Ok(Self {
            id: row.get(0)?,
            listing_id: row.get(1)?,
            guest_id: row.get(2)?,
            host_id: row.get(3)?,
            check_in: row.get(4)?,
            check_out: row.get(5)?,
            total_price: row.get(6)?,
            currency: row.get(7)?,
            status,
            created_at: row.get(9)?,
            dates: Vec::new(),
        })
    }
}
