use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::info;

use crate::models::{LISTING_COLUMNS, ListingRow};
use crate::{Database, DbError, Result};

pub struct NewListing<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub price_per_night: i64,
    pub currency: &'a str,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Default)]
pub struct ListingChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price_per_night: Option<i64>,
    pub currency: Option<&'a str>,
}

impl Database {
    pub fn create_listing(&self, new: &NewListing<'_>) -> Result<ListingRow> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO listings
                    (id, owner_id, title, description, price_per_night, currency, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    new.id,
                    new.owner_id,
                    new.title,
                    new.description,
                    new.price_per_night,
                    new.currency,
                    now
                ],
            )?;
            query_listing(conn, new.id)?.ok_or(DbError::NotFound("listing"))
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| query_listing(conn, id))
    }

    /// Newest first.
    pub fn list_listings(&self, limit: u32, offset: u32) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings
                 WHERE deleted_at IS NULL
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![limit, offset], ListingRow::from_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            Ok(rows)
        })
    }

    pub fn listings_for_owner(&self, owner_id: &str) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings
                 WHERE owner_id = ?1 AND deleted_at IS NULL
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([owner_id], ListingRow::from_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            Ok(rows)
        })
    }

    pub fn update_listing(
        &self,
        id: &str,
        owner_id: &str,
        changes: &ListingChanges<'_>,
    ) -> Result<ListingRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            owned_listing(&tx, id, owner_id)?;

            tx.execute(
                "UPDATE listings SET
                    title = COALESCE(?2, title),
                    description = COALESCE(?3, description),
                    price_per_night = COALESCE(?4, price_per_night),
                    currency = COALESCE(?5, currency),
                    updated_at = ?6
                 WHERE id = ?1",
                params![
                    id,
                    changes.title,
                    changes.description,
                    changes.price_per_night,
                    changes.currency,
                    Utc::now()
                ],
            )?;

            let listing = query_listing(&tx, id)?.ok_or(DbError::NotFound("listing"))?;
            tx.commit()?;
            Ok(listing)
        })
    }

    /// Soft delete. Refused while the listing still has confirmed bookings.
    pub fn delete_listing(&self, id: &str, owner_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            owned_listing(&tx, id, owner_id)?;

            let confirmed: i64 = tx.query_row(
                "SELECT COUNT(*) FROM bookings WHERE listing_id = ?1 AND status = 'confirmed'",
                [id],
                |row| row.get(0),
            )?;
            if confirmed > 0 {
                return Err(DbError::Conflict(format!(
                    "listing has {confirmed} confirmed booking(s)"
                )));
            }

            tx.execute(
                "UPDATE listings SET deleted_at = ?2 WHERE id = ?1",
                params![id, Utc::now()],
            )?;
            tx.commit()?;

            info!("Listing {} deleted by {}", id, owner_id);
            Ok(())
        })
    }
}

pub(crate) fn query_listing(conn: &Connection, id: &str) -> Result<Option<ListingRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1 AND deleted_at IS NULL"),
            [id],
            ListingRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Loads a live listing and checks that `owner_id` owns it.
pub(crate) fn owned_listing(conn: &Connection, id: &str, owner_id: &str) -> Result<ListingRow> {
    let listing = query_listing(conn, id)?.ok_or(DbError::NotFound("listing"))?;
    if listing.owner_id != owner_id {
        return Err(DbError::Forbidden("listing"));
    }
    Ok(listing)
}
