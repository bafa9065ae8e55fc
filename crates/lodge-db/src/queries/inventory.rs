use lodge_types::stay::StayRange;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::info;
use uuid::Uuid;

use crate::models::{INVENTORY_COLUMNS, InventoryRow};
use crate::queries::listings::{owned_listing, query_listing};
use crate::{Database, DbError, Result};

/// Price and availability to apply to every night of `range`.
pub struct InventoryUpdate {
    pub range: StayRange,
    /// Falls back to the listing's price per night.
    pub nightly_price: Option<i64>,
    pub available: bool,
}

impl Database {
    /// Upserts one inventory row per night of the range. All-or-nothing: a
    /// night already held by a booking fails the whole update.
    pub fn set_inventory(
        &self,
        listing_id: &str,
        owner_id: &str,
        update: &InventoryUpdate,
    ) -> Result<Vec<InventoryRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let listing = owned_listing(&tx, listing_id, owner_id)?;
            let price = update.nightly_price.unwrap_or(listing.price_per_night);

            for date in update.range.dates() {
                let held_by: Option<Option<String>> = tx
                    .query_row(
                        "SELECT booking_id FROM listing_inventory WHERE listing_id = ?1 AND date = ?2",
                        params![listing_id, date],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(Some(booking_id)) = held_by {
                    return Err(DbError::Conflict(format!(
                        "{date} is held by booking {booking_id}"
                    )));
                }

                tx.execute(
                    "INSERT INTO listing_inventory (id, listing_id, date, nightly_price, available)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (listing_id, date) DO UPDATE SET
                        nightly_price = excluded.nightly_price,
                        available = excluded.available",
                    params![
                        Uuid::new_v4().to_string(),
                        listing_id,
                        date,
                        price,
                        update.available
                    ],
                )?;
            }

            let rows = query_inventory(&tx, listing_id, &update.range)?;
            tx.commit()?;

            info!(
                "Inventory for listing {} set: {} night(s) from {} at {} (available: {})",
                listing_id,
                update.range.nights(),
                update.range.start(),
                price,
                update.available
            );
            Ok(rows)
        })
    }

    /// Calendar rows for a live listing, ordered by date. Nights without a
    /// row are simply absent.
    pub fn inventory(&self, listing_id: &str, range: &StayRange) -> Result<Vec<InventoryRow>> {
        self.with_conn(|conn| {
            query_listing(conn, listing_id)?.ok_or(DbError::NotFound("listing"))?;
            query_inventory(conn, listing_id, range)
        })
    }
}

fn query_inventory(
    conn: &Connection,
    listing_id: &str,
    range: &StayRange,
) -> Result<Vec<InventoryRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM listing_inventory
         WHERE listing_id = ?1 AND date >= ?2 AND date < ?3
         ORDER BY date"
    ))?;
    let rows = stmt
        .query_map(
            params![listing_id, range.start(), range.end()],
            InventoryRow::from_row,
        )?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
    Ok(rows)
}
