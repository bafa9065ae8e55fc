use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use lodge_types::models::BookingStatus;
use lodge_types::stay::StayRange;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info};

use crate::models::{BOOKING_COLUMNS, BookingRow};
use crate::queries::listings::owned_listing;
use crate::{Database, DbError, Result};

pub struct NewBooking<'a> {
    pub id: &'a str,
    pub listing_id: &'a str,
    pub guest_id: &'a str,
    pub range: StayRange,
}

impl Database {
    /// Books every night of `new.range` or nothing.
    ///
    /// Inside one `BEGIN IMMEDIATE` transaction: the available inventory rows
    /// for the range must number exactly the nights of the stay, the booking
    /// total is the sum of their nightly prices, and the rows are flipped to
    /// unavailable and pointed at the new booking. The write lock is taken
    /// before the availability read, so a concurrent writer on the same
    /// database waits (up to the busy timeout) and then sees the flipped rows.
    ///
    /// A missing or deleted listing has no available rows and is reported as
    /// [`DbError::Unavailable`].
    pub fn create_booking(&self, new: &NewBooking<'_>) -> Result<BookingRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let (check_in, check_out) = (new.range.start(), new.range.end());

            let prices: Vec<i64> = {
                let mut stmt = tx.prepare(
                    "SELECT i.nightly_price
                     FROM listing_inventory i
                     JOIN listings l ON l.id = i.listing_id
                     WHERE i.listing_id = ?1
                       AND i.date >= ?2 AND i.date < ?3
                       AND i.available = 1
                       AND l.deleted_at IS NULL",
                )?;
                stmt.query_map(params![new.listing_id, check_in, check_out], |row| row.get(0))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?
            };

            if prices.len() as i64 != new.range.nights() {
                debug!(
                    "Listing {} has {} of {} nights available from {}",
                    new.listing_id,
                    prices.len(),
                    new.range.nights(),
                    check_in
                );
                return Err(DbError::Unavailable);
            }

            let total_price = prices
                .iter()
                .try_fold(0i64, |acc, price| acc.checked_add(*price))
                .ok_or_else(|| DbError::InvalidData("total price overflows".into()))?;

            tx.execute(
                "INSERT INTO bookings
                    (id, listing_id, guest_id, check_in, check_out, total_price, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.id,
                    new.listing_id,
                    new.guest_id,
                    check_in,
                    check_out,
                    total_price,
                    BookingStatus::Confirmed.as_str(),
                    Utc::now()
                ],
            )?;

            let flipped = tx.execute(
                "UPDATE listing_inventory SET available = 0, booking_id = ?1
                 WHERE listing_id = ?2 AND date >= ?3 AND date < ?4 AND available = 1",
                params![new.id, new.listing_id, check_in, check_out],
            )?;
            if flipped != prices.len() {
                return Err(DbError::Unavailable);
            }

            let booking = query_booking(&tx, new.id)?.ok_or(DbError::NotFound("booking"))?;
            tx.commit()?;

            info!(
                "Booking {} created: listing {}, {} night(s) from {}, total {}",
                new.id,
                new.listing_id,
                prices.len(),
                check_in,
                total_price
            );
            Ok(booking)
        })
    }

    pub fn get_booking(&self, id: &str) -> Result<Option<BookingRow>> {
        self.with_conn(|conn| query_booking(conn, id))
    }

    /// Newest first.
    pub fn bookings_for_guest(&self, guest_id: &str) -> Result<Vec<BookingRow>> {
        self.with_conn(|conn| {
            query_bookings(
                conn,
                "WHERE b.guest_id = ?1 ORDER BY b.created_at DESC, b.rowid DESC",
                guest_id,
            )
        })
    }

    /// Bookings of one listing by check-in date. Owner only.
    pub fn bookings_for_listing(&self, listing_id: &str, owner_id: &str) -> Result<Vec<BookingRow>> {
        self.with_conn(|conn| {
            owned_listing(conn, listing_id, owner_id)?;
            query_bookings(conn, "WHERE b.listing_id = ?1 ORDER BY b.check_in, b.rowid", listing_id)
        })
    }

    /// Cancels a confirmed booking and releases its nights for rebooking.
    /// Only the guest or the listing's host may cancel; anyone else sees
    /// [`DbError::NotFound`].
    pub fn cancel_booking(&self, id: &str, user_id: &str) -> Result<BookingRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let booking = query_booking(&tx, id)?
                .filter(|b| b.guest_id == user_id || b.host_id == user_id)
                .ok_or(DbError::NotFound("booking"))?;
            if booking.status != BookingStatus::Confirmed {
                return Err(DbError::Conflict(format!(
                    "booking is already {}",
                    booking.status.as_str()
                )));
            }

            let released = tx.execute(
                "UPDATE listing_inventory SET available = 1, booking_id = NULL WHERE booking_id = ?1",
                [id],
            )?;
            tx.execute(
                "UPDATE bookings SET status = ?2 WHERE id = ?1",
                params![id, BookingStatus::Cancelled.as_str()],
            )?;

            let booking = query_booking(&tx, id)?.ok_or(DbError::NotFound("booking"))?;
            tx.commit()?;

            info!("Booking {} cancelled by {}, {} night(s) released", id, user_id, released);
            Ok(booking)
        })
    }
}

fn query_booking(conn: &Connection, id: &str) -> Result<Option<BookingRow>> {
    let booking = conn
        .query_row(
            &format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings b
                 JOIN listings l ON l.id = b.listing_id
                 WHERE b.id = ?1"
            ),
            [id],
            BookingRow::from_row,
        )
        .optional()?;

    let Some(mut booking) = booking else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT date FROM listing_inventory WHERE booking_id = ?1 ORDER BY date")?;
    booking.dates = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    Ok(Some(booking))
}

/// Runs a booking query (`filter` is the WHERE/ORDER BY tail, with a single
/// `?1` parameter) and attaches each booking's dates in one extra query.
fn query_bookings(conn: &Connection, filter: &str, param: &str) -> Result<Vec<BookingRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         JOIN listings l ON l.id = b.listing_id
         {filter}"
    ))?;
    let mut bookings = stmt
        .query_map([param], BookingRow::from_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    if bookings.is_empty() {
        return Ok(bookings);
    }

    let placeholders: Vec<String> = (1..=bookings.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT booking_id, date FROM listing_inventory WHERE booking_id IN ({}) ORDER BY date",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids: Vec<&dyn rusqlite::types::ToSql> = bookings
        .iter()
        .map(|b| &b.id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut dates: HashMap<String, Vec<NaiveDate>> = HashMap::new();
    let rows = stmt.query_map(ids.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, NaiveDate>(1)?))
    })?;
    for row in rows {
        let (booking_id, date) = row?;
        dates.entry(booking_id).or_default().push(date);
    }

    for booking in &mut bookings {
        booking.dates = dates.remove(&booking.id).unwrap_or_default();
    }
    Ok(bookings)
}
