use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::info;

use crate::Result;

/// Brings the schema up to date. The version is read under the write lock,
/// so processes opening a fresh file together apply each step once.
pub fn run(conn: &Connection) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    tx.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        tx.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, listings, inventory, bookings)");
        tx.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE listings (
                id              TEXT PRIMARY KEY,
                owner_id        TEXT NOT NULL REFERENCES users(id),
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                price_per_night INTEGER NOT NULL CHECK (price_per_night >= 0),
                currency        TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                deleted_at      TEXT
            );

            CREATE INDEX idx_listings_owner ON listings(owner_id);

            CREATE TABLE bookings (
                id          TEXT PRIMARY KEY,
                listing_id  TEXT NOT NULL REFERENCES listings(id),
                guest_id    TEXT NOT NULL REFERENCES users(id),
                check_in    TEXT NOT NULL,
                check_out   TEXT NOT NULL,
                total_price INTEGER NOT NULL CHECK (total_price >= 0),
                status      TEXT NOT NULL CHECK (status IN ('confirmed', 'cancelled')),
                created_at  TEXT NOT NULL,
                CHECK (check_out > check_in)
            );

            CREATE INDEX idx_bookings_guest ON bookings(guest_id, created_at);
            CREATE INDEX idx_bookings_listing ON bookings(listing_id, check_in);

            -- One row per (listing, night). A row only points at a booking
            -- while that booking holds it.
            CREATE TABLE listing_inventory (
                id              TEXT PRIMARY KEY,
                listing_id      TEXT NOT NULL REFERENCES listings(id),
                date            TEXT NOT NULL,
                nightly_price   INTEGER NOT NULL CHECK (nightly_price >= 0),
                available       INTEGER NOT NULL CHECK (available IN (0, 1)),
                booking_id      TEXT REFERENCES bookings(id),
                UNIQUE (listing_id, date),
                CHECK (booking_id IS NULL OR available = 0)
            );

            CREATE INDEX idx_inventory_booking ON listing_inventory(booking_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    tx.commit()?;
    info!("Database migrations complete");
    Ok(())
}
