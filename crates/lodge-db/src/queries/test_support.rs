use chrono::NaiveDate;
use lodge_types::stay::StayRange;

use crate::{Database, InventoryUpdate, NewListing};

pub const HOST: &str = "host";
pub const GUEST: &str = "guest";
pub const LISTING: &str = "listing-1";

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn range(from: &str, to: &str) -> StayRange {
    StayRange::new(date(from), date(to)).unwrap()
}

/// A host, a guest and one listing at 100 USD per night with no inventory.
pub fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.create_user(HOST, "host", "hash").unwrap();
    db.create_user(GUEST, "guest", "hash").unwrap();
    db.create_listing(&NewListing {
        id: LISTING,
        owner_id: HOST,
        title: "Cabin",
        description: "By the lake",
        price_per_night: 100,
        currency: "USD",
    })
    .unwrap();
    db
}

pub fn set_nights(db: &Database, from: &str, to: &str, price: Option<i64>, available: bool) {
    db.set_inventory(
        LISTING,
        HOST,
        &InventoryUpdate {
            range: range(from, to),
            nightly_price: price,
            available,
        },
    )
    .unwrap();
}

pub fn count(db: &Database, sql: &str) -> i64 {
    db.with_conn(|conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
        .unwrap()
}
