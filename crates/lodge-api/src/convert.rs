//! Row-to-response mapping. Corrupt stored values are logged and replaced
//! with defaults rather than failing the whole response.

use lodge_db::models::{BookingRow, InventoryRow, ListingRow};
use lodge_types::api::{BookingResponse, InventoryDayResponse, ListingResponse};
use lodge_types::stay::nights_between;
use tracing::warn;
use uuid::Uuid;

fn id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn price(raw: i64, what: &str) -> u64 {
    u64::try_from(raw).unwrap_or_else(|_| {
        warn!("Negative {} {}", what, raw);
        0
    })
}

pub(crate) fn listing(row: ListingRow) -> ListingResponse {
    ListingResponse {
        id: id(&row.id, "listing id"),
        owner_id: id(&row.owner_id, "owner id"),
        title: row.title,
        description: row.description,
        price_per_night: price(row.price_per_night, "price per night"),
        currency: row.currency,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn inventory_day(row: InventoryRow) -> InventoryDayResponse {
    InventoryDayResponse {
        date: row.date,
        nightly_price: price(row.nightly_price, "nightly price"),
        available: row.available,
        booking_id: row.booking_id.as_deref().map(|b| id(b, "booking id")),
    }
}

pub(crate) fn booking(row: BookingRow) -> BookingResponse {
    BookingResponse {
        id: id(&row.id, "booking id"),
        listing_id: id(&row.listing_id, "listing id"),
        guest_id: id(&row.guest_id, "guest id"),
        check_in: row.check_in,
        check_out: row.check_out,
        nights: nights_between(row.check_in, row.check_out),
        total_price: price(row.total_price, "total price"),
        currency: row.currency,
        status: row.status,
        dates: row.dates,
        created_at: row.created_at,
    }
}
