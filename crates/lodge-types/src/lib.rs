//! Types shared by the Lodge database, API and server crates.

pub mod api;
pub mod models;
pub mod stay;
