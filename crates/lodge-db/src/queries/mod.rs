pub(crate) mod bookings;
pub(crate) mod inventory;
pub(crate) mod listings;
pub(crate) mod users;

#[cfg(test)]
pub(crate) mod test_support;
