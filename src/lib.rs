pub mod db;

pub mod appointments;
pub mod bookings;
pub mod certificates;
pub mod ledger;
pub mod outbox;
pub mod pinning;
pub mod reference;

pub mod errors;
pub mod models;
pub mod schema;

pub use appointments::*;
pub use bookings::*;
