//! Pure domain logic for the Tally project/budget tracker.
//!
//! Nothing in this crate touches the database or HTTP. The `tally-db`
//! repositories feed rows in, the `tally-api` handlers serialize the results.

pub mod budget;
pub mod cost;
pub mod error;
pub mod pagination;
pub mod status;
pub mod summary;
pub mod time_ledger;
pub mod types;
pub mod validation;
pub mod variance;
