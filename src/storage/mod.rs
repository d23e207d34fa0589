//! In-process storage for registered users.
//!
//! Nothing here outlives the process; a restart starts from an empty table.

pub mod user;

pub use user::UserRegistry;
