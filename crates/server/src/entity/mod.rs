//! SeaORM entities backing the local user store.

pub mod user;
