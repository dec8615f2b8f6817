pub mod database;

pub use database::{NetworkStore, QueryRecord};
