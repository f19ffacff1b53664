pub mod migrations;
pub mod models;
pub mod queries;

pub use migrations::{connect_pool, create_database_pool, setup_database};
