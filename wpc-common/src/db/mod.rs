//! Shared database access for WPC

pub mod init;
pub mod schema;

pub use init::init_database;
pub use schema::create_all_tables;
