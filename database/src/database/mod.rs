pub mod collection;
pub mod database;
pub mod options;
pub mod store;
