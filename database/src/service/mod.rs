pub mod aggregation;
pub mod error;
pub mod person;
pub mod photo;
pub mod search;
