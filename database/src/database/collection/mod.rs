pub mod collection;
pub mod filter;
pub mod pipeline;
pub mod query;
