pub mod document;
pub mod person;
pub mod photo;
pub mod statement;
