pub mod consts;
pub mod database;
pub mod model;
pub mod persistence;
pub mod service;
