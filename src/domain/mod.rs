pub mod catalogue;
pub mod models;
