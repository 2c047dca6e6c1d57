pub mod benchmark;
pub mod custom;
pub mod dashboard;
pub mod metrics;
pub mod service;
pub mod summary;
