pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
