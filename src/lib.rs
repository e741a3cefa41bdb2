pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod services;
pub mod state;
pub mod version;
