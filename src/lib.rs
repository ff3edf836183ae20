pub mod actor;
pub mod api;
pub mod blueprint;
pub mod config;
pub mod engine;
pub mod instrumentation;
pub mod store;
