// Library exports for Twogether
// This allows integration tests and the binary to share one router

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod tenant;
pub mod uploads;
