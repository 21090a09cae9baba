pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod grouping;
pub mod model;
pub mod projection;
pub mod read_state;
pub mod render;
pub mod routes;
pub mod store;
