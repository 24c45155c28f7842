//! ecobot-server: HTTP surface for the advisory pipeline

pub mod http;

pub use http::{create_router, ApiState};
