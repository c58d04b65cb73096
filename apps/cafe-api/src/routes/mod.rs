//! HTTP routes.
//!
//! - [`health`] - `GET /health`
//! - [`orders`] - `/api/orders/...`
//! - [`reports`] - `/api/reports/...`

pub mod health;
pub mod orders;
pub mod reports;
