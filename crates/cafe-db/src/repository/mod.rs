//! # Repository Module
//!
//! Database repository implementations for the café back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  REST handler                                                          │
//! │       │  db.orders().require(&id)                                       │
//! │       ▼                                                                 │
//! │  OrderRepository ── FromRow records ──► cafe-core types                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Orders and order items
//! - [`PromotionRepository`](promotion::PromotionRepository) - Promotion rules
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products, ingredients, recipes
//! - [`StaffRepository`](staff::StaffRepository) - Staff, shifts, schedule
//! - [`ReportRepository`](report::ReportRepository) - Report snapshots

pub mod catalog;
pub mod order;
pub mod promotion;
pub mod report;
pub mod staff;
