//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `chrono`).
//! Keep it lean: no I/O, networking, or persistence logic, just data and simple helpers.

pub mod audit;
pub mod config;
pub mod constants;
pub mod paging;
pub mod registry;
