//! # Service Layer
//!
//! Orchestrates domain logic against the outbound ports.
//!
//! - `cart_service`: the live request path implementing `CartApi`.
//! - `auditor`: the standalone consistency-repair batch pass.

pub mod auditor;
pub mod cart_service;

pub use auditor::{AuditErrorDetail, AuditReport, ConsistencyAuditor};
pub use cart_service::CartService;
