//! # Ports Layer
//!
//! Boundary traits of the cart engine.
//!
//! - `inbound`: the `CartApi` driving port consumed by controllers.
//! - `outbound`: driven ports for the user directory, the persistent cart
//!   store, the notification dispatcher, and the clock.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
