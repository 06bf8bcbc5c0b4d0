//! # Domain Layer
//!
//! Pure business logic for the shared-cart engine.
//!
//! ## Components
//!
//! - `entities`: `Cart` aggregate, `CartMember`, `CartItem`, `EngineConfig`
//! - `value_objects`: `Platform`, `CartStatus` state machine, `GeoPoint`
//! - `geo`: location normalization and haversine distance
//! - `split`: delivery-charge split math
//! - `decode`: loose persisted records and decode-with-defaults
//! - `errors`: `CartError` enumeration and the error taxonomy

pub mod decode;
pub mod entities;
pub mod errors;
pub mod geo;
pub mod split;
pub mod value_objects;

pub use decode::*;
pub use entities::*;
pub use errors::*;
pub use geo::*;
pub use split::*;
pub use value_objects::*;
