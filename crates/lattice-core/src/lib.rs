//! Hydration engine for resource-document APIs.
//!
//! Wire documents (`{type, id, attributes, relationships}` records plus an
//! `included` side-channel) are translated into typed entities through a
//! type registry, and typed input is turned back into write payloads.

pub mod bootstrap;
pub mod entity;
pub mod envelope;
pub mod errors;
pub mod outbound;
pub mod registry;
pub mod relationships;
pub mod response;
pub mod translate;
pub mod type_key;
pub mod wire;

pub use bootstrap::*;
pub use entity::*;
pub use envelope::*;
pub use errors::*;
pub use outbound::*;
pub use registry::*;
pub use relationships::*;
pub use response::*;
pub use translate::*;
pub use type_key::*;
pub use wire::*;
