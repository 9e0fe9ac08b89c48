//! epc-domain: the value types shared by every Event Platform Client crate.
//!
//! - [`event`]: the `Event` data model and its reserved `meta` sub-map.
//! - [`stream`]: per-stream configuration recognised by the dispatcher.
//! - [`identity`]: bit-exact identity string formats (pageview/session/activity ids).
//! - [`canonical_json`]: deterministic JSON rendering used for the wire body.

pub mod canonical_json;
pub mod error;
pub mod event;
pub mod identity;
pub mod stream;

pub use error::DomainError;
pub use event::{Event, Meta};
pub use identity::{activity_id, hex4, scope_id_from_bytes};
pub use stream::{SampleConfig, Scope, StreamConfig};
