//! The collaborator interfaces the core consumes (spec §6). Everything here
//! is implemented by a host application; `epc-providers` and `epc-infra`
//! ship default implementations, and `epc-core::testkit` ships mocks.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("persistent store error: {0}")]
pub struct StoreError(pub String);

/// A synchronous key/value store with JSON-serialisable values.
///
/// Spec §5: "Persistent-store calls are assumed synchronous and fast." A
/// host whose store is actually async must wrap it behind a blocking
/// confinement before handing it to the dispatcher.
pub trait PersistentStore: Send + Sync {
    fn get_persistent(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    fn set_persistent(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
    fn del_persistent(&self, key: &str) -> Result<(), StoreError>;
}

/// `now_iso_8601() -> string`.
pub trait Clock: Send + Sync {
    fn now_iso_8601(&self) -> String;
}

/// `generate_id()` / `generate_uuid_v4()`.
pub trait RandomSource: Send + Sync {
    /// Uniformly random 80 bits, rendered as 20 lowercase hex digits.
    fn generate_id(&self) -> String;
    /// RFC 4122 version-4 UUID string.
    fn generate_uuid_v4(&self) -> String;
}

/// `client_cannot_be_tracked() -> bool`.
pub trait DoNotTrackSignal: Send + Sync {
    fn client_cannot_be_tracked(&self) -> bool;
}

/// The dispatcher's view of the output buffer: hand off a `(url, body)` pair
/// and forget about it (spec §4.1 step 9). Implemented by
/// `epc_output::OutputBuffer`.
pub trait OutputSink: Send + Sync {
    fn schedule(&self, url: String, body: String);
}

/// The dispatcher's view of the association controller (spec §4.2),
/// abstracted so `epc-core` does not need to depend on `epc-association`.
/// Implemented by `epc_association::AssociationController`.
pub trait Association: Send + Sync {
    fn pageview_id(&self) -> String;
    fn session_id(&self) -> String;
    fn activity_id(&self, stream: &str, scope_id: &str) -> String;
    fn begin_new_session(&self);
    fn begin_new_activity(&self, stream: &str);
}
