//! epc-core: the coupled dispatch engine (spec §2).
//!
//! Holds the pieces that have to agree with each other to get a single
//! `log` call right: the stream config registry and its derived cascade
//! graph, the deferred input buffer for events seen before `configure`, and
//! the dispatcher that walks both against the collaborator ports in
//! `ports`. Association, sampling, and output concerns are implemented in
//! their own crates behind the traits declared here.

pub mod deferred;
pub mod dispatcher;
pub mod ports;
pub mod registry;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use deferred::DeferredInputBuffer;
pub use dispatcher::StreamDispatcher;
pub use ports::{Association, Clock, DoNotTrackSignal, OutputSink, PersistentStore, RandomSource, StoreError};
pub use registry::StreamConfigRegistry;
