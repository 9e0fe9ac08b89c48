//! epc-infra: concrete, I/O-bound adapters — a JSON-file `PersistentStore`
//! and a `reqwest`-backed `HttpTransport`.

pub mod config;
pub mod error;
pub mod store;
pub mod transport;

pub use config::{init_dotenv, StoreConfig};
pub use error::InfraError;
pub use store::JsonFileStore;
pub use transport::ReqwestHttpTransport;
