//! Store-facing types shared by the `cloak` encryption layer and store adapters.

pub mod cache;
pub mod error;
pub mod protocol;
pub mod store;

pub use cache::{CacheClient, ServerStats};
pub use error::StoreError;
pub use protocol::{BatchMode, Command, IntoArg, Reply};
pub use store::StoreClient;
