pub mod config;
pub mod logging;

pub mod archive;
pub mod client;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod filename;
pub mod handle;
pub mod layout;
pub mod storage;

pub use error::{ErrorKind, FetchError};
pub use fetcher::{DatasetFetcher, Fetch};
pub use handle::DatasetHandle;
