pub mod config;
pub mod error;
pub mod market;
pub mod notify;
pub mod types;

pub use config::{Config, DEFAULT_COINBASE_BASE_URL};
pub use error::{Error, Result};
pub use market::{CandleFetcher, ProductCatalog};
pub use notify::Notifier;
pub use types::*;
