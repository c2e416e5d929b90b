pub mod alert;
pub mod coinbase;
pub mod pacing;
pub mod runlog;
pub mod runner;

pub use coinbase::CoinbaseClient;
pub use pacing::{IntervalPacer, NoPacing, Pacer};
pub use runlog::RunLog;
pub use runner::Runner;
