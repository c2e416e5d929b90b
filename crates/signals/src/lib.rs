pub mod config;
pub mod evaluator;
pub mod scan;

pub use config::{ScanConfig, ScanFileConfig};
pub use evaluator::evaluate;
pub use scan::{default_scans, AssetUniverse, ScanSpec};
