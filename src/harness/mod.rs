pub mod cli;
pub mod discovery;
pub mod types;

pub use cli::run_tests;
pub use discovery::{DiscoveryError, DiscoveryResult, load_items, parse_items};
pub use types::{HarnessError, HarnessResult, Marker, TestItem};
