pub mod config;

pub use config::{BehaviorConfig, FrozenConfig, GridConfig};
