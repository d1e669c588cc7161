//! Configuration parsing and types.
//!
//! - `types` - Root config structure (`Config`, `Artifacts`, `ServiceConfig`, `TransportConfig`)
//! - `remote` - Remote groups and targets (`GroupConfig`, `RemoteTarget`, `Secret`)
//! - `duration` - Human-readable durations
//! - `parser` - YAML loading, discovery and write-back
//! - `validation` - Config validation

mod duration;
mod parser;
mod remote;
mod types;
mod validation;

pub use duration::*;
pub use parser::*;
pub use remote::*;
pub use types::*;
