//! CLI command implementation

pub mod collect;
pub mod error;

pub use collect::Cli;
pub use error::CliError;
