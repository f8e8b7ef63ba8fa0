//! trialmoa-cli: configuration and CSV plumbing behind the `trialmoa` binary.

pub mod config;
pub mod io;

pub use config::{Config, ConfigSource};
pub use io::{read_input, write_output, InputTable, DERIVED_COLUMNS};
