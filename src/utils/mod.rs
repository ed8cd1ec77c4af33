//! Utility functions for loan_sweep
//!
//! Provides environment variable handling and logging setup.

pub mod env;
pub mod logging;

pub use env::{env_bool, env_list, env_parse, env_string, load_env};
pub use logging::init_logging;
