//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software directory, used
/// to resolve the `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "KRAKEN_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    Ok(PathBuf::from(env::var(SW_ROOT_ENV_VAR)?))
}

/// Get the hostname of the machine running the software, or `None` if it
/// cannot be determined.
pub fn get_hostname() -> Option<String> {
    env::var("HOSTNAME").or_else(|_| env::var("COMPUTERNAME")).ok()
}
