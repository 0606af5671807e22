//! External tool discovery.

use std::process::Command;

/// Check whether a binary is reachable on PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
