//! Hostname detection for events that do not name their sender

use std::env;
use tracing::warn;

/// Get the local hostname
///
/// Tries, in order: the `HOSTNAME` environment variable, the system
/// hostname, and finally `localhost`.
#[must_use]
pub fn default_hostname() -> String {
    if let Ok(hostname) = env::var("HOSTNAME") {
        if !hostname.trim().is_empty() {
            return hostname.trim().to_string();
        }
    }

    if let Some(hostname) = system_hostname() {
        return hostname;
    }

    warn!("Could not determine hostname, using 'localhost'");
    "localhost".to_string()
}

#[cfg(unix)]
fn system_hostname() -> Option<String> {
    match nix::unistd::gethostname() {
        Ok(hostname) => hostname
            .to_str()
            .map(str::trim)
            .filter(|hostname| !hostname.is_empty())
            .map(str::to_string),
        Err(e) => {
            warn!("Failed to get system hostname: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn system_hostname() -> Option<String> {
    env::var("COMPUTERNAME")
        .ok()
        .filter(|hostname| !hostname.trim().is_empty())
}
