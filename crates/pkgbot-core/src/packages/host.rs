//! Collaborator interfaces consumed by the package manager.
//!
//! The host application decides how installed code is loaded and how
//! messages reach the user; pkgbot only calls these hooks.

use tracing::{debug, info};

/// Receives user-facing messages emitted by mutating operations.
pub trait ResponseSink {
    fn respond(&mut self, message: &str);
}

impl ResponseSink for Vec<String> {
    fn respond(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Host extension loader notified after the installed tree changes.
pub trait ExtensionHost: Send + Sync {
    /// Rescans the installed packages for loadable extensions.
    fn reload_extensions(&self);

    /// Activates an extension by name. Returns `false` if the host does not
    /// know the extension.
    fn activate_extension(&self, name: &str) -> bool;
}

/// Host that only records the requests in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHost;

impl ExtensionHost for LoggingHost {
    fn reload_extensions(&self) {
        info!("Extension reload requested");
    }

    fn activate_extension(&self, name: &str) -> bool {
        debug!(extension = name, "Extension activation requested");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects_messages() {
        let mut sink: Vec<String> = Vec::new();
        sink.respond("one");
        sink.respond("two");
        assert_eq!(sink, vec!["one", "two"]);
    }

    #[test]
    fn test_logging_host_accepts_everything() {
        let host = LoggingHost;
        host.reload_extensions();
        assert!(host.activate_extension("weather"));
    }
}
