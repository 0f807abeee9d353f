//! Cached operator identity.
//!
//! Two read-only tiers: a session value (environment) that overrides a
//! persistent value (identity file). Blank values count as absent.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

/// Environment variable carrying the session-scoped identity.
pub const SESSION_IDENTITY_ENV: &str = "CRAWLDESK_SESSION_USER";

/// Identity sources in precedence order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityTiers {
    /// Session-scoped value.
    pub session: Option<String>,
    /// Value persisted across sessions.
    pub persistent: Option<String>,
}

impl IdentityTiers {
    /// Read both tiers; a missing or unreadable file leaves the persistent tier empty.
    #[must_use]
    pub fn load(session: Option<String>, identity_file: Option<&Path>) -> Self {
        Self {
            session,
            persistent: identity_file.and_then(read_identity_file),
        }
    }

    /// Effective identity: session first, then persistent.
    #[must_use]
    pub fn resolve(&self) -> Option<&str> {
        non_blank(self.session.as_deref()).or_else(|| non_blank(self.persistent.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn read_identity_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents.lines().next().map(|line| line.trim().to_string()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "identity file not found");
            None
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read identity file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn session_tier_overrides_persistent() {
        let tiers = IdentityTiers {
            session: Some("alice".into()),
            persistent: Some("bob".into()),
        };
        assert_eq!(tiers.resolve(), Some("alice"));
    }

    #[test]
    fn blank_session_falls_through() {
        let tiers = IdentityTiers {
            session: Some("  ".into()),
            persistent: Some(" bob ".into()),
        };
        assert_eq!(tiers.resolve(), Some("bob"));
        assert_eq!(IdentityTiers::default().resolve(), None);
    }

    #[test]
    fn identity_file_first_line_is_used() {
        let path = std::env::temp_dir().join(format!(
            "crawldesk-identity-{}.txt",
            uuid::Uuid::new_v4().simple()
        ));
        fs::write(&path, "carol\nignored\n").expect("write identity");
        let tiers = IdentityTiers::load(None, Some(&path));
        assert_eq!(tiers.resolve(), Some("carol"));
        fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn missing_identity_file_is_not_an_error() {
        let path = PathBuf::from("/definitely/missing/identity");
        let tiers = IdentityTiers::load(None, Some(&path));
        assert!(tiers.persistent.is_none());
    }
}
