//! IP form validation and policy drafts.

use crawldesk_api_models::{IpPolicy, LocalIpRequest};

use crate::error::ValidationError;

/// Confirmation prompt for removing a local IP.
pub const REMOVE_LOCAL_IP_PROMPT: &str = "remove this IP from the pool?";

/// Validate a local IP form.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyField`] for a blank address.
pub fn build_local_ip_request(
    address: &str,
    source: &str,
) -> Result<LocalIpRequest, ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::EmptyField { field: "IP address" });
    }
    Ok(LocalIpRequest {
        address: address.to_string(),
        source: source.trim().to_string(),
    })
}

/// Trim a whitelist/blacklist entry.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyField`] for a blank entry.
pub fn normalize_access_ip(ip: &str) -> Result<String, ValidationError> {
    let ip = ip.trim();
    if ip.is_empty() {
        return Err(ValidationError::EmptyField { field: "IP" });
    }
    Ok(ip.to_string())
}

/// Policy form input; blank fields submit as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PolicyDraft {
    /// Connections to warm up per address.
    pub preheat_connections: Option<u64>,
    /// Failures tolerated before an address is benched.
    pub max_failures: Option<u64>,
    /// Rotation period in seconds.
    pub rotate_interval_seconds: Option<u64>,
    /// Delay before a benched address is retried, in seconds.
    pub auto_recover_seconds: Option<u64>,
}

impl PolicyDraft {
    /// Request body with blanks zeroed.
    #[must_use]
    pub fn into_policy(self) -> IpPolicy {
        IpPolicy {
            preheat_connections: self.preheat_connections.unwrap_or(0),
            max_failures: self.max_failures.unwrap_or(0),
            rotate_interval_seconds: self.rotate_interval_seconds.unwrap_or(0),
            auto_recover_seconds: self.auto_recover_seconds.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ip_is_trimmed() {
        let request = build_local_ip_request(" 10.0.0.8 ", " dc-1 ").expect("valid");
        assert_eq!(request.address, "10.0.0.8");
        assert_eq!(request.source, "dc-1");

        let err = build_local_ip_request("  ", "dc-1").expect_err("blank");
        assert_eq!(err.to_string(), "IP address must not be empty");
    }

    #[test]
    fn access_ip_requires_value() {
        assert_eq!(normalize_access_ip(" 1.2.3.4\n"), Ok("1.2.3.4".to_string()));
        assert!(normalize_access_ip("").is_err());
    }

    #[test]
    fn blank_policy_fields_submit_zero() {
        let policy = PolicyDraft {
            max_failures: Some(3),
            ..PolicyDraft::default()
        }
        .into_policy();
        assert_eq!(policy.max_failures, 3);
        assert_eq!(policy.preheat_connections, 0);
        assert_eq!(policy.auto_recover_seconds, 0);
    }
}
