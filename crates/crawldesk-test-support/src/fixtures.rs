//! JSON payload builders shaped like the crawl backend responses.

use crawldesk_api_models::ApiEnvelope;
use serde_json::{Value, json};

/// Successful `{success: true, data}` envelope.
#[must_use]
pub fn envelope_ok(data: Value) -> Value {
    json!(ApiEnvelope::ok(data))
}

/// Failed `{success: false, message}` envelope.
#[must_use]
pub fn envelope_failure(message: &str) -> Value {
    json!(ApiEnvelope::failure(message))
}

/// Sparse task record carrying only an id, a name and a status.
#[must_use]
pub fn raw_task(id: &str, name: &str, status: &str) -> Value {
    json!({ "id": id, "name": name, "status": status })
}

/// Task record with every field the dashboard reads.
#[must_use]
pub fn full_raw_task(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("crawl {id}"),
        "type": "http",
        "status": "running",
        "priority": 8,
        "schedule": "interval",
        "lastExecution": "2026-03-01T10:00:00Z",
        "createdAt": "2026-02-28T09:30:00Z",
        "successRate": 92.5,
        "target": "https://example.com/catalog",
        "progress": 40
    })
}

/// Local IP record.
#[must_use]
pub fn ip_record(id: &str, address: &str) -> Value {
    json!({
        "id": id,
        "address": address,
        "type": "ipv4",
        "source": "manual",
        "status": "active"
    })
}

/// Pool statistics payload using the backend's PascalCase keys.
#[must_use]
pub fn pool_stats() -> Value {
    json!({
        "TotalConnections": 12,
        "ActiveConnections": 5,
        "IdleConnections": 7,
        "HealthyConnections": 11,
        "SuccessRate": 0.982,
        "ConnReuseRate": 64,
        "WhitelistIPs": 2,
        "BlacklistIPs": 1,
        "LastUpdateTime": "2026-03-01T10:00:05Z"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_carry_flag_and_payload() {
        let ok = envelope_ok(json!([1]));
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"], json!([1]));

        let failed = envelope_failure("duplicate name");
        assert_eq!(failed, json!({"success": false, "message": "duplicate name"}));
        assert_eq!(
            ApiEnvelope::from_value(&failed),
            ApiEnvelope::failure("duplicate name")
        );
    }

    #[test]
    fn full_task_has_every_field() {
        let task = full_raw_task("t9");
        for key in [
            "id",
            "name",
            "type",
            "status",
            "priority",
            "schedule",
            "lastExecution",
            "createdAt",
            "successRate",
            "target",
            "progress",
        ] {
            assert!(task.get(key).is_some(), "missing {key}");
        }
    }
}
