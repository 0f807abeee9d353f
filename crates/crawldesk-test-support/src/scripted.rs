//! Canned backend replies for transport fakes.
//!
//! A [`ScriptedBackend`] maps `(method, path)` to a queue of replies. Replies are
//! consumed in order; once a route's queue is empty the last served reply
//! repeats, so polling loops keep receiving the final scripted state. Every
//! exchange is recorded for later assertions.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde_json::Value;

/// Reply returned for one scripted exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedReply {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase.
    pub status_text: String,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Simulated latency before the reply is delivered.
    pub delay: Duration,
    /// Fail the exchange at the transport level with this description.
    pub transport_error: Option<String>,
}

impl ScriptedReply {
    /// JSON reply with the canonical reason phrase for `status`.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::raw(status, reason_phrase(status), body.to_string().into_bytes())
    }

    /// Reply with an arbitrary body and reason phrase.
    #[must_use]
    pub fn raw(status: u16, status_text: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            body: body.into(),
            delay: Duration::ZERO,
            transport_error: None,
        }
    }

    /// Exchange that never produces a response.
    #[must_use]
    pub fn unreachable(description: &str) -> Self {
        Self {
            transport_error: Some(description.to_string()),
            ..Self::raw(0, "", Vec::new())
        }
    }

    /// Deliver the reply after `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request observed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Upper-case HTTP method.
    pub method: String,
    /// Request path without query.
    pub path: String,
    /// Query parameters in request order.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Route {
    queued: VecDeque<ScriptedReply>,
    last_served: Option<ScriptedReply>,
}

/// Scripted fake of the crawl backend.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    routes: RefCell<HashMap<(String, String), Route>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    /// Empty backend; unscripted routes answer 404.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` for `method path`.
    pub fn script(&self, method: &str, path: &str, reply: ScriptedReply) -> &Self {
        self.routes
            .borrow_mut()
            .entry((method.to_ascii_uppercase(), path.to_string()))
            .or_default()
            .queued
            .push_back(reply);
        self
    }

    /// Record the call and hand back the next reply for its route.
    pub fn respond(&self, call: RecordedCall) -> ScriptedReply {
        let key = (call.method.to_ascii_uppercase(), call.path.clone());
        self.calls.borrow_mut().push(call);

        let mut routes = self.routes.borrow_mut();
        let Some(route) = routes.get_mut(&key) else {
            return ScriptedReply::raw(404, "Not Found", Vec::new());
        };
        if let Some(next) = route.queued.pop_front() {
            route.last_served = Some(next.clone());
            return next;
        }
        route
            .last_served
            .clone()
            .unwrap_or_else(|| ScriptedReply::raw(404, "Not Found", Vec::new()))
    }

    /// Every call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Number of calls made to `method path`.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.method.eq_ignore_ascii_case(method) && call.path == path)
            .count()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(path: &str) -> RecordedCall {
        RecordedCall {
            method: "GET".into(),
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn replies_are_consumed_in_order_and_last_sticks() {
        let backend = ScriptedBackend::new();
        backend
            .script("get", "/api/tasks", ScriptedReply::json(200, &json!(1)))
            .script("GET", "/api/tasks", ScriptedReply::json(200, &json!(2)));

        assert_eq!(backend.respond(get("/api/tasks")).body, b"1");
        assert_eq!(backend.respond(get("/api/tasks")).body, b"2");
        assert_eq!(backend.respond(get("/api/tasks")).body, b"2");
        assert_eq!(backend.count("GET", "/api/tasks"), 3);

        backend.script("GET", "/api/tasks", ScriptedReply::json(200, &json!(3)));
        assert_eq!(backend.respond(get("/api/tasks")).body, b"3");
    }

    #[test]
    fn unscripted_routes_answer_not_found() {
        let backend = ScriptedBackend::new();
        let reply = backend.respond(get("/missing"));
        assert_eq!(reply.status, 404);
        assert_eq!(reply.status_text, "Not Found");
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn unreachable_reply_carries_transport_error() {
        let reply = ScriptedReply::unreachable("connection refused")
            .delayed(Duration::from_millis(5));
        assert_eq!(reply.transport_error.as_deref(), Some("connection refused"));
        assert_eq!(reply.delay, Duration::from_millis(5));
    }
}
