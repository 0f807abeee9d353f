//! In-crate test doubles wired to the shared scripted backend.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use crawldesk_test_support::{RecordedCall, ScriptedBackend};

use crate::core::scheduler::Refresh;
use crate::core::store::Domain;
use crate::services::gateway::ApiGateway;
use crate::services::transport::{ApiRequest, RawResponse, Transport, TransportError};

/// Transport that answers from a [`ScriptedBackend`].
pub(crate) struct ScriptedTransport(pub(crate) Rc<ScriptedBackend>);

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let reply = self.0.respond(RecordedCall {
            method: request.method.as_str().to_string(),
            path: request.path,
            query: request.query,
            body: request.body,
        });
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        if let Some(description) = reply.transport_error {
            return Err(TransportError(description));
        }
        Ok(RawResponse {
            status: reply.status,
            status_text: reply.status_text,
            body: reply.body,
        })
    }
}

pub(crate) fn scripted_gateway(backend: &Rc<ScriptedBackend>) -> ApiGateway {
    ApiGateway::new(Rc::new(ScriptedTransport(Rc::clone(backend))))
}

/// Refresher that only records which domains were requested.
#[derive(Default)]
pub(crate) struct RecordingRefresher {
    pub(crate) calls: RefCell<Vec<Domain>>,
}

impl RecordingRefresher {
    pub(crate) fn count(&self, domain: Domain) -> usize {
        self.calls.borrow().iter().filter(|seen| **seen == domain).count()
    }
}

#[async_trait(?Send)]
impl Refresh for RecordingRefresher {
    async fn refresh(&self, domain: Domain) {
        self.calls.borrow_mut().push(domain);
    }
}
