//! Query execution gateway
//!
//! Sends a query through the transport and routes the answer into the
//! results controller:
//!
//! - `Stream(index)`: `initialize_stream` then page 0
//! - `Buffer(raw)`: envelope builder then `load_static`
//! - `Cancelled`: nothing changes
//! - anything else: recorded with `set_error`
//!
//! Each execution takes a query ticket before sending. A response whose
//! ticket was superseded by a newer execution or a reset is dropped.
//!
//! `execute` never returns an error; failures are outcomes.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::multipart::build_envelope;
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::results::{QueryTicket, ResultError, ResultsController};
use crate::transport::{QueryRequest, QueryResponse, QueryTransport, TransportError};

use super::outcome::QueryOutcome;

/// Runs queries and owns the in-flight request id
pub struct QueryGateway {
    transport: Arc<dyn QueryTransport>,
    results: Arc<ResultsController>,
    in_flight: Mutex<Option<Uuid>>,
}

impl QueryGateway {
    pub fn new(transport: Arc<dyn QueryTransport>, results: Arc<ResultsController>) -> Self {
        Self {
            transport,
            results,
            in_flight: Mutex::new(None),
        }
    }

    /// The controller the gateway loads results into
    pub fn results(&self) -> &Arc<ResultsController> {
        &self.results
    }

    /// Request id of the query currently executing, if any
    pub fn current_request(&self) -> Option<Uuid> {
        *self.in_flight.lock().unwrap()
    }

    /// Execute `request` and apply its result.
    pub async fn execute(&self, request: &QueryRequest) -> QueryOutcome {
        let request_id = Uuid::new_v4();
        let ticket = self.results.begin_query();
        *self.in_flight.lock().unwrap() = Some(request_id);

        let id = request_id.to_string();
        let scope = ObservationScope::with_fields(
            "QUERY",
            &[("request_id", id.as_str()), ("query_type", request.query_type.as_str())],
        );

        let response = self.transport.send_query(request_id, request).await;
        self.finish(request_id);

        let outcome = match response {
            Ok(QueryResponse::Stream(index)) => {
                let part_count = index.part_count();
                let parts = part_count.to_string();
                log_event_with_fields(
                    Event::QueryStreamed,
                    &[("request_id", id.as_str()), ("parts", parts.as_str())],
                );
                match self.results.initialize_stream_for(ticket, index).await {
                    Some(_) => QueryOutcome::Streamed {
                        request_id,
                        part_count,
                    },
                    None => superseded(request_id, ticket),
                }
            }
            Ok(QueryResponse::Buffer(raw)) => {
                let bytes = raw.len().to_string();
                log_event_with_fields(
                    Event::QueryBuffered,
                    &[("request_id", id.as_str()), ("bytes", bytes.as_str())],
                );
                let envelope = build_envelope(&raw);
                if envelope.degraded {
                    log_event_with_fields(Event::ParseDegraded, &[("request_id", id.as_str())]);
                }
                if self.results.load_static_for(ticket, envelope.rows.clone()) {
                    QueryOutcome::Static {
                        request_id,
                        envelope,
                    }
                } else {
                    superseded(request_id, ticket)
                }
            }
            Err(TransportError::Cancelled) => {
                log_event_with_fields(Event::QueryCancelled, &[("request_id", id.as_str())]);
                QueryOutcome::Cancelled { request_id }
            }
            Err(e) => {
                let error = ResultError::from(e);
                if let ResultError::ResultTooLarge { limit_bytes } = error {
                    let limit = limit_bytes.to_string();
                    log_event_with_fields(
                        Event::ResultTooLarge,
                        &[("request_id", id.as_str()), ("limit_bytes", limit.as_str())],
                    );
                }
                if self.results.set_error_for(ticket, error.clone()) {
                    QueryOutcome::Failed { request_id, error }
                } else {
                    superseded(request_id, ticket)
                }
            }
        };

        match &outcome {
            QueryOutcome::Failed { error, .. } => scope.fail(&error.to_string()),
            other => scope.complete_with_fields(&[("outcome", other.name())]),
        }
        outcome
    }

    /// Ask the transport to cancel `request_id`. Best effort.
    pub fn cancel(&self, request_id: Uuid) -> bool {
        self.transport.cancel_query(request_id)
    }

    /// Cancel whatever query is executing
    pub fn cancel_current(&self) -> bool {
        match self.current_request() {
            Some(request_id) => self.cancel(request_id),
            None => false,
        }
    }

    fn finish(&self, request_id: Uuid) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if *in_flight == Some(request_id) {
            *in_flight = None;
        }
    }
}

fn superseded(request_id: Uuid, ticket: QueryTicket) -> QueryOutcome {
    let id = request_id.to_string();
    let ticket = ticket.value().to_string();
    log_event_with_fields(
        Event::QueryStale,
        &[("request_id", id.as_str()), ("ticket", ticket.as_str())],
    );
    QueryOutcome::Superseded { request_id }
}
