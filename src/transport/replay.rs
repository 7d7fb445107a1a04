//! Replay transport
//!
//! Serves a captured multipart response from a file as if it were the
//! answer to every query. The body goes through the spooler, so large
//! captures exercise the streamed path exactly like a live response.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::fs::File;
use tokio::io::BufReader;
use uuid::Uuid;

use super::errors::TransportError;
use super::request::{QueryRequest, QueryResponse};
use super::spool::{ResponseSpooler, SpoolMode};
use super::{QueryTransport, TransportFuture};

/// Transport that replays a response file through a spooler
pub struct ReplayTransport {
    response_path: PathBuf,
    spooler: ResponseSpooler,
    in_flight: Mutex<HashMap<Uuid, Arc<AtomicBool>>>,
}

impl ReplayTransport {
    /// Create a transport replaying `response_path`
    pub fn new(response_path: impl Into<PathBuf>, spooler: ResponseSpooler) -> Self {
        Self {
            response_path: response_path.into(),
            spooler,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Path of the replayed response
    pub fn response_path(&self) -> &Path {
        &self.response_path
    }

    /// Number of requests currently being served
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    fn register(&self, request_id: Uuid) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.in_flight
            .lock()
            .unwrap()
            .insert(request_id, Arc::clone(&flag));
        flag
    }

    fn unregister(&self, request_id: Uuid) {
        self.in_flight.lock().unwrap().remove(&request_id);
    }
}

impl QueryTransport for ReplayTransport {
    fn send_query<'a>(
        &'a self,
        request_id: Uuid,
        request: &'a QueryRequest,
    ) -> TransportFuture<'a, QueryResponse> {
        Box::pin(async move {
            let cancelled = self.register(request_id);
            let mode = if request.prefer_stream {
                SpoolMode::PreferStream
            } else {
                SpoolMode::BufferOnly
            };

            let result = match File::open(&self.response_path).await {
                Ok(file) => {
                    self.spooler
                        .spool(request_id, BufReader::new(file), mode, &cancelled)
                        .await
                }
                Err(e) => Err(TransportError::QueryFailed(format!(
                    "cannot open response {}: {}",
                    self.response_path.display(),
                    e
                ))),
            };

            self.unregister(request_id);
            result
        })
    }

    fn cancel_query(&self, request_id: Uuid) -> bool {
        match self.in_flight.lock().unwrap().get(&request_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}
