//! Console session: one gateway, one request, replayed on demand

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{QueryGateway, QueryOutcome};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::results::ResultsController;
use crate::transport::{DirectoryPartStore, QueryRequest, ReplayTransport, ResponseSpooler};

use super::args::QueryArgs;
use super::config::ConsoleConfig;
use super::errors::{CliError, CliResult};
use super::io::{outcome_view, state_view};

/// One console command, read as a JSON line such as `{"op":"jump","page":2}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConsoleOp {
    NextPage,
    PrevPage,
    Jump { page: isize },
    NextRecord,
    PrevRecord,
    Select { record: isize },
    Show,
    Reset,
    /// Execute the query again
    Rerun,
}

impl ConsoleOp {
    /// Parse one input line
    pub fn parse(line: &str) -> CliResult<Self> {
        serde_json::from_str(line)
            .map_err(|e| CliError::invalid_command(format!("Invalid command: {}", e)))
    }
}

/// Everything needed to execute and navigate one query
pub struct Session {
    gateway: QueryGateway,
    request: QueryRequest,
}

impl Session {
    /// Build the pipeline from configuration.
    ///
    /// Also applies the configured log level.
    pub fn open(args: &QueryArgs) -> CliResult<Self> {
        let config = ConsoleConfig::load_or_default(args.config.as_deref())?;
        Logger::set_min_severity(config.severity()?);

        let page_size = config.page_size.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("page_size", page_size.as_str()), ("spool_dir", config.spool_dir.as_str())],
        );

        Ok(Self::with_config(args, &config))
    }

    /// Build the pipeline from an already validated configuration
    pub fn with_config(args: &QueryArgs, config: &ConsoleConfig) -> Self {
        let spooler = ResponseSpooler::new(config.spool_path(), config.max_buffer_bytes);
        let transport = Arc::new(ReplayTransport::new(&args.response, spooler));
        let results = Arc::new(ResultsController::new(
            Arc::new(DirectoryPartStore::new()),
            config.page_size,
        ));

        let mut request = QueryRequest::new(args.query.clone(), args.query_type);
        if !config.prefer_stream {
            request = request.buffer_only();
        }

        Self {
            gateway: QueryGateway::new(transport, results),
            request,
        }
    }

    pub fn results(&self) -> &ResultsController {
        self.gateway.results()
    }

    /// Execute the session's query
    pub async fn execute(&self) -> QueryOutcome {
        self.gateway.execute(&self.request).await
    }

    /// Apply one console command and describe the result
    pub async fn apply(&self, op: ConsoleOp) -> Value {
        let results = self.results();
        let result = match op {
            ConsoleOp::NextPage => json!({"page": results.next_page().await}),
            ConsoleOp::PrevPage => json!({"page": results.prev_page().await}),
            ConsoleOp::Jump { page } => json!({"page": results.jump_to_page(page).await}),
            ConsoleOp::NextRecord => json!({"record": results.go_to_next_record()}),
            ConsoleOp::PrevRecord => json!({"record": results.go_to_prev_record()}),
            ConsoleOp::Select { record } => json!({"record": results.set_active_record(record)}),
            ConsoleOp::Show => Value::Null,
            ConsoleOp::Reset => {
                results.reset();
                Value::Null
            }
            ConsoleOp::Rerun => outcome_view(&self.execute().await),
        };

        json!({
            "result": result,
            "state": state_view(&results.snapshot()),
        })
    }
}
