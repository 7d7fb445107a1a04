//! Query requests and transport responses

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::index::StreamIndex;

/// Language of the submitted query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Xquery,
    Javascript,
    Sparql,
}

impl QueryType {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Xquery => "xquery",
            QueryType::Javascript => "javascript",
            QueryType::Sparql => "sparql",
        }
    }
}

/// Connection parameters, passed through to the transport untouched
pub type ConnectionParams = BTreeMap<String, String>;

/// An ad-hoc query to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub query_type: QueryType,
    pub connection: ConnectionParams,
    /// Allow the transport to redirect large results to disk
    pub prefer_stream: bool,
}

impl QueryRequest {
    /// Creates a request that prefers streaming
    pub fn new(query: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            query: query.into(),
            query_type,
            connection: ConnectionParams::new(),
            prefer_stream: true,
        }
    }

    /// Forces the transport to buffer the whole result in memory
    pub fn buffer_only(mut self) -> Self {
        self.prefer_stream = false;
        self
    }
}

/// How the transport delivered a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    /// Result was written to disk as individually addressable parts
    Stream(StreamIndex),
    /// Result fit in memory; raw multipart text
    Buffer(String),
}

impl QueryResponse {
    /// Returns the mode name for observability
    pub fn mode_name(&self) -> &'static str {
        match self {
            QueryResponse::Stream(_) => "stream",
            QueryResponse::Buffer(_) => "buffer",
        }
    }
}
