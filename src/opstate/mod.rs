//! # Operational State
//!
//! Boundary types for the operational-state query service. A source streams
//! `(path, value, value type)` records for one device until end-of-stream
//! or an error; the registry's read-only path sets decide which of those
//! records are state rather than configuration.
//!
//! ```text
//! OpStateSource::get_op_state(OpStateRequest { device_id, subscribe })
//!   → OpStateStream of OpStateRecord
//!   → StateFilter::state_only()   (drops records at configurable paths)
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::registry::ModelEntry;

/// Type tag carried with every streamed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Empty,
    String,
    Int,
    Uint,
    Bool,
    Decimal,
    Float,
    Bytes,
    LeafList,
}

impl ValueType {
    /// Best-fit type tag for a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Empty,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) if n.is_u64() => ValueType::Uint,
            Value::Number(n) if n.is_i64() => ValueType::Int,
            Value::Number(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::LeafList,
            Value::Object(_) => ValueType::Bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpStateRequest {
    pub device_id: String,
    /// Keep the stream open for subsequent changes.
    #[serde(default)]
    pub subscribe: bool,
}

impl OpStateRequest {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            subscribe: false,
        }
    }

    pub fn subscribe(mut self) -> Self {
        self.subscribe = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpStateRecord {
    pub path: String,
    pub value: Value,
    pub value_type: ValueType,
}

impl OpStateRecord {
    pub fn new(path: &str, value: Value) -> Self {
        let value_type = ValueType::of(&value);
        Self {
            path: path.to_string(),
            value,
            value_type,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpStateError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("stream failed: {0}")]
    Stream(String),

    #[error("subscribe requests never end and cannot be collected: {0}")]
    SubscribeNotCollectable(String),
}

pub type OpStateStream = BoxStream<'static, Result<OpStateRecord, OpStateError>>;

/// A producer of operational-state records, e.g. a gRPC client.
#[async_trait]
pub trait OpStateSource: Send + Sync {
    async fn get_op_state(&self, request: OpStateRequest) -> Result<OpStateStream, OpStateError>;
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathClass {
    State,
    Config,
}

/// Classifies record paths using one model's read-only paths.
#[derive(Debug, Clone)]
pub struct StateFilter {
    entry: Arc<ModelEntry>,
}

impl StateFilter {
    pub fn new(entry: Arc<ModelEntry>) -> Self {
        Self { entry }
    }

    pub fn classify(&self, path: &str) -> PathClass {
        if self.entry.is_state_path(path) {
            PathClass::State
        } else {
            PathClass::Config
        }
    }

    /// Keep only state records. Errors pass through.
    pub fn state_only(&self, stream: OpStateStream) -> OpStateStream {
        let entry = Arc::clone(&self.entry);
        stream
            .filter(move |item| {
                let keep = match item {
                    Ok(record) => entry.is_state_path(&record.path),
                    Err(_) => true,
                };
                futures::future::ready(keep)
            })
            .boxed()
    }
}

/// Drain a one-shot query into a list, optionally keeping only state.
///
/// Stops at end-of-stream; the first stream error is returned. Subscribe
/// requests are rejected; consume those through [`OpStateSource`] directly.
pub async fn collect_op_state(
    source: &dyn OpStateSource,
    request: OpStateRequest,
    filter: Option<&StateFilter>,
) -> Result<Vec<OpStateRecord>, OpStateError> {
    if request.subscribe {
        return Err(OpStateError::SubscribeNotCollectable(request.device_id));
    }
    let device_id = request.device_id.clone();
    let mut stream = source.get_op_state(request).await?;
    if let Some(filter) = filter {
        stream = filter.state_only(stream);
    }

    let mut records = Vec::new();
    while let Some(item) = stream.next().await {
        records.push(item?);
    }
    tracing::debug!(device = %device_id, count = records.len(), "Collected operational state");
    Ok(records)
}
