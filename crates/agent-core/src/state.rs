//! Shared state threaded through the agent pipeline
//!
//! Agents never mutate [`AgentState`] directly. Each one returns a
//! [`StateUpdate`] that the driver merges with [`AgentState::apply`]. The
//! [`StateSchema`] decides per key how the merge happens:
//!
//! - [`Reducer::Append`]: the update must be a list and is concatenated onto
//!   the existing list, in invocation order, keeping duplicates.
//! - [`Reducer::Overwrite`]: the update replaces the previous value in full.
//!
//! # Example
//!
//! ```
//! use agent_core::{AgentState, StateUpdate, state::keys};
//! use serde_json::json;
//!
//! let mut state = AgentState::new().with_user_request("EV market outlook");
//! state
//!     .apply(StateUpdate::new().set(keys::COMPANIES, json!(["Tesla"])))
//!     .unwrap();
//! state
//!     .apply(StateUpdate::new().set(keys::COMPANIES, json!(["BYD", "Tesla"])))
//!     .unwrap();
//!
//! assert_eq!(state.string_list(keys::COMPANIES), vec!["Tesla", "BYD", "Tesla"]);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Well-known state keys
pub mod keys {
    /// Original natural-language request
    pub const USER_REQUEST: &str = "user_request";
    /// Structured market report (object)
    pub const MARKET_RESEARCH: &str = "market_research";
    pub const MARKET_RESEARCH_DONE: &str = "market_research_done";
    /// Company names discovered so far (list)
    pub const COMPANIES: &str = "companies";
    /// Source URLs (list)
    pub const REFERENCES: &str = "references";
    /// Fetched documents available for reuse (list)
    pub const DOCUMENTS: &str = "documents";
    /// Per-company analysis keyed by company name (object)
    pub const COMPANY_ANALYSIS: &str = "company_analysis";
    pub const COMPANY_ANALYSIS_DONE: &str = "company_analysis_done";
    /// Tickers chosen by the stock analyzer
    pub const TICKER_SYMBOLS: &str = "ticker_symbols";
    pub const STOCK_ANALYSIS: &str = "stock_analysis";
    /// Raw per-ticker market data (object)
    pub const STOCK_DATA: &str = "stock_data";
    /// Progress messages (list)
    pub const MESSAGES: &str = "messages";
    /// Last failure message
    pub const ERROR: &str = "error";
    /// Name of the agent that failed last
    pub const AGENT: &str = "agent";
}

/// Merge rule for a state key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reducer {
    /// Concatenate list updates onto the existing list
    Append,
    /// Replace the existing value
    Overwrite,
}

/// Declares which keys are list-typed; everything else is overwritten
#[derive(Debug, Clone)]
pub struct StateSchema {
    reducers: HashMap<String, Reducer>,
}

impl StateSchema {
    /// Schema without list fields
    pub fn empty() -> Self {
        Self {
            reducers: HashMap::new(),
        }
    }

    /// Declare `key` as a list field
    pub fn with_list(mut self, key: impl Into<String>) -> Self {
        self.reducers.insert(key.into(), Reducer::Append);
        self
    }

    /// Set an explicit reducer for `key`
    pub fn with_reducer(mut self, key: impl Into<String>, reducer: Reducer) -> Self {
        self.reducers.insert(key.into(), reducer);
        self
    }

    /// Reducer used for `key`
    pub fn reducer(&self, key: &str) -> Reducer {
        self.reducers
            .get(key)
            .copied()
            .unwrap_or(Reducer::Overwrite)
    }
}

impl StateSchema {
    /// The pipeline schema: companies, references, documents and messages are lists
    pub fn ev_pipeline() -> Self {
        Self::empty()
            .with_list(keys::COMPANIES)
            .with_list(keys::REFERENCES)
            .with_list(keys::DOCUMENTS)
            .with_list(keys::MESSAGES)
    }
}

impl Default for StateSchema {
    fn default() -> Self {
        Self::ev_pipeline()
    }
}

/// A progress message left by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub sender: String,
    pub content: String,
}

impl AgentMessage {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }
}

/// Partial update returned by an agent
///
/// Keys keep insertion order. Setting the same key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    entries: Vec<(String, Value)>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key.into(), value);
        self
    }

    /// Serialize `value` and set it under `key`
    pub fn set_typed<T: Serialize>(self, key: impl Into<String>, value: &T) -> Result<Self> {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(json_value) => Ok(self.set(key, json_value)),
            Err(source) => Err(Error::StateValue { key, source }),
        }
    }

    /// Append a message to the `messages` list of this update
    pub fn push_message(mut self, sender: &str, content: impl Into<String>) -> Self {
        let message = serde_json::json!({ "sender": sender, "content": content.into() });
        match self.entries.iter_mut().find(|(k, _)| k == keys::MESSAGES) {
            Some((_, Value::Array(items))) => items.push(message),
            Some((_, other)) => *other = Value::Array(vec![message]),
            None => self
                .entries
                .push((keys::MESSAGES.to_string(), Value::Array(vec![message]))),
        }
        self
    }

    /// Error update recorded when an agent fails
    pub fn failure(agent: &str, error: &dyn std::fmt::Display) -> Self {
        Self::new()
            .set(keys::ERROR, Value::String(error.to_string()))
            .set(keys::AGENT, Value::String(agent.to_string()))
            .push_message(agent, format!("{agent} failed: {error}"))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }
}

/// Shared state passed between agents
#[derive(Debug, Clone)]
pub struct AgentState {
    data: Map<String, Value>,
    schema: Arc<StateSchema>,
}

impl Default for AgentState {
    fn default() -> Self {
        Self::with_schema(StateSchema::default())
    }
}

impl AgentState {
    /// Empty state using the pipeline schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state using a custom schema
    pub fn with_schema(schema: StateSchema) -> Self {
        Self {
            data: Map::new(),
            schema: Arc::new(schema),
        }
    }

    pub fn with_user_request(mut self, request: impl Into<String>) -> Self {
        self.data
            .insert(keys::USER_REQUEST.to_string(), Value::String(request.into()));
        self
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Deserialize the value under `key`
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|source| {
                    Error::StateValue {
                        key: key.to_string(),
                        source,
                    }
                })?;
                Ok(Some(typed))
            }
        }
    }

    pub fn user_request(&self) -> Option<&str> {
        self.get(keys::USER_REQUEST).and_then(Value::as_str)
    }

    /// String entries of a list field; non-string items are skipped
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Messages accumulated so far; malformed entries are skipped
    pub fn messages(&self) -> Vec<AgentMessage> {
        self.get(keys::MESSAGES)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a boolean flag is set to true
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge an agent update into the state
    ///
    /// The update is validated before anything is written, so a rejected
    /// update leaves the state untouched.
    pub fn apply(&mut self, update: StateUpdate) -> Result<()> {
        for (key, value) in update.iter() {
            if self.schema.reducer(key) != Reducer::Append {
                continue;
            }
            if !value.is_array() {
                return Err(Error::StateMerge {
                    key: key.to_string(),
                    message: format!("expected a list update, got {}", type_name(value)),
                });
            }
            match self.data.get(key) {
                None | Some(Value::Null | Value::Array(_)) => {}
                Some(existing) => {
                    return Err(Error::StateMerge {
                        key: key.to_string(),
                        message: format!("existing value is {}, not a list", type_name(existing)),
                    });
                }
            }
        }

        for (key, value) in update.entries {
            match self.schema.reducer(&key) {
                Reducer::Overwrite => {
                    self.data.insert(key, value);
                }
                Reducer::Append => {
                    let Value::Array(items) = value else {
                        continue;
                    };
                    match self.data.get_mut(&key) {
                        Some(Value::Array(existing)) => existing.extend(items),
                        _ => {
                            self.data.insert(key, Value::Array(items));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Snapshot of the whole state as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

impl Serialize for AgentState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
