//! In-memory [`SparqlStore`] for tests.
//!
//! SELECT responses are scripted in order; updates are recorded and succeed
//! unless they contain a registered failure marker.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::{SparqlStore, StoreError};
use crate::queries::ELIGIBILITY_VARS;
use crate::sparql::{RdfTerm, ResultBindings, ResultsHead, SelectResults, Solution};

#[derive(Default)]
pub struct MockStore {
    selects: Mutex<VecDeque<Result<SelectResults, StoreError>>>,
    failing_updates: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    updates: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response for the next SELECT.
    pub fn push_select(&self, response: Result<SelectResults, StoreError>) {
        self.selects.lock().unwrap().push_back(response);
    }

    /// Fail every update whose text contains `needle` with a 500.
    pub fn fail_updates_containing(&self, needle: impl Into<String>) {
        self.failing_updates.lock().unwrap().push(needle.into());
    }

    /// SELECT queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Updates accepted so far. Failed updates are not recorded.
    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }

    /// Wrap solutions as an eligibility-query response.
    pub fn results(bindings: Vec<Solution>) -> SelectResults {
        let vars = ELIGIBILITY_VARS.iter().map(|v| v.to_string()).collect();
        SelectResults {
            head: ResultsHead { vars },
            results: ResultBindings { bindings },
        }
    }
}

/// One solution where values starting with `http` bind as URIs and the
/// rest as plain literals.
pub fn binding_row<S: AsRef<str>>(pairs: &[(&str, S)]) -> Solution {
    pairs
        .iter()
        .map(|(var, value)| {
            let value = value.as_ref();
            let term = if value.starts_with("http") {
                RdfTerm::uri(value)
            } else {
                RdfTerm::literal(value)
            };
            (var.to_string(), term)
        })
        .collect()
}

#[async_trait::async_trait]
impl SparqlStore for MockStore {
    async fn select(&self, query: &str) -> Result<SelectResults, StoreError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.selects
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SelectResults::default()))
    }

    async fn update(&self, update: &str) -> Result<(), StoreError> {
        let fails = self
            .failing_updates
            .lock()
            .unwrap()
            .iter()
            .any(|needle| update.contains(needle.as_str()));
        if fails {
            return Err(StoreError::Status {
                status: 500,
                body: "injected update failure".to_string(),
            });
        }
        self.updates.lock().unwrap().push(update.to_string());
        Ok(())
    }
}
