//! subnote-graph: SPARQL client for the shared knowledge graph.
//!
//! This crate is the single access point to the triple store. The eligibility
//! query lives in [`queries`], the notification insert in [`mutations`]; both
//! go through the [`SparqlStore`] seam so every interpolated value passes the
//! escaping in [`sparql`].

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod mutations;
pub mod queries;
pub mod sparql;

pub use client::{GraphClient, GraphError, HttpStore, SparqlStore, StoreError};
pub use queries::NotificationExclusion;
pub use sparql::{InsertData, Iri, SelectResults, Term};
