//! SPARQL endpoint access and the shared graph client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;

use subnote_core::config::{Settings, SparqlSettings};
use subnote_core::{OrgGraphTemplate, SubnoteError};

use crate::sparql::{Iri, SelectResults};

/// Failures talking to the triple store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SPARQL transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SPARQL endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed SPARQL results: {0}")]
    Decode(String),
}

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph configuration error: {0}")]
    Config(#[from] SubnoteError),

    #[error("Eligibility query failed: {0}")]
    QueryFailure(#[source] StoreError),

    #[error("Notification insert failed: {0}")]
    WriteFailure(#[source] StoreError),

    #[error("Invalid notification request: {0}")]
    InvalidRequest(String),
}

/// Transport seam between the query builders and the triple store.
///
/// Implementations execute exactly what they are given: one request per call,
/// no retries.
#[async_trait::async_trait]
pub trait SparqlStore: Send + Sync {
    /// Run a SELECT query and decode the JSON results.
    async fn select(&self, query: &str) -> Result<SelectResults, StoreError>;

    /// Run a SPARQL update as a single request.
    async fn update(&self, update: &str) -> Result<(), StoreError>;
}

/// SPARQL 1.1 Protocol over HTTP.
pub struct HttpStore {
    http: reqwest::Client,
    endpoint: String,
    sudo: bool,
}

impl HttpStore {
    pub fn new(settings: &SparqlSettings) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            sudo: settings.sudo,
        })
    }

    fn post(&self, form: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let request = self.http.post(&self.endpoint).form(form);
        if self.sudo {
            request.header("mu-auth-sudo", "true")
        } else {
            request
        }
    }
}

#[async_trait::async_trait]
impl SparqlStore for HttpStore {
    async fn select(&self, query: &str) -> Result<SelectResults, StoreError> {
        let response = self
            .post(&[("query", query)])
            .header(ACCEPT, "application/sparql-results+json")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        response
            .json::<SelectResults>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn update(&self, update: &str) -> Result<(), StoreError> {
        let response = self.post(&[("update", update)]).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Graph locations every query and insert is scoped to.
#[derive(Debug, Clone)]
pub struct GraphLayout {
    pub org_graphs: OrgGraphTemplate,
    pub system_email_graph: Iri,
    pub outbox_folder: Iri,
}

impl GraphLayout {
    pub fn from_settings(settings: &Settings) -> Result<Self, GraphError> {
        let iri = |key: &str, value: &str| {
            Iri::parse(value).map_err(|e| SubnoteError::Config(format!("{key}: {e}")))
        };
        Ok(Self {
            org_graphs: settings.org_graph_template()?,
            system_email_graph: iri("graphs.system_email_graph", &settings.graphs.system_email_graph)?,
            outbox_folder: iri("graphs.outbox_folder_uri", &settings.graphs.outbox_folder_uri)?,
        })
    }
}

/// Shared client for all knowledge graph operations.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    store: Arc<dyn SparqlStore>,
    layout: Arc<GraphLayout>,
    from_address: Arc<str>,
}

impl GraphClient {
    /// Build an HTTP-backed client from validated settings.
    pub fn connect(settings: &Settings) -> Result<Self, GraphError> {
        let store = HttpStore::new(&settings.sparql)
            .map_err(|e| SubnoteError::Config(format!("sparql client: {e}")))?;
        let client = Self::with_store(Arc::new(store), settings)?;
        tracing::info!(
            endpoint = %settings.sparql.endpoint,
            sudo = settings.sparql.sudo,
            "SPARQL client ready"
        );
        Ok(client)
    }

    /// Build a client over any store implementation.
    pub fn with_store(store: Arc<dyn SparqlStore>, settings: &Settings) -> Result<Self, GraphError> {
        let from_address = settings.email.from_address.trim();
        if from_address.is_empty() {
            return Err(SubnoteError::Config("email.from_address must be set".to_string()).into());
        }
        Ok(Self {
            store,
            layout: Arc::new(GraphLayout::from_settings(settings)?),
            from_address: Arc::from(from_address),
        })
    }

    pub fn layout(&self) -> &GraphLayout {
        &self.layout
    }

    /// Sender address written on every notification.
    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub(crate) fn store(&self) -> &dyn SparqlStore {
        self.store.as_ref()
    }
}
