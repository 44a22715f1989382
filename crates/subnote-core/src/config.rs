//! Configuration management for the submission notifier.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`SUBNOTE__` prefix, `__` between sections)
//! 2. Config file (`subnote.toml`)
//! 3. Defaults

use std::path::Path;

use serde::Deserialize;

use crate::error::SubnoteError;
use crate::naming::{has_scheme, invalid_iri_char, OrgGraphTemplate};

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sparql: SparqlSettings,
    #[serde(default)]
    pub graphs: GraphSettings,
    #[serde(default)]
    pub email: EmailSettings,
}

/// Where and how to reach the SPARQL endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Send `mu-auth-sudo: true` so queries bypass per-user graph scoping.
    #[serde(default = "default_true")]
    pub sudo: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Graph locations read from and written to.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_org_graph_base")]
    pub org_graph_base: String,

    #[serde(default = "default_org_graph_suffix")]
    pub org_graph_suffix: String,

    #[serde(default = "default_system_email_graph")]
    pub system_email_graph: String,

    #[serde(default = "default_outbox_folder_uri")]
    pub outbox_folder_uri: String,
}

/// Email composition settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Sender address written as `nmo:messageFrom`. Required.
    #[serde(default)]
    pub from_address: String,

    #[serde(default)]
    pub bcc_address: Option<String>,

    /// Prefix for minted email IRIs; a fresh UUID is appended.
    #[serde(default = "default_email_base_uri")]
    pub email_base_uri: String,

    #[serde(default = "default_subject")]
    pub subject: String,

    /// Link included in the message body, if set.
    #[serde(default)]
    pub app_base_url: Option<String>,
}

impl Settings {
    /// Load settings from `<file_prefix>.{toml,yaml,json}` (optional) and
    /// `SUBNOTE__*` environment variables, then validate.
    pub fn load(file_prefix: &str) -> Result<Self, SubnoteError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("SUBNOTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(endpoint = %settings.sparql.endpoint, "Configuration loaded");
        Ok(settings)
    }

    /// Load settings from a single file, without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, SubnoteError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would produce malformed queries or emails.
    pub fn validate(&self) -> Result<(), SubnoteError> {
        if self.sparql.endpoint.trim().is_empty() {
            return Err(SubnoteError::Config("sparql.endpoint is empty".to_string()));
        }
        if self.email.from_address.trim().is_empty() {
            return Err(SubnoteError::Config(
                "email.from_address must be set".to_string(),
            ));
        }
        for (key, value) in [
            ("graphs.system_email_graph", &self.graphs.system_email_graph),
            ("graphs.outbox_folder_uri", &self.graphs.outbox_folder_uri),
            ("email.email_base_uri", &self.email.email_base_uri),
        ] {
            if !has_scheme(value) || invalid_iri_char(value).is_some() {
                return Err(SubnoteError::Config(format!(
                    "{key} is not a valid IRI: {value:?}"
                )));
            }
        }
        self.org_graph_template()?;
        Ok(())
    }

    pub fn org_graph_template(&self) -> Result<OrgGraphTemplate, SubnoteError> {
        OrgGraphTemplate::new(
            self.graphs.org_graph_base.clone(),
            self.graphs.org_graph_suffix.clone(),
        )
    }
}

fn default_endpoint() -> String {
    "http://database:8890/sparql".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_org_graph_base() -> String {
    "http://mu.semte.ch/graphs/organizations/".to_string()
}

fn default_org_graph_suffix() -> String {
    "/LoketLB-toezichtGebruiker".to_string()
}

fn default_system_email_graph() -> String {
    "http://mu.semte.ch/graphs/system/email".to_string()
}

fn default_outbox_folder_uri() -> String {
    "http://data.lblod.info/id/mail-folders/2".to_string()
}

fn default_email_base_uri() -> String {
    "http://data.lblod.info/id/emails/".to_string()
}

fn default_subject() -> String {
    "New submissions received".to_string()
}

impl Default for SparqlSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            sudo: default_true(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            org_graph_base: default_org_graph_base(),
            org_graph_suffix: default_org_graph_suffix(),
            system_email_graph: default_system_email_graph(),
            outbox_folder_uri: default_outbox_folder_uri(),
        }
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from_address: String::new(),
            bcc_address: None,
            email_base_uri: default_email_base_uri(),
            subject: default_subject(),
            app_base_url: None,
        }
    }
}
