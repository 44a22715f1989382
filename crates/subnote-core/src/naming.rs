//! Per-unit private graph naming.
//!
//! Every organizational unit keeps its submissions in a named graph whose IRI
//! is `base + uuid + suffix`. The template is validated once at startup and
//! is the only place that knows how graph IRIs are assembled.

use crate::error::SubnoteError;

/// Probe value used to check that a template round-trips.
const PROBE_UUID: &str = "5f0c3f4e-0000-4000-8000-000000000000";

/// Maps a unit UUID to the IRI of the unit's private data graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgGraphTemplate {
    base: String,
    suffix: String,
}

impl OrgGraphTemplate {
    /// Build and validate a template.
    pub fn new(base: impl Into<String>, suffix: impl Into<String>) -> Result<Self, SubnoteError> {
        let template = Self {
            base: base.into(),
            suffix: suffix.into(),
        };
        template.validate()?;
        Ok(template)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Check that the template yields absolute IRIs and that every generated
    /// IRI maps back to the UUID it was built from.
    pub fn validate(&self) -> Result<(), SubnoteError> {
        if !has_scheme(&self.base) {
            return Err(SubnoteError::GraphTemplate(format!(
                "base {:?} is not an absolute IRI prefix",
                self.base
            )));
        }
        for (part, value) in [("base", &self.base), ("suffix", &self.suffix)] {
            if let Some(c) = invalid_iri_char(value) {
                return Err(SubnoteError::GraphTemplate(format!(
                    "{part} {value:?} contains character {c:?} not allowed in an IRI"
                )));
            }
        }

        let graph = self.graph_for(PROBE_UUID)?;
        if self.uuid_of(&graph) != Some(PROBE_UUID) {
            return Err(SubnoteError::GraphTemplate(format!(
                "graph {graph} does not map back to its uuid"
            )));
        }
        Ok(())
    }

    /// IRI of the private graph for the unit with the given UUID.
    pub fn graph_for(&self, uuid: &str) -> Result<String, SubnoteError> {
        if uuid.is_empty() {
            return Err(SubnoteError::GraphTemplate("empty unit uuid".to_string()));
        }
        if let Some(c) = uuid
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(SubnoteError::GraphTemplate(format!(
                "unit uuid {uuid:?} contains unexpected character {c:?}"
            )));
        }
        Ok(format!("{}{}{}", self.base, uuid, self.suffix))
    }

    /// Inverse of [`graph_for`](Self::graph_for).
    pub fn uuid_of<'a>(&self, graph: &'a str) -> Option<&'a str> {
        graph
            .strip_prefix(self.base.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|uuid| !uuid.is_empty())
    }
}

/// First character of `value` that may not appear inside a SPARQL `IRIREF`.
pub fn invalid_iri_char(value: &str) -> Option<char> {
    value
        .chars()
        .find(|c| matches!(*c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') || *c <= ' ')
}

/// `scheme:` per RFC 3987: a letter followed by letters, digits, `+`, `-` or `.`.
pub fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
