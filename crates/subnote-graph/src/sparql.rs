//! SPARQL term escaping, the insert builder, and the JSON results model.
//!
//! Nothing reaches query text without passing through [`Iri`] or
//! [`escape_string`].

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use subnote_core::naming::{has_scheme, invalid_iri_char};

use crate::client::StoreError;

/// Prefix declarations shared by every query and update.
pub const PREFIXES: &str = "\
PREFIX besluit: <http://data.vlaanderen.be/ns/besluit#>
PREFIX dct: <http://purl.org/dc/terms/>
PREFIX ext: <http://mu.semte.ch/vocabularies/ext/>
PREFIX meb: <http://rdf.myexperiment.org/ontologies/base/>
PREFIX mu: <http://mu.semte.ch/vocabularies/core/>
PREFIX nmo: <http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#>
PREFIX pav: <http://purl.org/pav/>
PREFIX prov: <http://www.w3.org/ns/prov#>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
";

/// Datatype of the opt-in flag on organizational units.
pub const TYPED_BOOLEAN: &str = "http://mu.semte.ch/vocabularies/typed-literals/boolean";

// ── Terms ────────────────────────────────────────────────────────

/// An absolute IRI that is safe to embed as `<...>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iri(String);

impl Iri {
    pub fn parse(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if let Some(c) = invalid_iri_char(&value) {
            return Err(format!("{value:?} contains {c:?}, which is not allowed in an IRI"));
        }
        if !has_scheme(&value) {
            return Err(format!("{value:?} is not an absolute IRI"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Render `value` as a double-quoted SPARQL string literal.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Iri(Iri),
    Literal(String),
    /// A prefixed name from [`PREFIXES`], e.g. `nmo:Email`.
    Name(&'static str),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => fmt::Display::fmt(iri, f),
            Term::Literal(value) => f.write_str(&escape_string(value)),
            Term::Name(name) => f.write_str(name),
        }
    }
}

// ── Insert builder ───────────────────────────────────────────────

/// `INSERT DATA` for a single subject in a single named graph.
#[derive(Debug, Clone)]
pub struct InsertData {
    graph: Iri,
    subject: Iri,
    properties: Vec<(&'static str, Term)>,
}

impl InsertData {
    pub fn new(graph: Iri, subject: Iri) -> Self {
        Self {
            graph,
            subject,
            properties: Vec::new(),
        }
    }

    pub fn push(&mut self, predicate: &'static str, object: Term) -> &mut Self {
        self.properties.push((predicate, object));
        self
    }

    /// Emit the triple only when `object` is present.
    pub fn push_opt(&mut self, predicate: &'static str, object: Option<Term>) -> &mut Self {
        if let Some(object) = object {
            self.properties.push((predicate, object));
        }
        self
    }

    pub fn graph(&self) -> &Iri {
        &self.graph
    }

    pub fn subject(&self) -> &Iri {
        &self.subject
    }

    pub fn properties(&self) -> &[(&'static str, Term)] {
        &self.properties
    }

    /// All objects of `predicate`, in insertion order.
    pub fn objects<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.properties
            .iter()
            .filter(move |(p, _)| *p == predicate)
            .map(|(_, o)| o)
    }

    pub fn to_sparql(&self) -> String {
        let mut body = String::new();
        let last = self.properties.len().saturating_sub(1);
        for (i, (predicate, object)) in self.properties.iter().enumerate() {
            let terminator = if i == last { " ." } else { " ;" };
            body.push_str(&format!("\n      {predicate} {object}{terminator}"));
        }
        format!(
            "{PREFIXES}\nINSERT DATA {{\n  GRAPH {} {{\n    {}{body}\n  }}\n}}\n",
            self.graph, self.subject
        )
    }
}

// ── SELECT results ───────────────────────────────────────────────

/// `application/sparql-results+json` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub head: ResultsHead,
    #[serde(default)]
    pub results: ResultBindings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultBindings {
    #[serde(default)]
    pub bindings: Vec<Solution>,
}

/// One result row: variable name to bound term.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Solution(HashMap<String, RdfTerm>);

/// A bound RDF term as encoded in SPARQL JSON results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RdfTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

impl Solution {
    pub fn get(&self, var: &str) -> Option<&RdfTerm> {
        self.0.get(var)
    }

    /// Lexical value of `var`, failing if it is unbound.
    pub fn value(&self, var: &str) -> Result<&str, StoreError> {
        self.get(var)
            .map(|term| term.value.as_str())
            .ok_or_else(|| StoreError::Decode(format!("variable ?{var} is unbound")))
    }
}

impl FromIterator<(String, RdfTerm)> for Solution {
    fn from_iter<I: IntoIterator<Item = (String, RdfTerm)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl RdfTerm {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }
}

impl SelectResults {
    pub fn solutions(&self) -> &[Solution] {
        &self.results.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string_quotes_and_backslashes() {
        assert_eq!(escape_string("plain"), "\"plain\"");
        assert_eq!(escape_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(escape_string(r"C:\temp"), r#""C:\\temp""#);
        assert_eq!(escape_string("a\nb\tc\r"), r#""a\nb\tc\r""#);
    }

    #[test]
    fn test_escape_string_cannot_break_out() {
        let hostile = "x\" } ; DROP ALL ; INSERT DATA { <a> <b> \"c";
        let escaped = escape_string(hostile);
        let inner = &escaped[1..escaped.len() - 1];
        // Every quote inside the literal is preceded by a backslash.
        for (i, c) in inner.char_indices() {
            if c == '"' {
                assert_eq!(&inner[i - 1..i], "\\");
            }
        }
    }

    #[test]
    fn test_iri_parse() {
        assert!(Iri::parse("http://data.lblod.info/submissions/1").is_ok());
        assert!(Iri::parse("urn:uuid:1234").is_ok());
        assert!(Iri::parse("relative/path").is_err());
        assert!(Iri::parse("http://x/> . <http://y").is_err());
        assert!(Iri::parse("http://x/a b").is_err());
        assert!(Iri::parse("").is_err());
        assert_eq!(
            Iri::parse("http://example.org/a").unwrap().to_string(),
            "<http://example.org/a>"
        );
    }

    #[test]
    fn test_term_display() {
        assert_eq!(Term::Name("nmo:Email").to_string(), "nmo:Email");
        assert_eq!(Term::Literal("a\"b".to_string()).to_string(), r#""a\"b""#);
    }

    #[test]
    fn test_insert_data_renders_single_graph_block() {
        let mut insert = InsertData::new(
            Iri::parse("http://example.org/g").unwrap(),
            Iri::parse("http://example.org/s").unwrap(),
        );
        insert
            .push("rdf:type", Term::Name("nmo:Email"))
            .push_opt("nmo:bcc", None)
            .push("dct:relation", Term::Iri(Iri::parse("http://example.org/o").unwrap()));

        let text = insert.to_sparql();
        assert!(text.starts_with("PREFIX "));
        assert_eq!(text.matches("INSERT DATA").count(), 1);
        assert!(text.contains("GRAPH <http://example.org/g> {"));
        assert!(text.contains("<http://example.org/s>\n      rdf:type nmo:Email ;"));
        assert!(text.contains("dct:relation <http://example.org/o> ."));
        assert!(!text.contains("nmo:bcc"));
        assert_eq!(insert.objects("dct:relation").count(), 1);
    }

    #[test]
    fn test_select_results_decode() {
        let json = r#"{
          "head": {"vars": ["s", "label"]},
          "results": {"bindings": [
            {"s": {"type": "uri", "value": "http://example.org/s"},
             "label": {"type": "literal", "value": "Gent", "xml:lang": "nl"}}
          ]}
        }"#;
        let results: SelectResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.head.vars, vec!["s", "label"]);
        let row = &results.solutions()[0];
        assert_eq!(row.value("s").unwrap(), "http://example.org/s");
        assert_eq!(row.get("label").unwrap().lang.as_deref(), Some("nl"));
        assert!(row.value("missing").is_err());
    }
}
