//! Read operations: the eligibility query.

use subnote_core::{EligibilityRow, OrgGraphTemplate};

use crate::client::{GraphClient, GraphError, StoreError};
use crate::sparql::{escape_string, Iri, SelectResults, Solution, PREFIXES, TYPED_BOOLEAN};

/// Projection variables of the eligibility query, in SELECT order.
pub const ELIGIBILITY_VARS: [&str; 8] = [
    "targetUnit",
    "targetUnitUuid",
    "targetUnitLabel",
    "creatorUnitLabel",
    "decisionTypeLabel",
    "sentDate",
    "emailAddress",
    "submissionUri",
];

/// "Already notified" check: no email in the system email graph relates both
/// the submission and the unit.
///
/// Renders a `FILTER NOT EXISTS` block over the two given variables. Absence
/// of a matching email is what makes a pair eligible.
#[derive(Debug, Clone, Copy)]
pub struct NotificationExclusion<'a> {
    pub email_graph: &'a Iri,
    pub submission_var: &'a str,
    pub unit_var: &'a str,
}

impl NotificationExclusion<'_> {
    pub fn render(&self) -> String {
        format!(
            "FILTER NOT EXISTS {{
        GRAPH {graph} {{
          ?notifiedEmail a nmo:Email ;
            dct:relation ?{submission} ;
            dct:relation ?{unit} .
        }}
      }}",
            graph = self.email_graph,
            submission = self.submission_var,
            unit = self.unit_var,
        )
    }
}

/// `BIND(IRI(CONCAT(base, ?uuid, suffix)) AS ?graph)` for the given template.
pub fn graph_bind(template: &OrgGraphTemplate, uuid_var: &str, graph_var: &str) -> String {
    format!(
        "BIND(IRI(CONCAT({}, ?{uuid_var}, {})) AS ?{graph_var})",
        escape_string(template.base()),
        escape_string(template.suffix()),
    )
}

/// Build the eligibility query.
///
/// One row per surviving (submission, target unit) pair; `DISTINCT` applies
/// to whole rows, so a submission related to two units yields two rows.
pub fn eligibility_query(template: &OrgGraphTemplate, email_graph: &Iri) -> String {
    let exclusion = NotificationExclusion {
        email_graph,
        submission_var: "submissionUri",
        unit_var: "targetUnit",
    };
    let projection = ELIGIBILITY_VARS
        .iter()
        .map(|v| format!("?{v}"))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{PREFIXES}
SELECT DISTINCT {projection}
WHERE {{
      ?targetUnit a besluit:Bestuurseenheid ;
        mu:uuid ?targetUnitUuid ;
        ext:wilMailOntvangen \"true\"^^<{TYPED_BOOLEAN}> ;
        ext:mailAdresVoorNotificaties ?emailAddress ;
        skos:prefLabel ?targetUnitLabel .
      FILTER(STRLEN(STR(?emailAddress)) > 0)

      {bind}
      GRAPH ?graph {{
        ?submissionUri a meb:Submission ;
          pav:createdBy ?creatorUnit ;
          nmo:sentDate ?sentDate ;
          prov:generated ?formData .
      }}
      FILTER(?targetUnit != ?creatorUnit)

      {exclusion}

      ?creatorUnit a besluit:Bestuurseenheid ;
        skos:prefLabel ?creatorUnitLabel .
      ?formData dct:type ?decisionType .
      ?decisionType skos:prefLabel ?decisionTypeLabel .
}}
",
        bind = graph_bind(template, "targetUnitUuid", "graph"),
        exclusion = exclusion.render(),
    )
}

impl GraphClient {
    /// Every (submission, target unit) pair that still needs a notification.
    ///
    /// Either the full result set or an error; a single undecodable row fails
    /// the whole call.
    pub async fn find_eligible_submissions(&self) -> Result<Vec<EligibilityRow>, GraphError> {
        let layout = self.layout();
        let query = eligibility_query(&layout.org_graphs, &layout.system_email_graph);
        tracing::debug!(%query, "Running eligibility query");

        let results = self
            .store()
            .select(&query)
            .await
            .map_err(GraphError::QueryFailure)?;
        let rows = rows_from_results(&results).map_err(GraphError::QueryFailure)?;

        tracing::info!(rows = rows.len(), "Eligibility query complete");
        Ok(rows)
    }
}

fn rows_from_results(results: &SelectResults) -> Result<Vec<EligibilityRow>, StoreError> {
    results.solutions().iter().map(row_from_solution).collect()
}

fn row_from_solution(solution: &Solution) -> Result<EligibilityRow, StoreError> {
    let get = |var: &str| solution.value(var).map(str::to_string);
    Ok(EligibilityRow {
        target_unit: get("targetUnit")?,
        target_unit_uuid: get("targetUnitUuid")?,
        target_unit_label: get("targetUnitLabel")?,
        creator_unit_label: get("creatorUnitLabel")?,
        decision_type_label: get("decisionTypeLabel")?,
        sent_date: get("sentDate")?,
        email_address: get("emailAddress")?,
        submission_uri: get("submissionUri")?,
    })
}
