//! Per-contract summary rows and CSV export

use crate::document::{Document, NodeId};
use crate::fields::{
    assignment_id, get_text, order_id, AGENCY_ID, ORG_UNIT_ID, PERSON_REPLACED, POSITION_COEFFICIENT, POSITION_LEVEL,
    POSITION_STATUS_CODE, STAFFING_CUSTOMER_ID,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Snapshot of one contract after processing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Order identifier
    #[serde(rename = "OrderId")]
    pub order_id: String,
    /// Assignment identifier
    #[serde(rename = "AssignmentId")]
    pub assignment_id: String,
    /// Staffing customer (EU) identifier
    #[serde(rename = "EU")]
    pub eu: String,
    /// Customer org unit (site) identifier
    #[serde(rename = "OrgUnit")]
    pub org_unit: String,
    /// Agency identifier
    #[serde(rename = "Agency")]
    pub agency: String,
    /// Position status code
    #[serde(rename = "StatusCode")]
    pub status_code: String,
    /// Position level
    #[serde(rename = "PositionLevel")]
    pub position_level: String,
    /// Position coefficient
    #[serde(rename = "PositionCoefficient")]
    pub position_coefficient: String,
    /// Replaced person
    #[serde(rename = "PersonReplaced")]
    pub person_replaced: String,
    /// An order record was found for this contract
    pub matched: bool,
}

/// Read the summary columns of a contract
#[must_use]
pub fn summarize(doc: &Document, ctx: NodeId, matched: bool) -> SummaryRecord {
    SummaryRecord {
        order_id: order_id(doc, ctx),
        assignment_id: assignment_id(doc, ctx),
        eu: get_text(doc, ctx, &STAFFING_CUSTOMER_ID),
        org_unit: get_text(doc, ctx, &ORG_UNIT_ID),
        agency: get_text(doc, ctx, &AGENCY_ID),
        status_code: get_text(doc, ctx, &POSITION_STATUS_CODE),
        position_level: get_text(doc, ctx, &POSITION_LEVEL),
        position_coefficient: get_text(doc, ctx, &POSITION_COEFFICIENT),
        person_replaced: get_text(doc, ctx, &PERSON_REPLACED),
        matched,
    }
}

/// Write summary rows as CSV with a header line
///
/// # Errors
/// Returns error if a row cannot be serialized or written
pub fn write_csv<W: Write>(records: &[SummaryRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Matched / unmatched counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Contracts discovered
    pub total: usize,
    /// Contracts with an order record
    pub matched: usize,
    /// Contracts without an order record
    pub unmatched: usize,
}

impl MatchReport {
    /// Count matches over summary rows
    #[must_use]
    pub fn from_summaries(records: &[SummaryRecord]) -> Self {
        let matched = records.iter().filter(|r| r.matched).count();
        Self {
            total: records.len(),
            matched,
            unmatched: records.len() - matched,
        }
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contract(s): {} matched, {} unmatched",
            self.total, self.matched, self.unmatched
        )
    }
}
