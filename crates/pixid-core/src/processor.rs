//! Document orchestrator
//!
//! Runs discovery, normalization, mapping and summarization over every
//! contract of a document:
//!
//! ```text
//! bytes ─parse─▶ Document ─discover─▶ [ctx…] ─normalize/map/summarize─▶ ProcessOutput
//! ```
//!
//! Contracts are processed sequentially in discovery order. Each step only
//! touches the subtree of its own context.

use crate::config::Ruleset;
use crate::diff::unified_diff;
use crate::discovery::find_contract_contexts;
use crate::document::{Document, NodeId};
use crate::error::DocumentError;
use crate::fields::order_id;
use crate::mapping::apply_order_record;
use crate::normalize::normalize_classification;
use crate::records::{OrderBook, OrderRecord};
use crate::summary::{summarize, MatchReport, SummaryRecord};

/// Result of processing every contract
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Corrected document bytes
    pub xml: Vec<u8>,
    /// One row per contract, in discovery order
    pub summaries: Vec<SummaryRecord>,
    /// Unified diff of the serialized document before and after
    pub diff: String,
}

impl ProcessOutput {
    /// Matched / unmatched counts
    #[must_use]
    pub fn report(&self) -> MatchReport {
        MatchReport::from_summaries(&self.summaries)
    }
}

/// Result of processing the first contract only
#[derive(Debug, Clone)]
pub struct FirstContractOutput {
    /// Corrected document bytes
    pub xml: Vec<u8>,
    /// Summary of the first contract, `None` when the document has none
    pub summary: Option<SummaryRecord>,
    /// Unified diff of the serialized document before and after
    pub diff: String,
}

/// Applies a ruleset to documents
#[derive(Debug, Clone)]
pub struct ContractProcessor {
    ruleset: Ruleset,
}

impl ContractProcessor {
    /// Create processor
    #[inline]
    #[must_use]
    pub fn new(ruleset: Ruleset) -> Self {
        Self { ruleset }
    }

    /// Ruleset in use
    #[inline]
    #[must_use]
    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Process every contract of a document
    ///
    /// Unmatched contracts are normalized and summarized with
    /// `matched: false`; their mapped fields are not touched.
    ///
    /// # Errors
    /// Returns error if the document does not parse
    pub fn process_all(&self, xml: &[u8], orders: &OrderBook) -> Result<ProcessOutput, DocumentError> {
        let mut doc = Document::parse(xml)?;
        let before = doc.to_xml_string();

        let contexts = find_contract_contexts(&doc);
        let summaries: Vec<SummaryRecord> = contexts
            .into_iter()
            .map(|ctx| {
                let record = orders.get(&order_id(&doc, ctx));
                self.process_contract(&mut doc, ctx, record)
            })
            .collect();

        let after = doc.to_xml_string();
        let output = ProcessOutput {
            diff: unified_diff(&before, &after),
            xml: after.into_bytes(),
            summaries,
        };

        let report = output.report();
        tracing::info!(
            contracts = report.total,
            matched = report.matched,
            unmatched = report.unmatched,
            "processed document"
        );
        Ok(output)
    }

    /// Process only the first contract, with an optional record
    ///
    /// # Errors
    /// Returns error if the document does not parse
    pub fn process_first(&self, xml: &[u8], record: Option<&OrderRecord>) -> Result<FirstContractOutput, DocumentError> {
        let mut doc = Document::parse(xml)?;
        let before = doc.to_xml_string();

        let summary = find_contract_contexts(&doc)
            .first()
            .map(|ctx| self.process_contract(&mut doc, *ctx, record));
        if summary.is_none() {
            tracing::info!("no contract found");
        }

        let after = doc.to_xml_string();
        Ok(FirstContractOutput {
            diff: unified_diff(&before, &after),
            xml: after.into_bytes(),
            summary,
        })
    }

    fn process_contract(&self, doc: &mut Document, ctx: NodeId, record: Option<&OrderRecord>) -> SummaryRecord {
        if self.ruleset.normalize_coefficient() {
            normalize_classification(doc, ctx, self.ruleset.classification());
        }

        if let Some(record) = record {
            let applied = apply_order_record(doc, ctx, record, &self.ruleset);
            tracing::debug!(order = %order_id(doc, ctx), fields = applied.len(), "contract matched");
        } else {
            tracing::debug!(order = %order_id(doc, ctx), "contract unmatched");
        }

        summarize(doc, ctx, record.is_some())
    }
}

/// Order identifier of the first contract, or empty
#[must_use]
pub fn first_order_id(doc: &Document) -> String {
    find_contract_contexts(doc)
        .first()
        .map(|ctx| order_id(doc, *ctx))
        .unwrap_or_default()
}
