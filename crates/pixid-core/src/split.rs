//! One standalone document per contract
//!
//! Each part is a deep copy of the whole document with every other contract
//! context detached. Shared structure (envelope, headers) is kept in every
//! part. A context that encloses the kept one cannot be detached and stays.

use crate::discovery::find_contract_contexts;
use crate::document::{Document, NodeId};
use crate::error::DocumentError;
use crate::fields::{assignment_id, order_id};
use std::collections::HashSet;

/// One contract extracted from a multi-contract document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPart {
    /// Order identifier, or `NOORDER_<seq>` when blank
    pub order_id: String,
    /// Assignment identifier, or `NOASSIGN_<seq>` when blank
    pub assignment_id: String,
    /// Serialized single-contract document
    pub xml: Vec<u8>,
}

impl ContractPart {
    /// File name of the part: `{order_id}__{assignment_id}.xml`
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced by `_`, so the name
    /// never holds a path separator.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}__{}.xml", sanitize(&self.order_id), sanitize(&self.assignment_id))
    }
}

/// File names for a list of parts, unique within the list
///
/// Identifiers are not unique across contracts; a repeated name gets a
/// `_{seq:03}` suffix from the part's 1-based position.
#[must_use]
pub fn unique_file_names(parts: &[ContractPart]) -> Vec<String> {
    let mut used = HashSet::new();
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let base = part.file_name();
            let stem = base.strip_suffix(".xml").unwrap_or(&base).to_string();
            let mut name = base;
            let mut seq = index + 1;
            while !used.insert(name.clone()) {
                name = format!("{stem}_{seq:03}.xml");
                seq += parts.len();
            }
            name
        })
        .collect()
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// Split a document into one part per contract, in discovery order
///
/// # Errors
/// Returns error if the document does not parse
pub fn split_by_contract(xml: &[u8]) -> Result<Vec<ContractPart>, DocumentError> {
    let doc = Document::parse(xml)?;
    let contexts = find_contract_contexts(&doc);
    tracing::info!(contracts = contexts.len(), "splitting document");

    #[cfg(feature = "parallel")]
    let parts = {
        use rayon::prelude::*;
        contexts
            .par_iter()
            .enumerate()
            .map(|(index, ctx)| extract_part(&doc, &contexts, *ctx, index + 1))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let parts = contexts
        .iter()
        .enumerate()
        .map(|(index, ctx)| extract_part(&doc, &contexts, *ctx, index + 1))
        .collect();

    Ok(parts)
}

fn extract_part(doc: &Document, contexts: &[NodeId], keep: NodeId, seq: usize) -> ContractPart {
    let mut copy = doc.clone();
    for other in contexts.iter().copied().filter(|c| *c != keep) {
        if !copy.is_ancestor(other, keep) {
            copy.detach(other);
        }
    }

    let order = non_blank_or(order_id(&copy, keep), || format!("NOORDER_{seq:03}"));
    let assignment = non_blank_or(assignment_id(&copy, keep), || format!("NOASSIGN_{seq:03}"));
    tracing::debug!(order = %order, assignment = %assignment, "extracted contract");

    ContractPart {
        order_id: order,
        assignment_id: assignment,
        xml: copy.to_xml_bytes(),
    }
}

fn non_blank_or(value: String, placeholder: impl FnOnce() -> String) -> String {
    if value.is_empty() {
        placeholder()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(order: &str, assignment: &str) -> String {
        format!(
            "<Assignment><ReferenceInformation>\
             <OrderId><IdValue>{order}</IdValue></OrderId>\
             <AssignmentId><IdValue>{assignment}</IdValue></AssignmentId>\
             </ReferenceInformation></Assignment>"
        )
    }

    fn envelope(body: &str) -> String {
        format!(r#"<Envelope xmlns="http://ns.hr-xml.org/2004-08-02"><Header><Sender>X</Sender></Header>{body}</Envelope>"#)
    }

    #[test]
    fn one_part_per_contract() {
        let xml = envelope(&format!("{}{}{}", contract("1", "a"), contract("2", "b"), contract("3", "c")));
        let parts = split_by_contract(xml.as_bytes()).unwrap();
        let names: Vec<_> = parts.iter().map(ContractPart::file_name).collect();
        assert_eq!(names, vec!["1__a.xml", "2__b.xml", "3__c.xml"]);

        for part in &parts {
            let doc = Document::parse(&part.xml).unwrap();
            let ctxs = find_contract_contexts(&doc);
            assert_eq!(ctxs.len(), 1);
            assert_eq!(order_id(&doc, ctxs[0]), part.order_id);
            assert!(String::from_utf8_lossy(&part.xml).contains("<Sender>X</Sender>"));
        }
    }

    #[test]
    fn blank_identifiers_get_placeholders() {
        let xml = envelope(&format!("{}{}", contract("1", "a"), contract("", " ")));
        let parts = split_by_contract(xml.as_bytes()).unwrap();
        assert_eq!(parts[1].order_id, "NOORDER_002");
        assert_eq!(parts[1].assignment_id, "NOASSIGN_002");
    }

    #[test]
    fn no_contracts_no_parts() {
        let parts = split_by_contract(envelope("").as_bytes()).unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn enclosing_context_is_kept() {
        let inner = contract("inner", "i");
        let outer = format!(
            "<Batch><ReferenceInformation>\
             <OrderId><IdValue>outer</IdValue></OrderId>\
             <AssignmentId><IdValue>o</IdValue></AssignmentId>\
             </ReferenceInformation>{inner}</Batch>"
        );
        let parts = split_by_contract(envelope(&outer).as_bytes()).unwrap();
        assert_eq!(parts.len(), 2);

        let outer_part = Document::parse(&parts[0].xml).unwrap();
        assert_eq!(find_contract_contexts(&outer_part).len(), 1);

        let inner_part = Document::parse(&parts[1].xml).unwrap();
        assert_eq!(find_contract_contexts(&inner_part).len(), 2);
        assert_eq!(parts[1].order_id, "inner");
    }

    #[test]
    fn repeated_identifiers_get_distinct_file_names() {
        let xml = envelope(&format!("{}{}{}", contract("1", "a"), contract("1", "a"), contract("2", "b")));
        let parts = split_by_contract(xml.as_bytes()).unwrap();
        assert_eq!(unique_file_names(&parts), vec!["1__a.xml", "1__a_002.xml", "2__b.xml"]);
    }

    #[test]
    fn file_name_never_holds_a_path_separator() {
        let part = ContractPart {
            order_id: "../etc".into(),
            assignment_id: "a/b\\c".into(),
            xml: Vec::new(),
        };
        assert_eq!(part.file_name(), ".._etc__a_b_c.xml");
    }

    #[test]
    fn invalid_document_fails() {
        assert!(split_by_contract(b"<a><b").is_err());
    }
}
