//! Contract discovery
//!
//! A contract is marked by an `hr:ReferenceInformation` element carrying both
//! `hr:OrderId/hr:IdValue` and `hr:AssignmentId/hr:IdValue` children. The
//! marker's parent is the contract context, whatever its name or depth.

use crate::document::{Document, NodeId};
use crate::path::HR_NS;
use std::collections::HashSet;

/// Contract contexts of a document, in document order
///
/// Deduplicated by node identity: a context holding several markers is
/// returned once. Returns an empty list when no marker exists.
#[must_use]
pub fn find_contract_contexts(doc: &Document) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut contexts = Vec::new();

    for node in doc.elements() {
        if !doc.children(node).iter().any(|child| is_marker(doc, *child)) {
            continue;
        }
        if seen.insert(node) {
            contexts.push(node);
        }
    }

    tracing::debug!(count = contexts.len(), "discovered contract contexts");
    contexts
}

/// Check the `ReferenceInformation[OrderId/IdValue and AssignmentId/IdValue]` shape
fn is_marker(doc: &Document, node: NodeId) -> bool {
    doc.name(node).matches(Some(HR_NS), "ReferenceInformation")
        && has_id_value(doc, node, "OrderId")
        && has_id_value(doc, node, "AssignmentId")
}

fn has_id_value(doc: &Document, marker: NodeId, id_element: &str) -> bool {
    doc.children(marker).iter().any(|child| {
        doc.name(*child).matches(Some(HR_NS), id_element)
            && doc
                .children(*child)
                .iter()
                .any(|value| doc.name(*value).matches(Some(HR_NS), "IdValue"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::order_id;

    fn contract(order: &str) -> String {
        format!(
            "<Assignment><ReferenceInformation>\
             <OrderId><IdValue>{order}</IdValue></OrderId>\
             <AssignmentId><IdValue>AS-{order}</IdValue></AssignmentId>\
             </ReferenceInformation></Assignment>"
        )
    }

    fn wrap(body: &str) -> Document {
        let xml = format!(r#"<Envelope xmlns="http://ns.hr-xml.org/2004-08-02">{body}</Envelope>"#);
        Document::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn finds_each_contract_in_order() {
        let doc = wrap(&format!("{}{}{}", contract("1"), contract("2"), contract("3")));
        let ctxs = find_contract_contexts(&doc);
        let ids: Vec<_> = ctxs.iter().map(|c| order_id(&doc, *c)).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn no_markers_is_empty() {
        let doc = wrap("<Assignment><Other/></Assignment>");
        assert!(find_contract_contexts(&doc).is_empty());
    }

    #[test]
    fn marker_needs_both_identifiers() {
        let doc = wrap(
            "<Assignment><ReferenceInformation>\
             <OrderId><IdValue>1</IdValue></OrderId>\
             </ReferenceInformation></Assignment>",
        );
        assert!(find_contract_contexts(&doc).is_empty());
    }

    #[test]
    fn empty_id_values_still_mark_a_contract() {
        let doc = wrap(
            "<Assignment><ReferenceInformation>\
             <OrderId><IdValue/></OrderId><AssignmentId><IdValue/></AssignmentId>\
             </ReferenceInformation></Assignment>",
        );
        assert_eq!(find_contract_contexts(&doc).len(), 1);
    }

    #[test]
    fn context_with_two_markers_is_returned_once() {
        let doc = wrap(
            "<Assignment>\
             <ReferenceInformation><OrderId><IdValue>1</IdValue></OrderId><AssignmentId><IdValue>a</IdValue></AssignmentId></ReferenceInformation>\
             <ReferenceInformation><OrderId><IdValue>2</IdValue></OrderId><AssignmentId><IdValue>b</IdValue></AssignmentId></ReferenceInformation>\
             </Assignment>",
        );
        assert_eq!(find_contract_contexts(&doc).len(), 1);
    }

    #[test]
    fn identical_contracts_are_distinct_contexts() {
        let doc = wrap(&format!("{}{}", contract("same"), contract("same")));
        let ctxs = find_contract_contexts(&doc);
        assert_eq!(ctxs.len(), 2);
        assert_ne!(ctxs[0], ctxs[1]);
    }

    #[test]
    fn contexts_at_any_depth_and_name() {
        let doc = wrap(&format!(
            "<Batch><Group>{}</Group></Batch><Standalone><ReferenceInformation>\
             <OrderId><IdValue>9</IdValue></OrderId><AssignmentId><IdValue>x</IdValue></AssignmentId>\
             </ReferenceInformation></Standalone>",
            contract("deep")
        ));
        let ctxs = find_contract_contexts(&doc);
        assert_eq!(ctxs.len(), 2);
        assert_eq!(doc.name(ctxs[0]).local(), "Assignment");
        assert_eq!(doc.name(ctxs[1]).local(), "Standalone");
    }

    #[test]
    fn markers_outside_namespace_are_ignored() {
        let xml = "<Envelope><Assignment><ReferenceInformation>\
                   <OrderId><IdValue>1</IdValue></OrderId><AssignmentId><IdValue>a</IdValue></AssignmentId>\
                   </ReferenceInformation></Assignment></Envelope>";
        let doc = Document::parse(xml.as_bytes()).unwrap();
        assert!(find_contract_contexts(&doc).is_empty());
    }
}
