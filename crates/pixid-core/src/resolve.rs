//! Node lookup and creation below a contract element
//!
//! Resolution never leaves the context subtree: a match is accepted only if
//! the element matched by the first step lies strictly below the context
//! (or directly under it for [`Anchor::Child`]).
//!
//! Creation uses approximate-path semantics. Each prefix of the path is
//! re-resolved from the context and the first match is reused, even when it
//! is not on the literal parent chain of the path. Only the missing suffix
//! is created.

use crate::document::{Document, NodeId};
use crate::path::{Anchor, FieldPath, Step};

/// All elements matching `path` below `ctx`, in document order
pub fn select<'a>(doc: &'a Document, ctx: NodeId, path: &'a FieldPath) -> impl Iterator<Item = NodeId> + 'a {
    doc.descendants(ctx)
        .filter(move |node| matches_at(doc, ctx, path, *node))
}

/// First element matching `path` below `ctx`
#[must_use]
pub fn find_first(doc: &Document, ctx: NodeId, path: &FieldPath) -> Option<NodeId> {
    select(doc, ctx, path).next()
}

/// Resolve `path` below `ctx`, creating the missing suffix
///
/// Returns the terminal element, existing or new.
pub fn ensure(doc: &mut Document, ctx: NodeId, path: &FieldPath) -> NodeId {
    if let Some(found) = find_first(doc, ctx, path) {
        return found;
    }

    let mut parent = ctx;
    for (i, step) in path.steps().iter().enumerate() {
        let partial = path.truncated(i + 1);
        if let Some(found) = find_first(doc, ctx, &partial) {
            parent = found;
            continue;
        }
        parent = doc.append_element(parent, step.namespace(), step.local());
        tracing::trace!(path = %partial, node = %parent, "created element");
    }
    parent
}

/// Check `node` against the steps from last to first, walking up parents
fn matches_at(doc: &Document, ctx: NodeId, path: &FieldPath, node: NodeId) -> bool {
    let mut cursor = node;
    let steps = path.steps();

    for (i, step) in steps.iter().enumerate().rev() {
        if !step_matches(doc, step, cursor) {
            return false;
        }
        if i > 0 {
            match doc.parent(cursor) {
                Some(parent) if parent != ctx => cursor = parent,
                _ => return false,
            }
        }
    }

    match path.anchor() {
        Anchor::Child => doc.parent(cursor) == Some(ctx),
        Anchor::Descendant => cursor != ctx && doc.is_ancestor(ctx, cursor),
    }
}

fn step_matches(doc: &Document, step: &Step, node: NodeId) -> bool {
    doc.name(node).matches(step.namespace(), step.local())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<Root xmlns="http://ns.hr-xml.org/2004-08-02">
  <Contract>
    <Ref><Id>A</Id></Ref>
    <Ref><Id>A2</Id></Ref>
  </Contract>
  <Contract>
    <Ref><Id>B</Id></Ref>
  </Contract>
</Root>"#;

    fn contracts(doc: &Document) -> Vec<NodeId> {
        doc.children(doc.root()).to_vec()
    }

    fn id_path() -> FieldPath {
        FieldPath::hr(&["Ref", "Id"])
    }

    #[test]
    fn find_first_is_scoped_to_context() {
        let doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctxs = contracts(&doc);
        let path = id_path();

        let a = find_first(&doc, ctxs[0], &path).unwrap();
        let b = find_first(&doc, ctxs[1], &path).unwrap();
        assert_eq!(doc.text(a), Some("A"));
        assert_eq!(doc.text(b), Some("B"));
    }

    #[test]
    fn select_returns_document_order() {
        let doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctxs = contracts(&doc);
        let path = id_path();
        let texts: Vec<_> = select(&doc, ctxs[0], &path)
            .map(|id| doc.text(id).unwrap_or_default().to_string())
            .collect();
        assert_eq!(texts, vec!["A", "A2"]);
    }

    #[test]
    fn context_itself_never_matches_first_step() {
        let doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctxs = contracts(&doc);
        let path = FieldPath::hr(&["Contract", "Ref", "Id"]);
        assert_eq!(find_first(&doc, ctxs[0], &path), None);
        assert!(find_first(&doc, doc.root(), &path).is_some());
    }

    #[test]
    fn child_anchor_requires_direct_child() {
        let doc = Document::parse(DOC.as_bytes()).unwrap();
        let direct = FieldPath::parse("./hr:Contract/hr:Ref").unwrap();
        let nested = FieldPath::parse("./hr:Ref/hr:Id").unwrap();
        assert!(find_first(&doc, doc.root(), &direct).is_some());
        assert_eq!(find_first(&doc, doc.root(), &nested), None);
    }

    #[test]
    fn ensure_returns_existing_node() {
        let mut doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctx = contracts(&doc)[1];
        let before = doc.to_xml_string();
        let node = ensure(&mut doc, ctx, &id_path());
        assert_eq!(doc.text(node), Some("B"));
        assert_eq!(doc.to_xml_string(), before);
    }

    #[test]
    fn ensure_creates_missing_suffix_only() {
        let mut doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctx = contracts(&doc)[1];
        let path = FieldPath::hr(&["Ref", "Extra", "Value"]);

        let node = ensure(&mut doc, ctx, &path);
        assert_eq!(find_first(&doc, ctx, &path), Some(node));

        let extra = doc.parent(node).unwrap();
        let reference = doc.parent(extra).unwrap();
        assert!(doc.name(reference).matches(Some(crate::path::HR_NS), "Ref"));
        assert_eq!(doc.parent(reference), Some(ctx));

        // Other contract untouched
        let other = contracts(&doc)[0];
        assert_eq!(find_first(&doc, other, &path), None);
    }

    #[test]
    fn ensure_builds_whole_chain_under_context() {
        let mut doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctx = contracts(&doc)[0];
        let path = FieldPath::hr(&["Legal", "Reason"]);

        let node = ensure(&mut doc, ctx, &path);
        let legal = doc.parent(node).unwrap();
        assert_eq!(doc.parent(legal), Some(ctx));
        assert_eq!(doc.children(ctx).last(), Some(&legal));
        assert!(doc.to_xml_string().contains("<Legal>\n      <Reason/>\n    </Legal>"));
    }

    #[test]
    fn ensure_twice_does_not_duplicate() {
        let mut doc = Document::parse(DOC.as_bytes()).unwrap();
        let ctx = contracts(&doc)[0];
        let path = FieldPath::hr(&["Legal", "Reason"]);
        let first = ensure(&mut doc, ctx, &path);
        let second = ensure(&mut doc, ctx, &path);
        assert_eq!(first, second);
        assert_eq!(select(&doc, ctx, &path).count(), 1);
    }
}
