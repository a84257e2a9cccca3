//! Text fields of a contract
//!
//! Read/write primitives on top of the resolver, plus the fixed paths of the
//! identifiers and summary columns.

use crate::document::{Document, NodeId};
use crate::path::FieldPath;
use crate::resolve::{ensure, find_first};
use once_cell::sync::Lazy;

/// `//hr:ReferenceInformation/hr:OrderId/hr:IdValue`
pub static ORDER_ID: Lazy<FieldPath> = Lazy::new(|| FieldPath::hr(&["ReferenceInformation", "OrderId", "IdValue"]));

/// `//hr:ReferenceInformation/hr:AssignmentId/hr:IdValue`
pub static ASSIGNMENT_ID: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["ReferenceInformation", "AssignmentId", "IdValue"]));

/// `//hr:ReferenceInformation/hr:StaffingCustomerId/hr:IdValue`
pub static STAFFING_CUSTOMER_ID: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["ReferenceInformation", "StaffingCustomerId", "IdValue"]));

/// `//hr:ReferenceInformation/hr:StaffingCustomerOrgUnitId/hr:IdValue`
pub static ORG_UNIT_ID: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["ReferenceInformation", "StaffingCustomerOrgUnitId", "IdValue"]));

/// `//hr:ReferenceInformation/hr:AgencyId/hr:IdValue`
pub static AGENCY_ID: Lazy<FieldPath> = Lazy::new(|| FieldPath::hr(&["ReferenceInformation", "AgencyId", "IdValue"]));

/// `//hr:PositionCharacteristics/hr:PositionStatus/hr:Code`
pub static POSITION_STATUS_CODE: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["PositionCharacteristics", "PositionStatus", "Code"]));

/// `//hr:PositionCharacteristics/hr:PositionLevel`
pub static POSITION_LEVEL: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["PositionCharacteristics", "PositionLevel"]));

/// `//hr:PositionCharacteristics/hr:PositionCoefficient`
pub static POSITION_COEFFICIENT: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["PositionCharacteristics", "PositionCoefficient"]));

/// `//hr:ContractInformation/hr:ContractLegalReason/hr:PersonReplaced`
pub static PERSON_REPLACED: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["ContractInformation", "ContractLegalReason", "PersonReplaced"]));

/// `//hr:ContractInformation/hr:ContractLegalReason/hr:RecourseType`
pub static RECOURSE_TYPE: Lazy<FieldPath> =
    Lazy::new(|| FieldPath::hr(&["ContractInformation", "ContractLegalReason", "RecourseType"]));

/// Trimmed text of the first match, or empty
#[must_use]
pub fn get_text(doc: &Document, ctx: NodeId, path: &FieldPath) -> String {
    find_first(doc, ctx, path)
        .and_then(|node| doc.text(node))
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Set text of the first match (created if absent), verbatim
pub fn set_text(doc: &mut Document, ctx: NodeId, path: &FieldPath, value: &str) {
    let node = ensure(doc, ctx, path);
    doc.set_text(node, value);
}

/// Order identifier of a contract (join key for order records)
#[must_use]
pub fn order_id(doc: &Document, ctx: NodeId) -> String {
    get_text(doc, ctx, &ORDER_ID)
}

/// Assignment identifier of a contract
#[must_use]
pub fn assignment_id(doc: &Document, ctx: NodeId) -> String {
    get_text(doc, ctx, &ASSIGNMENT_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = r#"<Envelope xmlns="http://ns.hr-xml.org/2004-08-02">
  <Assignment>
    <ReferenceInformation>
      <OrderId><IdValue>  CMD-1  </IdValue></OrderId>
      <AssignmentId><IdValue>AS-1</IdValue></AssignmentId>
    </ReferenceInformation>
    <PositionCharacteristics>
      <PositionLevel/>
    </PositionCharacteristics>
  </Assignment>
</Envelope>"#;

    fn setup() -> (Document, NodeId) {
        let doc = Document::parse(CONTRACT.as_bytes()).unwrap();
        let ctx = doc.children(doc.root())[0];
        (doc, ctx)
    }

    #[test]
    fn identifiers_are_trimmed() {
        let (doc, ctx) = setup();
        assert_eq!(order_id(&doc, ctx), "CMD-1");
        assert_eq!(assignment_id(&doc, ctx), "AS-1");
    }

    #[test]
    fn missing_or_empty_reads_as_empty() {
        let (doc, ctx) = setup();
        assert_eq!(get_text(&doc, ctx, &POSITION_LEVEL), "");
        assert_eq!(get_text(&doc, ctx, &PERSON_REPLACED), "");
    }

    #[test]
    fn set_text_is_verbatim() {
        let (mut doc, ctx) = setup();
        set_text(&mut doc, ctx, &POSITION_LEVEL, " B7 ");
        let node = find_first(&doc, ctx, &POSITION_LEVEL).unwrap();
        assert_eq!(doc.text(node), Some(" B7 "));
        assert_eq!(get_text(&doc, ctx, &POSITION_LEVEL), "B7");
    }

    #[test]
    fn set_text_creates_missing_chain() {
        let (mut doc, ctx) = setup();
        set_text(&mut doc, ctx, &RECOURSE_TYPE, "01");
        assert_eq!(get_text(&doc, ctx, &RECOURSE_TYPE), "01");
        let xml = doc.to_xml_string();
        assert!(xml.contains("<ContractInformation>"));
        assert!(xml.contains("<RecourseType>01</RecourseType>"));
    }
}
