//! Testing utilities for PIXID workspace
//!
//! HR-XML fixture builders shared by tests.

#![allow(missing_docs)]

use std::fmt::Write;

pub const HR_NS: &str = "http://ns.hr-xml.org/2004-08-02";

/// One `Assignment` contract of a fixture document
#[derive(Debug, Clone, Default)]
pub struct ContractFixture {
    pub order_id: String,
    pub assignment_id: String,
    pub customer_id: Option<String>,
    pub org_unit: Option<String>,
    pub agency: Option<String>,
    pub status_code: Option<String>,
    pub level: Option<String>,
    pub coefficient: Option<String>,
    pub person_replaced: Option<String>,
}

impl ContractFixture {
    pub fn new(order_id: &str, assignment_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            assignment_id: assignment_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_customer(mut self, id: &str) -> Self {
        self.customer_id = Some(id.to_string());
        self
    }

    pub fn with_org_unit(mut self, id: &str) -> Self {
        self.org_unit = Some(id.to_string());
        self
    }

    pub fn with_agency(mut self, id: &str) -> Self {
        self.agency = Some(id.to_string());
        self
    }

    pub fn with_status(mut self, code: &str) -> Self {
        self.status_code = Some(code.to_string());
        self
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = Some(level.to_string());
        self
    }

    pub fn with_coefficient(mut self, coefficient: &str) -> Self {
        self.coefficient = Some(coefficient.to_string());
        self
    }

    pub fn with_person_replaced(mut self, name: &str) -> Self {
        self.person_replaced = Some(name.to_string());
        self
    }

    /// Contract markup without namespace declaration
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<Assignment><ReferenceInformation>");
        let _ = write!(xml, "<OrderId><IdValue>{}</IdValue></OrderId>", self.order_id);
        let _ = write!(xml, "<AssignmentId><IdValue>{}</IdValue></AssignmentId>", self.assignment_id);
        id_element(&mut xml, "StaffingCustomerId", self.customer_id.as_deref());
        id_element(&mut xml, "StaffingCustomerOrgUnitId", self.org_unit.as_deref());
        id_element(&mut xml, "AgencyId", self.agency.as_deref());
        xml.push_str("</ReferenceInformation>");

        xml.push_str("<PositionCharacteristics>");
        if let Some(code) = &self.status_code {
            let _ = write!(xml, "<PositionStatus><Code>{code}</Code></PositionStatus>");
        }
        if let Some(level) = &self.level {
            let _ = write!(xml, "<PositionLevel>{level}</PositionLevel>");
        }
        if let Some(coefficient) = &self.coefficient {
            let _ = write!(xml, "<PositionCoefficient>{coefficient}</PositionCoefficient>");
        }
        xml.push_str("</PositionCharacteristics>");

        if let Some(name) = &self.person_replaced {
            let _ = write!(
                xml,
                "<ContractInformation><ContractLegalReason><PersonReplaced>{name}</PersonReplaced></ContractLegalReason></ContractInformation>"
            );
        }
        xml.push_str("</Assignment>");
        xml
    }
}

fn id_element(xml: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = write!(xml, "<{name}><IdValue>{value}</IdValue></{name}>");
    }
}

/// Document with a shared header and the given contracts
pub fn envelope(contracts: &[ContractFixture]) -> String {
    let body: String = contracts.iter().map(ContractFixture::to_xml).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Envelope xmlns="{HR_NS}"><Header><Sender>PIXID</Sender></Header>{body}</Envelope>"#
    )
}

/// `count` contracts numbered `CMD-1`… with assignments `AS-1`…
pub fn numbered_contracts(count: usize) -> Vec<ContractFixture> {
    (1..=count)
        .map(|i| ContractFixture::new(&format!("CMD-{i}"), &format!("AS-{i}")))
        .collect()
}

/// Config mapping every field onto its usual HR-XML location
pub fn sample_config_yaml() -> &'static str {
    r#"
rules:
  normalize_coefficient_from_level: true
mappings:
  classification_interimaire: "//hr:PositionCharacteristics/hr:PositionLevel"
  statut: "//hr:PositionCharacteristics/hr:PositionStatus/hr:Code"
  personne_absente: "//hr:ContractInformation/hr:ContractLegalReason/hr:PersonReplaced"
  code_metier: "//hr:PositionCharacteristics/hr:PositionTitle/hr:Code"
  code_site: "//hr:ReferenceInformation/hr:StaffingCustomerOrgUnitId/hr:IdValue"
statut_map:
  actif: "A"
  inactif: "I"
site_idvalue:
  rebuild: false
  siret_prefix: ""
"#
}

/// Orders as a JSON list
pub fn sample_orders_json() -> &'static str {
    r#"[
  {"numero_commande": "CMD-1", "statut": "actif", "code_site": "S01"},
  {"numero_commande": "CMD-3", "personne_absente": "Jane Doe", "classification_interimaire": "C3"}
]"#
}

/// Orders as semicolon-separated CSV
pub fn sample_orders_csv() -> &'static str {
    "numero_commande;statut;code_site\nCMD-1;actif;S01\nCMD-2;inactif;\n"
}
