//! Mapping engine
//!
//! Applies one [`OrderRecord`] onto a contract context through the paths of a
//! compiled [`Ruleset`]. Fields are applied in [`MappedField::ALL`] order;
//! absent fields, unmapped fields and blank values never write.

use crate::config::{MappedField, Ruleset};
use crate::document::{Document, NodeId};
use crate::fields::{get_text, set_text, RECOURSE_TYPE};
use crate::records::OrderRecord;
use indexmap::IndexMap;

/// Key recorded when the legal recourse type is forced
pub const RECOURSE_TYPE_KEY: &str = "recourse_type";

/// Recourse type written alongside a replaced person
pub const RECOURSE_TYPE_REPLACEMENT: &str = "01";

/// Fields written by [`apply_order_record`], in application order
pub type AppliedFields = IndexMap<String, String>;

/// Apply an order record to one contract
///
/// Returns the written values keyed by field. `personne_absente` also
/// records [`RECOURSE_TYPE_KEY`].
pub fn apply_order_record(doc: &mut Document, ctx: NodeId, record: &OrderRecord, ruleset: &Ruleset) -> AppliedFields {
    let mut applied = AppliedFields::new();

    for field in MappedField::ALL {
        let Some(path) = ruleset.mapping(field) else {
            continue;
        };
        let Some(value) = record.text(field.key()).filter(|v| !v.is_empty()) else {
            continue;
        };

        let written = match field {
            MappedField::ClassificationInterimaire | MappedField::CodeMetier | MappedField::PersonneAbsente => value,
            MappedField::Statut => {
                let translated = ruleset.translate_statut(&value);
                if translated.trim().is_empty() {
                    continue;
                }
                translated.to_string()
            }
            MappedField::CodeSite => site_code(&get_text(doc, ctx, path), &value, ruleset.site_rebuild_prefix()),
        };

        set_text(doc, ctx, path, &written);
        tracing::debug!(field = %field, value = %written, "applied field");
        applied.insert(field.key().to_string(), written);

        if field == MappedField::PersonneAbsente {
            set_text(doc, ctx, &RECOURSE_TYPE, RECOURSE_TYPE_REPLACEMENT);
            applied.insert(RECOURSE_TYPE_KEY.to_string(), RECOURSE_TYPE_REPLACEMENT.to_string());
        }
    }

    applied
}

/// Compose a site identifier, keeping the existing prefix before the first `-`
fn site_code(current: &str, value: &str, rebuild_prefix: Option<&str>) -> String {
    if let Some(prefix) = rebuild_prefix {
        return format!("{prefix}-{value}");
    }
    match current.split_once('-') {
        Some((prefix, _)) => format!("{prefix}-{value}"),
        None => value.to_string(),
    }
}
