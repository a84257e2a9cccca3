//! Structural fix-ups that need no order record

use crate::document::{Document, NodeId};
use crate::fields::{get_text, set_text, POSITION_COEFFICIENT, POSITION_LEVEL};
use regex::Regex;

/// Result of coefficient inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientOutcome {
    /// A coefficient was written
    pub changed: bool,
    /// Coefficient after the rule (new or existing, possibly empty)
    pub coefficient: String,
}

/// Fill an empty `PositionCoefficient` from a matching `PositionLevel`
///
/// Idempotent: once the coefficient is set, the rule is a no-op.
pub fn normalize_classification(doc: &mut Document, ctx: NodeId, pattern: &Regex) -> CoefficientOutcome {
    let coefficient = get_text(doc, ctx, &POSITION_COEFFICIENT);
    let level = get_text(doc, ctx, &POSITION_LEVEL);

    if coefficient.is_empty() && pattern.is_match(&level) {
        set_text(doc, ctx, &POSITION_COEFFICIENT, &level);
        tracing::debug!(level = %level, "coefficient inferred from level");
        return CoefficientOutcome {
            changed: true,
            coefficient: level,
        };
    }

    CoefficientOutcome {
        changed: false,
        coefficient,
    }
}
