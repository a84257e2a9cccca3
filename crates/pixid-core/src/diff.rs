//! Unified diff of serialized documents

use similar::TextDiff;

/// Header label of the original document
pub const BEFORE_LABEL: &str = "before.xml";

/// Header label of the corrected document
pub const AFTER_LABEL: &str = "after.xml";

/// Line-based unified diff, empty when both texts are equal
#[must_use]
pub fn unified_diff(before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(BEFORE_LABEL, AFTER_LABEL)
        .to_string()
}
