//! PIXID Core - context-scoped HR-XML mutation engine
//!
//! Fixes documents that bundle several staffing contracts in one HR-XML tree:
//! - Discovers contract contexts inside the flat tree
//! - Resolves every field read/write relative to one contract's subtree
//! - Applies coefficient normalization and order-record mappings per contract
//! - Splits the corrected tree into one document per contract
//!
//! # Architecture
//!
//! ```text
//! bytes → Document → discovery → [ctx…] → normalize → map → summarize → bytes + diff
//!                                  └──────────── split ──────────────→ [part…]
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pixid_core::prelude::*;
//!
//! let ruleset = MappingConfig::from_path("config.yaml")?.compile()?;
//! let orders = OrderBook::from_path("orders.csv")?;
//!
//! let output = ContractProcessor::new(ruleset).process_all(&xml, &orders)?;
//! println!("{}", output.report());
//!
//! for part in split_by_contract(&output.xml)? {
//!     std::fs::write(part.file_name(), &part.xml)?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod diff;
pub mod discovery;
pub mod document;
pub mod error;
pub mod fields;
pub mod mapping;
pub mod normalize;
pub mod path;
pub mod processor;
pub mod records;
pub mod resolve;
pub mod split;
pub mod summary;

// Re-exports for convenience
pub use config::{MappedField, MappingConfig, Ruleset, DEFAULT_CLASSIFICATION_REGEX};
pub use diff::unified_diff;
pub use discovery::find_contract_contexts;
pub use document::{Document, ElementName, NodeId};
pub use error::{ConfigError, DocumentError, PathError, PixidError, PixidResult, RecordError};
pub use mapping::{apply_order_record, AppliedFields};
pub use normalize::{normalize_classification, CoefficientOutcome};
pub use path::{Anchor, FieldPath, Step, HR_NS, HR_PREFIX};
pub use processor::{first_order_id, ContractProcessor, FirstContractOutput, ProcessOutput};
pub use records::{OrderBook, OrderRecord};
pub use split::{split_by_contract, unique_file_names, ContractPart};
pub use summary::{summarize, write_csv, MatchReport, SummaryRecord};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for processing documents
    pub use crate::{
        split_by_contract, ContractPart, ContractProcessor, Document, MappingConfig, MatchReport, OrderBook,
        OrderRecord, PixidError, PixidResult, ProcessOutput, Ruleset, SummaryRecord,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shared_types_are_thread_safe() {
        assert_send_sync::<Document>();
        assert_send_sync::<Ruleset>();
        assert_send_sync::<OrderBook>();
        assert_send_sync::<ContractProcessor>();
    }
}
