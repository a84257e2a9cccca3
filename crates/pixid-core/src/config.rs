//! Mapping configuration
//!
//! [`MappingConfig`] is the serde view of `config.yaml`:
//!
//! ```yaml
//! rules:
//!   classification_regex: "^[A-E]\\d{1,2}$"
//!   normalize_coefficient_from_level: true
//! mappings:
//!   statut: "//hr:PositionCharacteristics/hr:PositionStatus/hr:Code"
//! statut_map:
//!   actif: "A"
//! site_idvalue:
//!   rebuild: false
//!   siret_prefix: ""
//! ```
//!
//! A config is compiled once into an immutable [`Ruleset`] (parsed paths,
//! compiled regex) before a run.

use crate::error::ConfigError;
use crate::path::FieldPath;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Default pattern for classification levels (`A1` … `E99`)
pub const DEFAULT_CLASSIFICATION_REGEX: &str = r"^[A-E]\d{1,2}$";

/// Fields the mapping engine knows how to apply, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MappedField {
    /// Temp worker classification, written as is
    ClassificationInterimaire,
    /// Position status, translated through `statut_map`
    Statut,
    /// Replaced person; also forces the legal recourse type
    PersonneAbsente,
    /// Job code, written as is
    CodeMetier,
    /// Site identifier, prefix-preserving
    CodeSite,
}

impl MappedField {
    /// All fields in application order
    pub const ALL: [MappedField; 5] = [
        Self::ClassificationInterimaire,
        Self::Statut,
        Self::PersonneAbsente,
        Self::CodeMetier,
        Self::CodeSite,
    ];

    /// Key used in `mappings` and in order records
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ClassificationInterimaire => "classification_interimaire",
            Self::Statut => "statut",
            Self::PersonneAbsente => "personne_absente",
            Self::CodeMetier => "code_metier",
            Self::CodeSite => "code_site",
        }
    }

    /// Look up a field by key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for MappedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Structural rules independent of order records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Pattern a level must match to be copied into the coefficient
    pub classification_regex: String,
    /// Enable coefficient inference
    pub normalize_coefficient_from_level: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            classification_regex: DEFAULT_CLASSIFICATION_REGEX.to_string(),
            normalize_coefficient_from_level: true,
        }
    }
}

/// Site identifier policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteIdConfig {
    /// Rebuild `{siret_prefix}-{code_site}` regardless of the current value
    pub rebuild: bool,
    /// Prefix used when rebuilding
    pub siret_prefix: String,
}

/// Mapping configuration as loaded from YAML or JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Normalization rules
    pub rules: RulesConfig,
    /// Field key → path expression
    pub mappings: BTreeMap<String, String>,
    /// Raw status → translated status
    pub statut_map: BTreeMap<String, String>,
    /// Site identifier policy
    pub site_idvalue: SiteIdConfig,
}

impl MappingConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or has the wrong shape
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or has the wrong shape
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from file; `.json` is read as JSON, anything else as YAML
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Serialize to YAML string
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// With a mapping target for a field
    #[must_use]
    pub fn with_mapping(mut self, field: MappedField, path: impl Into<String>) -> Self {
        self.mappings.insert(field.key().to_string(), path.into());
        self
    }

    /// With a status translation
    #[must_use]
    pub fn with_statut(mut self, raw: impl Into<String>, translated: impl Into<String>) -> Self {
        self.statut_map.insert(raw.into(), translated.into());
        self
    }

    /// With site identifier rebuild
    #[must_use]
    pub fn with_site_rebuild(mut self, siret_prefix: impl Into<String>) -> Self {
        self.site_idvalue = SiteIdConfig {
            rebuild: true,
            siret_prefix: siret_prefix.into(),
        };
        self
    }

    /// With coefficient normalization enabled or disabled
    #[must_use]
    pub fn with_normalization(mut self, enabled: bool) -> Self {
        self.rules.normalize_coefficient_from_level = enabled;
        self
    }

    /// With a custom classification pattern
    #[must_use]
    pub fn with_classification_regex(mut self, pattern: impl Into<String>) -> Self {
        self.rules.classification_regex = pattern.into();
        self
    }

    /// Compile into an immutable ruleset
    ///
    /// Unknown mapping keys are ignored with a warning.
    ///
    /// # Errors
    /// - `ConfigError::InvalidPath` if a mapping target does not parse
    /// - `ConfigError::InvalidRegex` if the classification pattern does not compile
    pub fn compile(&self) -> Result<Ruleset, ConfigError> {
        // Patterns match from the start of the value, like an anchored match.
        let classification = Regex::new(&format!("^(?:{})", self.rules.classification_regex))?;

        let mut mappings = IndexMap::new();
        for field in MappedField::ALL {
            if let Some(expr) = self.mappings.get(field.key()) {
                let path = FieldPath::parse(expr).map_err(|source| ConfigError::InvalidPath {
                    field: field.key().to_string(),
                    source,
                })?;
                mappings.insert(field, path);
            }
        }
        for key in self.mappings.keys() {
            if MappedField::from_key(key).is_none() {
                tracing::warn!(key = %key, "ignoring unknown mapping key");
            }
        }

        let site_prefix = (self.site_idvalue.rebuild && !self.site_idvalue.siret_prefix.is_empty())
            .then(|| self.site_idvalue.siret_prefix.clone());

        Ok(Ruleset {
            normalize_coefficient: self.rules.normalize_coefficient_from_level,
            classification,
            mappings,
            statut_map: self.statut_map.clone(),
            site_prefix,
        })
    }
}

/// Compiled, immutable mapping configuration
#[derive(Debug, Clone)]
pub struct Ruleset {
    normalize_coefficient: bool,
    classification: Regex,
    mappings: IndexMap<MappedField, FieldPath>,
    statut_map: BTreeMap<String, String>,
    site_prefix: Option<String>,
}

impl Ruleset {
    /// Whether coefficient inference runs
    #[inline]
    #[must_use]
    pub fn normalize_coefficient(&self) -> bool {
        self.normalize_coefficient
    }

    /// Classification pattern (start-anchored)
    #[inline]
    #[must_use]
    pub fn classification(&self) -> &Regex {
        &self.classification
    }

    /// Target path of a field, if mapped
    #[inline]
    #[must_use]
    pub fn mapping(&self, field: MappedField) -> Option<&FieldPath> {
        self.mappings.get(&field)
    }

    /// Translate a raw status (pass-through when unmapped)
    #[must_use]
    pub fn translate_statut<'a>(&'a self, raw: &'a str) -> &'a str {
        self.statut_map.get(raw).map_or(raw, String::as_str)
    }

    /// Prefix for site identifier rebuild, when requested
    #[inline]
    #[must_use]
    pub fn site_rebuild_prefix(&self) -> Option<&str> {
        self.site_prefix.as_deref()
    }
}
