use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown ontology type '{name}', expected one of: {}", known.join(", "))]
    UnknownOntologyType { name: String, known: Vec<String> },

    #[error("Failed to read registry: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse registry: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid registry: {0}")]
    InvalidConfig(String),
}

/// Registry version for compatibility checking
pub const REGISTRY_VERSION: &str = "1.0.0";

/// A source database accepted for an ontology type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Identifier prefix, e.g. `MESH`
    pub name: String,

    /// Where to look the database up by hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Which service answers cross-reference and metadata lookups for a type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupService {
    /// EBI OxO for cross-references, OLS4 for metadata
    #[default]
    Oxo,
    MyGene,
    MyChem,
}

impl std::fmt::Display for LookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oxo => write!(f, "oxo"),
            Self::MyGene => write!(f, "mygene"),
            Self::MyChem => write!(f, "mychem"),
        }
    }
}

/// Supported and default databases for one ontology type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTypeConfig {
    /// Lookup key, e.g. `disease`
    pub type_name: String,

    /// Node label written to output rows, e.g. `Disease`
    pub label: String,

    /// The canonical database every identifier is normalized toward
    pub default_database: String,

    /// Supported databases, in display order
    pub databases: Vec<DatabaseInfo>,

    #[serde(default)]
    pub service: LookupService,
}

impl OntologyTypeConfig {
    pub fn new(
        type_name: impl Into<String>,
        label: impl Into<String>,
        default_database: impl Into<String>,
        databases: &[&str],
    ) -> Self {
        Self {
            type_name: type_name.into(),
            label: label.into(),
            default_database: default_database.into(),
            databases: databases
                .iter()
                .map(|name| DatabaseInfo {
                    name: (*name).to_string(),
                    homepage: None,
                })
                .collect(),
            service: LookupService::default(),
        }
    }

    #[must_use]
    pub fn with_service(mut self, service: LookupService) -> Self {
        self.service = service;
        self
    }

    /// Check whether a prefix is one of the supported databases (exact match)
    pub fn supports(&self, prefix: &str) -> bool {
        self.databases.iter().any(|db| db.name == prefix)
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.iter().map(|db| db.name.clone()).collect()
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.type_name.trim().is_empty() {
            return Err(RegistryError::InvalidConfig(
                "ontology type with an empty name".to_string(),
            ));
        }
        if self.databases.is_empty() {
            return Err(RegistryError::InvalidConfig(format!(
                "ontology type '{}' has no databases",
                self.type_name
            )));
        }
        if !self.supports(&self.default_database) {
            return Err(RegistryError::InvalidConfig(format!(
                "default database '{}' of ontology type '{}' is not one of its databases",
                self.default_database, self.type_name
            )));
        }
        Ok(())
    }
}

/// Serializable registry format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryData {
    pub version: String,
    pub ontology_types: Vec<OntologyTypeConfig>,
}

/// Immutable mapping from ontology type to its database configuration.
///
/// Built once at startup and shared (behind an `Arc`) by every conversion.
#[derive(Debug)]
pub struct OntologyTypeRegistry {
    types: Vec<OntologyTypeConfig>,

    /// Index: lowercased type name -> index in types vec
    key_to_index: HashMap<String, usize>,
}

impl OntologyTypeRegistry {
    /// Build a registry from a list of types
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidConfig` if a type is invalid or listed twice.
    pub fn from_types(types: Vec<OntologyTypeConfig>) -> Result<Self, RegistryError> {
        let mut key_to_index = HashMap::new();

        for (idx, config) in types.iter().enumerate() {
            config.validate()?;
            let key = config.type_name.to_lowercase();
            if key_to_index.insert(key, idx).is_some() {
                return Err(RegistryError::InvalidConfig(format!(
                    "ontology type '{}' is defined more than once",
                    config.type_name
                )));
            }
        }

        Ok(Self {
            types,
            key_to_index,
        })
    }

    /// Load the registry embedded in the binary
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded registry cannot be parsed.
    pub fn load_embedded() -> Result<Self, RegistryError> {
        // Validated at compile time by build.rs
        const EMBEDDED_REGISTRY: &str = include_str!("../../registry/ontology_types.json");
        Self::from_json(EMBEDDED_REGISTRY)
    }

    /// Load a registry from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid registry.
    pub fn load_from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a registry from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or describes an invalid registry.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let data: RegistryData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != REGISTRY_VERSION {
            tracing::warn!(
                "Registry version mismatch (expected {}, found {})",
                REGISTRY_VERSION,
                data.version
            );
        }

        Self::from_types(data.ontology_types)
    }

    /// Export the registry to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let data = RegistryData {
            version: REGISTRY_VERSION.to_string(),
            ontology_types: self.types.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Look up the configuration of an ontology type (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownOntologyType` for unregistered types.
    pub fn config_for(&self, ontology_type: &str) -> Result<&OntologyTypeConfig, RegistryError> {
        self.key_to_index
            .get(&ontology_type.to_lowercase())
            .map(|&idx| &self.types[idx])
            .ok_or_else(|| RegistryError::UnknownOntologyType {
                name: ontology_type.to_string(),
                known: self.type_names(),
            })
    }

    /// Supported database prefixes of an ontology type, in display order
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownOntologyType` for unregistered types.
    pub fn list_supported_databases(&self, ontology_type: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self.config_for(ontology_type)?.database_names())
    }

    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.type_name.clone()).collect()
    }

    pub fn types(&self) -> &[OntologyTypeConfig] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
