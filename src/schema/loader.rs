//! Schema loader: reads declarative schema files and keeps a registry of
//! compiled schemas
//!
//! - One file per schema version, any `*.json` name inside the schema directory
//! - Registered versions are immutable
//! - Malformed files abort loading

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::compiler::{compile, CompiledSchema};
use super::definition::SchemaDefinition;
use super::errors::{SchemaError, SchemaResult};

/// On-disk layout of a schema file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchemaFile {
    schema_id: String,
    schema_version: String,
    #[serde(default)]
    description: Option<String>,
    fields: Map<String, Value>,
}

/// A parsed schema file, not yet compiled.
///
/// Callbacks can be attached to `definition` before registering it.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub schema_id: String,
    pub schema_version: String,
    pub description: Option<String>,
    pub definition: SchemaDefinition,
}

impl SchemaFile {
    /// Reads and parses a schema file.
    pub fn read(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parses schema file content. `source` names the origin in errors.
    pub fn parse(content: &str, source: &str) -> SchemaResult<Self> {
        let raw: RawSchemaFile = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed_schema(source, format!("Invalid JSON: {}", e)))?;

        if raw.schema_id.is_empty() || raw.schema_version.is_empty() {
            return Err(SchemaError::malformed_schema(
                source,
                "schema_id and schema_version must not be empty",
            ));
        }

        Ok(Self {
            schema_id: raw.schema_id,
            schema_version: raw.schema_version,
            description: raw.description,
            definition: SchemaDefinition::from_json_map(&raw.fields)?,
        })
    }
}

/// Registry of compiled schemas keyed by `(schema_id, schema_version)`.
pub struct SchemaLoader {
    /// Directory containing schema files
    schema_dir: PathBuf,
    schemas: HashMap<(String, String), Arc<CompiledSchema>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl SchemaLoader {
    /// Creates a loader reading schema files from `schema_dir`.
    pub fn new(schema_dir: &Path) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
            schemas: HashMap::new(),
            metrics: None,
        }
    }

    /// Counts compiled schemas into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads and compiles every schema file in the schema directory.
    ///
    /// A missing directory means there is nothing to load.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        if !self.schema_dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_schema(
                self.schema_dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_schema(
                    self.schema_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        // Directory order is platform dependent.
        paths.sort();

        for path in &paths {
            let file = SchemaFile::read(path)?;
            self.register(&file.schema_id, &file.schema_version, &file.definition)?;
        }

        let count = paths.len().to_string();
        let dir = self.schema_dir.display().to_string();
        log_event_with_fields(Event::SchemasLoaded, &[("count", count.as_str()), ("dir", dir.as_str())]);

        Ok(paths.len())
    }

    /// Compiles and registers a definition.
    pub fn register(
        &mut self,
        schema_id: &str,
        schema_version: &str,
        definition: &SchemaDefinition,
    ) -> SchemaResult<Arc<CompiledSchema>> {
        let key = (schema_id.to_string(), schema_version.to_string());
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::schema_immutable(schema_id, schema_version));
        }

        let compiled = match compile(definition) {
            Ok(compiled) => Arc::new(compiled),
            Err(e) => {
                log_event_with_fields(
                    Event::SchemaRejected,
                    &[
                        ("code", e.code().code()),
                        ("schema_id", schema_id),
                        ("schema_version", schema_version),
                    ],
                );
                return Err(e);
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.increment_schemas_compiled();
        }
        let fields = compiled.field_count().to_string();
        log_event_with_fields(
            Event::SchemaCompiled,
            &[
                ("fields", fields.as_str()),
                ("schema_id", schema_id),
                ("schema_version", schema_version),
            ],
        );

        self.schemas.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Gets a schema by ID and version.
    pub fn get(&self, schema_id: &str, schema_version: &str) -> Option<Arc<CompiledSchema>> {
        self.schemas
            .get(&(schema_id.to_string(), schema_version.to_string()))
            .cloned()
    }

    /// Like [`get`](Self::get) but distinguishes unknown IDs from unknown versions.
    pub fn resolve(&self, schema_id: &str, schema_version: &str) -> SchemaResult<Arc<CompiledSchema>> {
        if !self.schema_id_exists(schema_id) {
            return Err(SchemaError::unknown_schema(schema_id));
        }
        self.get(schema_id, schema_version)
            .ok_or_else(|| SchemaError::unknown_version(schema_id, schema_version))
    }

    /// Checks if a schema exists.
    pub fn exists(&self, schema_id: &str, schema_version: &str) -> bool {
        self.get(schema_id, schema_version).is_some()
    }

    /// Checks if any version of a schema ID exists.
    pub fn schema_id_exists(&self, schema_id: &str) -> bool {
        self.schemas.keys().any(|(id, _)| id == schema_id)
    }

    /// Registered versions of a schema ID, sorted.
    pub fn versions(&self, schema_id: &str) -> Vec<String> {
        let mut versions: Vec<String> = self
            .schemas
            .keys()
            .filter(|(id, _)| id == schema_id)
            .map(|(_, v)| v.clone())
            .collect();
        versions.sort();
        versions
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
