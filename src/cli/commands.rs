//! CLI command implementations
//!
//! Results go to stdout as JSON lines, logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::{CompiledSchema, SchemaFile, SchemaLoader};
use crate::validate::{ValidationResult, Validator};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_json};

/// Main CLI entry point.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { schema } => compile(&schema),
        Command::Check {
            schema,
            schema_id,
            schema_version,
            config,
            stop_on_first_error,
            xss,
            recheck,
            documents,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            config.stop_on_first_error |= stop_on_first_error;
            if let Some(policy) = xss {
                config.xss_policy = policy.into();
            }
            if recheck {
                config.run_transforms = false;
            }
            let source = match (schema, schema_id, schema_version) {
                (Some(path), _, _) => SchemaSource::File(path),
                (None, Some(id), Some(version)) => SchemaSource::Registry { id, version },
                _ => {
                    return Err(CliError::config_error(
                        "check needs --schema or --schema-id with --schema-version",
                    ))
                }
            };
            check(&source, &config, &documents)
        }
    }
}

/// Where `check` gets its schema from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A single schema file
    File(PathBuf),
    /// A schema registered from the configured `schema_dir`
    Registry { id: String, version: String },
}

/// Compiles a schema file and prints its outline.
pub fn compile(schema_path: &Path) -> CliResult<()> {
    let (file, compiled) = load_schema(schema_path, None)?;

    write_json(&json!({
        "schema_id": file.schema_id,
        "schema_version": file.schema_version,
        "description": file.description,
        "fields": compiled.field_count(),
        "outline": compiled.outline(),
    }))?;
    Ok(())
}

/// Validates every document and prints one result line per document.
///
/// Documents are validated concurrently against one shared tree; results
/// are printed in argument order. Fails if any document fails.
pub fn check(source: &SchemaSource, config: &EngineConfig, documents: &[PathBuf]) -> CliResult<()> {
    config.validate()?;
    config.apply_logging();

    let metrics = Arc::new(MetricsRegistry::new());
    let (name, compiled) = match source {
        SchemaSource::File(path) => {
            let (file, compiled) = load_schema(path, Some(Arc::clone(&metrics)))?;
            (format!("{}@{}", file.schema_id, file.schema_version), compiled)
        }
        SchemaSource::Registry { id, version } => {
            let mut loader = SchemaLoader::new(&config.schema_dir).with_metrics(Arc::clone(&metrics));
            loader.load_all()?;
            (format!("{}@{}", id, version), loader.resolve(id, version)?)
        }
    };
    let validator = Validator::new(compiled)
        .with_options(config.to_options())
        .with_metrics(Arc::clone(&metrics))
        .with_name(name);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    let outcomes = rt.block_on(async {
        let handles: Vec<_> = documents
            .iter()
            .map(|path| {
                let validator = validator.clone();
                let path = path.clone();
                tokio::spawn(async move {
                    let document = read_document(&path)?;
                    Ok::<_, CliError>(validator.validate_detailed(&document).await)
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = handle
                .await
                .map_err(|e| CliError::io_error(format!("Validation task failed: {}", e)))?;
            outcomes.push(outcome);
        }
        Ok::<_, CliError>(outcomes)
    })?;

    let mut failed = 0;
    for (path, outcome) in documents.iter().zip(outcomes) {
        let line = render_outcome(path, outcome);
        if line["status"] != "ok" {
            failed += 1;
        }
        write_json(&line)?;
    }

    let total = documents.len().to_string();
    let failed_str = failed.to_string();
    let snapshot = metrics.to_json();
    log_event_with_fields(
        Event::CommandComplete,
        &[
            ("command", "check"),
            ("documents", total.as_str()),
            ("failed", failed_str.as_str()),
            ("metrics", snapshot.as_str()),
        ],
    );

    if failed > 0 {
        return Err(CliError::validation_failed(failed, documents.len()));
    }
    Ok(())
}

fn load_schema(
    path: &Path,
    metrics: Option<Arc<MetricsRegistry>>,
) -> CliResult<(SchemaFile, Arc<CompiledSchema>)> {
    let file = SchemaFile::read(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut loader = SchemaLoader::new(dir);
    if let Some(metrics) = metrics {
        loader = loader.with_metrics(metrics);
    }
    let compiled = loader.register(&file.schema_id, &file.schema_version, &file.definition)?;
    Ok((file, compiled))
}

fn render_outcome(path: &Path, outcome: CliResult<ValidationResult>) -> Value {
    let document = path.display().to_string();
    match outcome {
        Ok(result) if result.is_valid() => json!({
            "document": document,
            "status": "ok",
            "value": result.value,
        }),
        Ok(result) => json!({
            "document": document,
            "status": "rejected",
            "errors": result.errors,
        }),
        Err(e) => json!({
            "document": document,
            "status": "error",
            "code": e.code_str(),
            "message": e.message(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;
    use crate::validate::ValidationError;
    use std::fs;
    use tempfile::TempDir;

    const USERS_V1: &str = r#"{
        "schema_id": "users",
        "schema_version": "v1",
        "fields": { "name": { "type": "string", "required": true, "trim": true } }
    }"#;

    #[test]
    fn test_check_resolves_from_schema_dir() {
        let temp_dir = TempDir::new().unwrap();
        let schema_dir = temp_dir.path().join("schemas");
        fs::create_dir(&schema_dir).unwrap();
        fs::write(schema_dir.join("users_v1.json"), USERS_V1).unwrap();
        let good = temp_dir.path().join("good.json");
        let bad = temp_dir.path().join("bad.json");
        fs::write(&good, r#"{"name": " jay "}"#).unwrap();
        fs::write(&bad, r#"{"age": 3}"#).unwrap();

        let config = EngineConfig {
            schema_dir,
            ..EngineConfig::default()
        };
        let users = |version: &str| SchemaSource::Registry {
            id: "users".to_string(),
            version: version.to_string(),
        };

        assert!(check(&users("v1"), &config, &[good.clone()]).is_ok());

        let err = check(&users("v1"), &config, &[good.clone(), bad]).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::ValidationFailed);

        let err = check(&users("v2"), &config, &[good]).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::SchemaError);
    }

    #[test]
    fn test_check_with_schema_file() {
        let temp_dir = TempDir::new().unwrap();
        let schema = temp_dir.path().join("users.json");
        let doc = temp_dir.path().join("doc.json");
        fs::write(&schema, USERS_V1).unwrap();
        fs::write(&doc, r#"{"name": "tim"}"#).unwrap();

        let source = SchemaSource::File(schema);
        assert!(check(&source, &EngineConfig::default(), &[doc]).is_ok());
    }

    #[test]
    fn test_render_outcome() {
        let ok = render_outcome(
            Path::new("a.json"),
            Ok(ValidationResult {
                value: json!({"name": "jay"}),
                errors: vec![],
            }),
        );
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["value"]["name"], "jay");

        let rejected = render_outcome(
            Path::new("b.json"),
            Ok(ValidationResult {
                value: json!({}),
                errors: vec![ValidationError::required("name")],
            }),
        );
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["errors"][0]["rule"], "required");

        let broken = render_outcome(
            Path::new("c.json"),
            Err(CliError::invalid_document("c.json", "bad")),
        );
        assert_eq!(broken["code"], "DOCRULE_CLI_INVALID_DOCUMENT");
    }
}
