use agenda_staging::config::{read_config, ProjectLayout};
use agenda_staging::intake::{ingest_payload, open_payload_source};
use agenda_staging::publish::{
    copy_outputs_by_category, deliver_recommendations, locate_recommendation_artifacts,
    recommendations_dir, save_outputs, OutputTargets, RunContext,
};
use agenda_staging::reporter::TracingReporter;
use agenda_staging::staging::{
    default_expected_files, neo4j_support_targets, stage_outputs, ExpectedFile, ExpectedFiles,
    InputSource, StageOptions,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Agenda staging - moves pipeline step outputs into the layout the next step reads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pipeline config file (JSON)
    #[arg(short, long, global = true, env = "AGENDA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy previous step outputs into the event data directory
    Stage {
        /// Data directory the next step reads from
        #[arg(long, env = "AGENDA_DATA_DIR")]
        data_dir: PathBuf,

        /// Input directories as label=path; an empty path marks the input as absent
        #[arg(long = "input", required = true)]
        inputs: Vec<String>,

        /// JSON object of logical name -> alias list to check after copying
        #[arg(long)]
        expected_files: Option<PathBuf>,

        /// Do not check the built-in expected file table
        #[arg(long)]
        no_default_expected: bool,

        /// Fail when an expected file or support target is missing
        #[arg(long)]
        require_complete: bool,
    },

    /// Route a raw input payload into the locations the config declares
    Ingest {
        /// Mounted payload directory
        #[arg(long, env = "AGENDA_INPUT_URI")]
        input_uri: String,

        /// Step root; defaults to the current directory
        #[arg(long, env = "AGENDA_ROOT")]
        root: Option<PathBuf>,

        /// Destination for unmapped files; defaults to <root>/data
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Copy processor outputs into the category output directories
    Publish {
        #[arg(long, env = "AGENDA_ROOT")]
        root: Option<PathBuf>,

        #[arg(long)]
        output_registration: Option<PathBuf>,

        #[arg(long)]
        output_scan: Option<PathBuf>,

        #[arg(long)]
        output_session: Option<PathBuf>,

        #[arg(long)]
        output_metadata: Option<PathBuf>,

        #[arg(long)]
        incremental: bool,
    },

    /// Deliver the newest recommendation export with a completion marker
    Deliver {
        #[arg(long, env = "AGENDA_ROOT")]
        root: Option<PathBuf>,

        #[arg(long)]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config_path = args
        .config
        .context("--config (or AGENDA_CONFIG) is required")?;
    let config = read_config(&config_path)
        .await
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    info!(event = %config.event_name(), "Loaded configuration from {}", config_path.display());

    match args.command {
        Command::Stage {
            data_dir,
            inputs,
            expected_files,
            no_default_expected,
            require_complete,
        } => {
            let inputs = inputs
                .iter()
                .map(|raw| parse_input(raw))
                .collect::<Result<Vec<_>>>()?;
            let mut options = StageOptions {
                support_targets: neo4j_support_targets(&config),
                expected_files: if no_default_expected {
                    ExpectedFiles::new()
                } else {
                    default_expected_files()
                },
            };
            if let Some(path) = expected_files {
                for file in read_expected_files(&path).await? {
                    options.expected_files.push(file);
                }
            }

            let reporter = TracingReporter::new("stage");
            let result = stage_outputs(&config, &inputs, &data_dir, &reporter, &options).await?;
            print_json(&result)?;

            if require_complete && !result.is_complete() {
                bail!(
                    "Staging incomplete: {} expected files and {} support targets missing",
                    result.missing_expected.len(),
                    result.missing_support().len()
                );
            }
        }

        Command::Ingest {
            input_uri,
            root,
            data_dir,
        } => {
            let layout = project_layout(root)?;
            let data_dir = data_dir.unwrap_or_else(|| layout.data_dir());
            let source = open_payload_source(&input_uri)?;

            let reporter = TracingReporter::new("ingest");
            let result =
                ingest_payload(&config, &layout, source.as_ref(), &data_dir, &reporter).await?;
            print_json(&result)?;

            if result.copied.is_empty() {
                bail!("No files were copied from input {}", input_uri);
            }
        }

        Command::Publish {
            root,
            output_registration,
            output_scan,
            output_session,
            output_metadata,
            incremental,
        } => {
            let layout = project_layout(root)?;
            let targets = OutputTargets {
                registration: output_registration,
                scan: output_scan,
                session: output_session,
                metadata: output_metadata,
            };
            let run = RunContext {
                config_path: config_path.display().to_string(),
                incremental,
            };

            let reporter = TracingReporter::new("publish");
            let by_category =
                copy_outputs_by_category(&layout, config.event_name(), &targets, &reporter)
                    .await?;
            let saved = save_outputs(&config, &layout, &targets, &run, &reporter).await?;
            print_json(&serde_json::json!({ "by_category": by_category, "saved": saved }))?;

            if !saved.inaccessible.is_empty() {
                bail!("{} output locations are not accessible", saved.inaccessible.len());
            }
        }

        Command::Deliver { root, output_dir } => {
            let layout = project_layout(root)?;
            let reporter = TracingReporter::new("deliver");
            let artifacts =
                locate_recommendation_artifacts(&recommendations_dir(&layout), config.event_name())
                    .await?;
            let report = deliver_recommendations(artifacts.as_ref(), &output_dir, &reporter).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

/// Parse `label=path`; an empty path is an input the runner did not provide
fn parse_input(raw: &str) -> Result<InputSource> {
    let (label, path) = raw
        .split_once('=')
        .with_context(|| format!("Input must be label=path, got '{}'", raw))?;
    let label = label.trim();
    if label.is_empty() {
        bail!("Input label is empty in '{}'", raw);
    }

    let path = path.trim();
    Ok(if path.is_empty() {
        InputSource::absent(label)
    } else {
        InputSource::new(label, path)
    })
}

async fn read_expected_files(path: &Path) -> Result<Vec<ExpectedFile>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read expected files {}", path.display()))?;
    // Declaration order decides the order of missing names
    let table: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Expected files {} must be a JSON object", path.display()))?;

    table
        .into_iter()
        .map(|(name, aliases)| -> Result<ExpectedFile> {
            let aliases: Vec<String> = serde_json::from_value(aliases)
                .with_context(|| format!("Aliases for '{}' must be a list of names", name))?;
            Ok(ExpectedFile::new(name, aliases)?)
        })
        .collect()
}

fn project_layout(root: Option<PathBuf>) -> Result<ProjectLayout> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    Ok(ProjectLayout::new(root))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        let input = parse_input("registration=/mnt/step1/reg").unwrap();
        assert_eq!(input, InputSource::new("registration", "/mnt/step1/reg"));

        let absent = parse_input("scan=").unwrap();
        assert_eq!(absent, InputSource::absent("scan"));

        assert!(parse_input("no-separator").is_err());
        assert!(parse_input("=/path").is_err());
    }

    #[tokio::test]
    async fn test_read_expected_files_rejects_empty_aliases() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("expected.json");
        tokio::fs::write(&path, r#"{"streams": ["streams.json"], "empty": []}"#)
            .await
            .unwrap();
        assert!(read_expected_files(&path).await.is_err());

        tokio::fs::write(&path, r#"{"streams": ["streams.json", "Streams.JSON"]}"#)
            .await
            .unwrap();
        let files = read_expected_files(&path).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].logical_name(), "streams");
        assert_eq!(files[0].aliases().len(), 2);
    }

    #[tokio::test]
    async fn test_read_expected_files_keeps_declaration_order() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("expected.json");
        tokio::fs::write(
            &path,
            r#"{"zeta": ["z.csv"], "alpha": ["a.csv"], "mid": ["m.csv"]}"#,
        )
        .await
        .unwrap();

        let files = read_expected_files(&path).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.logical_name()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        tokio::fs::write(&path, r#"{"bad": "not-a-list"}"#).await.unwrap();
        assert!(read_expected_files(&path).await.is_err());
    }
}
