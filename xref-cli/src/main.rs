//! Command-line interface for xref
//! This binary validates cross-references in Markdown files and extracts the
//! referenced content into a deduplicated package.
//!
//! Usage:
//!   xref validate `<path>` [--root `<dir>`]                 - Check every link of a document
//!   xref extract `<path>` [--root `<dir>`] [--whole-files]  - Validate, then extract eligible content

use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use xref_config::Loader;
use xref_engine::{ExtractOptions, Workspace};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("xref")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate and extract cross-references between Markdown documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("command")
                .help("What to do: 'validate' or 'extract'")
                .value_parser(["validate", "extract"])
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("path")
                .help("Path to the source Markdown document")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .short('r')
                .help("Repository root for the leading-slash convention and filename lookup (default: the document's directory)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a TOML configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("whole-files")
                .long("whole-files")
                .help("Extract whole-document links (no anchor) too")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .get_matches();

    let command = matches.get_one::<String>("command").expect("required");
    let path = PathBuf::from(matches.get_one::<String>("path").expect("required"));
    let format = matches.get_one::<String>("format").expect("defaulted");

    let mut loader = Loader::new();
    if let Some(config_path) = matches.get_one::<String>("config") {
        loader = loader.with_file(config_path);
    }
    let mut config = loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    if matches.get_flag("whole-files") {
        config.extraction.include_whole_files = true;
    }

    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .or_else(|| {
            (!config.resolution.root_dir.is_empty())
                .then(|| PathBuf::from(&config.resolution.root_dir))
        })
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let workspace = Workspace::open(&root)
        .map(|ws| ws.with_suggestion_threshold(config.resolution.suggestion_threshold))
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    });

    let succeeded = match command.as_str() {
        "validate" => runtime.block_on(handle_validate(&workspace, &path, format)),
        _ => {
            let options = ExtractOptions {
                include_whole_files: config.extraction.include_whole_files,
                content_id_width: config.extraction.content_id_width,
            };
            runtime.block_on(handle_extract(&workspace, &path, &options, format))
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
}

/// Handle the validate command. Success means at least one link is valid.
async fn handle_validate(workspace: &Workspace, path: &Path, format: &str) -> bool {
    let report = workspace.validate_document(path).await.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if format == "json" {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error formatting report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!(
            "{}: {} links, {} valid, {} warnings, {} errors",
            path.display(),
            report.summary.total,
            report.summary.valid,
            report.summary.warnings,
            report.summary.errors
        );
        for link in &report.links {
            if link.validation.is_valid() {
                continue;
            }
            let severity = if link.validation.is_error() { "error" } else { "warning" };
            println!(
                "  {}:{} {}: {} ({})",
                link.link.line,
                link.link.column,
                severity,
                link.link.matched_text,
                link.validation.message()
            );
        }
    }

    report.summary.valid > 0
}

/// Handle the extract command. Success means at least one link extracted.
async fn handle_extract(
    workspace: &Workspace,
    path: &Path,
    options: &ExtractOptions,
    format: &str,
) -> bool {
    let (_, result) = workspace
        .extract_from_document(path, options)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    if format == "json" {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error formatting result: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!(
            "{}: {} links, {} unique blocks, {} duplicates, {} characters saved ({:.1}% compression)",
            path.display(),
            result.stats.total_links,
            result.stats.unique_content,
            result.stats.duplicate_content_detected,
            result.stats.characters_saved,
            result.stats.compression_ratio * 100.0
        );
        for entry in &result.report.processed_links {
            let status = match entry.status {
                xref_engine::LinkStatus::Extracted => "extracted",
                xref_engine::LinkStatus::Skipped => "skipped",
                xref_engine::LinkStatus::Error => "error",
            };
            match (&entry.content_id, &entry.reason) {
                (Some(id), _) => println!(
                    "  {}:{} {}: {} -> {}",
                    entry.source_link.link.line,
                    entry.source_link.link.column,
                    status,
                    entry.source_link.link.matched_text,
                    id
                ),
                (None, Some(reason)) => println!(
                    "  {}:{} {}: {} ({})",
                    entry.source_link.link.line,
                    entry.source_link.link.column,
                    status,
                    entry.source_link.link.matched_text,
                    reason
                ),
                (None, None) => {}
            }
        }
    }

    result.succeeded()
}
