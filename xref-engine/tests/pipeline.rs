//! End-to-end pipeline tests: validate a document tree on disk, extract, and
//! check the report, the dedup index, and the stats against each other.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use xref_engine::{
    DocumentCache, DocumentParser, DirectoryLookup, ExtractOptions, LinkStatus, Workspace,
};
use xref_parser::{ParseError, RawParseOutput};

const X_MD: &str = "\
# X

## Setup

setup instructions here

## Teardown

teardown instructions
";

const Y_MD: &str = "# Y\n\nwhole document body\n";

fn workspace_fixture(source: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("source.md"), source).unwrap();
    fs::write(dir.path().join("x.md"), X_MD).unwrap();
    fs::write(dir.path().join("y.md"), Y_MD).unwrap();
    let source_path = dir.path().join("source.md");
    (dir, source_path)
}

fn open(root: &Path) -> Workspace {
    Workspace::open(root).unwrap()
}

#[tokio::test]
async fn duplicate_anchor_links_collapse_into_one_block() {
    let (dir, source) = workspace_fixture("[a](x.md#Setup) and [b](x.md#Setup)\n");
    let ws = open(dir.path());

    let (report, result) = ws
        .extract_from_document(&source, &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.valid, 2);

    assert_eq!(result.content_blocks.blocks.len(), 1);
    let block = result.content_blocks.blocks.values().next().unwrap();
    assert_eq!(block.source_links.len(), 2);
    assert_eq!(result.stats.duplicate_content_detected, 1);
    assert!(block.content.starts_with("## Setup"));
    assert!(!block.content.contains("## Teardown"));
}

#[tokio::test]
async fn whole_file_link_respects_the_run_flag() {
    let (dir, source) = workspace_fixture("[c](y.md)\n");
    let ws = open(dir.path());

    let (_, skipped) = ws
        .extract_from_document(&source, &ExtractOptions::default())
        .await
        .unwrap();
    let entry = &skipped.report.processed_links[0];
    assert_eq!(entry.status, LinkStatus::Skipped);
    assert!(entry.reason.as_deref().unwrap().contains("disabled"));

    let options = ExtractOptions {
        include_whole_files: true,
        ..ExtractOptions::default()
    };
    let (_, extracted) = ws.extract_from_document(&source, &options).await.unwrap();
    let entry = &extracted.report.processed_links[0];
    assert_eq!(entry.status, LinkStatus::Extracted);
    let block = extracted.content_blocks.blocks.values().next().unwrap();
    assert_eq!(block.content, Y_MD);
}

#[tokio::test]
async fn totals_in_the_dedup_index_match_the_blocks() {
    let (dir, source) =
        workspace_fixture("[a](x.md#Setup)\n[b](x.md#Setup)\n[c](x.md#Teardown)\n");
    let ws = open(dir.path());

    let (_, result) = ws
        .extract_from_document(&source, &ExtractOptions::default())
        .await
        .unwrap();

    let sum: usize = result
        .content_blocks
        .blocks
        .values()
        .map(|b| b.content_length)
        .sum();
    assert_eq!(result.content_blocks.total_character_length, sum);
    assert_eq!(result.stats.unique_content, 2);
    assert_eq!(result.stats.total_links, 3);

    let expected_ratio = result.stats.characters_saved as f64
        / (sum + result.stats.characters_saved) as f64;
    assert!((result.stats.compression_ratio - expected_ratio).abs() < 1e-9);
}

#[tokio::test]
async fn bad_links_do_not_abort_the_good_ones() {
    let (dir, source) = workspace_fixture(
        "[good](x.md#Setup)\n[no-target](gone.md#Setup)\n[no-anchor](x.md#Missing)\n",
    );
    let ws = open(dir.path());

    let (report, result) = ws
        .extract_from_document(&source, &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(report.summary.errors, 2);
    assert_eq!(report.summary.valid, 1);

    let statuses: Vec<LinkStatus> = result
        .report
        .processed_links
        .iter()
        .map(|e| e.status)
        .collect();
    assert_eq!(
        statuses,
        vec![LinkStatus::Extracted, LinkStatus::Skipped, LinkStatus::Skipped]
    );
    assert!(result.succeeded());
}

/// Counting parser wrapper over the real tokenizer
struct CountingParser {
    calls: AtomicUsize,
}

impl DocumentParser for CountingParser {
    fn parse(&self, path: &Path) -> Result<RawParseOutput, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        xref_parser::parse(path)
    }
}

#[tokio::test]
async fn each_document_parses_once_across_validation_and_extraction() {
    let (dir, source) = workspace_fixture("[a](x.md#Setup)\n[b](x.md#Teardown)\n[c](y.md)\n");
    let parser = Arc::new(CountingParser {
        calls: AtomicUsize::new(0),
    });
    let cache = DocumentCache::new(parser.clone());
    let lookup = Arc::new(DirectoryLookup::scan(dir.path()).unwrap());
    let ws = Workspace::with_parts(dir.path().to_path_buf(), lookup, cache);

    let options = ExtractOptions {
        include_whole_files: true,
        ..ExtractOptions::default()
    };
    let (report, result) = ws.extract_from_document(&source, &options).await.unwrap();

    assert_eq!(report.summary.valid, 3);
    assert_eq!(
        result
            .report
            .processed_links
            .iter()
            .filter(|e| e.status == LinkStatus::Extracted)
            .count(),
        3
    );
    // source.md, x.md, y.md: one parse each, across both phases.
    assert_eq!(parser.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn extract_from_links_reuses_validated_input() {
    let (dir, source) = workspace_fixture("[a](x.md#Setup)\n");
    let ws = open(dir.path());

    let report = ws.validate_document(&source).await.unwrap();
    let result = ws
        .extract_from_links(&report.links, &ExtractOptions::default())
        .await;

    assert_eq!(result.report.processed_links.len(), 1);
    assert_eq!(result.report.processed_links[0].status, LinkStatus::Extracted);
}
