//! The `fedcommit submit` command: wire-format JSON requests in bulk.
//!
//! Accepts a `.json` file (one request), a `.jsonl` file (one request per
//! line), or a directory searched recursively for both. Requests are processed
//! concurrently, bounded by `processing.parallel_workers`, and results are
//! written in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use fedcommit_core::{Config, ErrorKind, Pipeline, SubmissionRequest, SubmissionResponse};
use serde::Serialize;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use super::open_writer;
use super::types::OutputFormat;

/// Arguments for the `submit` command.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Request file (.json / .jsonl) or directory of request files
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Maximum submissions in flight (defaults to processing.parallel_workers)
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// One raw request body and where it came from.
#[derive(Debug, Clone, PartialEq)]
struct RequestSource {
    /// "path" for .json files, "path:line" for .jsonl lines
    label: String,
    body: String,
}

/// One output record: the response tagged with its source.
#[derive(Debug, Serialize)]
struct SubmitRecord {
    source: String,
    #[serde(flatten)]
    response: SubmissionResponse,
    #[serde(skip)]
    failure: Option<ErrorKind>,
}

/// Per-kind tallies for the end-of-run summary.
#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    accepted: usize,
    bad_input: usize,
    internal: usize,
}

impl Tally {
    fn record(&mut self, failure: Option<ErrorKind>) {
        match failure {
            None => self.accepted += 1,
            Some(ErrorKind::BadInput) => self.bad_input += 1,
            Some(ErrorKind::Internal) => self.internal += 1,
        }
    }
}

/// Execute the submit command.
pub async fn execute(args: SubmitArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the path and try again.",
            args.input
        );
    }
    let parallel = args.parallel.unwrap_or(config.processing.parallel_workers);
    if parallel == 0 {
        anyhow::bail!("--parallel must be > 0");
    }

    let sources = collect_requests(&args.input)?;
    if sources.is_empty() {
        tracing::warn!("No request files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} request(s) to submit", sources.len());

    let pipeline = Arc::new(Pipeline::new(&config)?);
    tracing::debug!("Using feature extractor v{}", pipeline.extractor().version());
    let progress = create_progress_bar(sources.len() as u64);
    let start = Instant::now();

    let semaphore = Arc::new(Semaphore::new(parallel));
    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            tracing::warn!("Submit semaphore closed, stopping batch");
            break;
        };
        let pipeline = Arc::clone(&pipeline);
        let progress = progress.clone();

        handles.push(tokio::spawn(async move {
            let (response, failure) = submit_one(&pipeline, &source.body).await;
            drop(permit);
            progress.inc(1);
            SubmitRecord {
                source: source.label,
                response,
                failure,
            }
        }));
    }

    // Awaiting in spawn order keeps output aligned with input.
    let mut records = Vec::with_capacity(handles.len());
    let mut tally = Tally::default();
    for handle in handles {
        match handle.await {
            Ok(record) => {
                if let Some(kind) = record.failure {
                    tracing::warn!("Rejected {} ({kind:?})", record.source);
                }
                tally.record(record.failure);
                records.push(record);
            }
            Err(e) => {
                tracing::error!("Submit task panicked: {e}");
                tally.record(Some(ErrorKind::Internal));
            }
        }
    }
    progress.finish_and_clear();

    let format = OutputFormat::resolve(args.format, &config.output.format);
    let mut writer = open_writer(args.output.as_deref(), format, config.output.pretty)?;
    writer.write_all(&records)?;
    writer.flush()?;
    if let Some(path) = &args.output {
        tracing::info!("Output written to {:?}", path);
    }

    print_summary(&tally, start.elapsed());
    Ok(())
}

/// Parse, convert and process one request body.
///
/// Returns the response and, on failure, its kind. Unparseable requests count
/// as bad input.
async fn submit_one(pipeline: &Pipeline, body: &str) -> (SubmissionResponse, Option<ErrorKind>) {
    let request = match SubmissionRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => {
            let response = SubmissionResponse::rejected(pipeline.services(), "", &e.to_string());
            return (response, Some(ErrorKind::BadInput));
        }
    };
    let user_id = request.user_id.clone();
    let submission = match request.into_submission() {
        Ok(submission) => submission,
        Err(e) => {
            let response =
                SubmissionResponse::rejected(pipeline.services(), &user_id, &e.to_string());
            return (response, Some(ErrorKind::BadInput));
        }
    };

    let outcome = pipeline.process(submission).await;
    let failure = match &outcome {
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Submission for {user_id} failed in {} stage: {e}", e.stage());
            Some(e.kind())
        }
    };
    let response = SubmissionResponse::from_outcome(pipeline.services(), &user_id, &outcome);
    (response, failure)
}

/// Gather request bodies from a file or directory, sorted by path.
fn collect_requests(input: &Path) -> anyhow::Result<Vec<RequestSource>> {
    let mut files: Vec<PathBuf> = if input.is_file() {
        vec![input.to_path_buf()]
    } else {
        WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && request_kind(e.path()).is_some())
            .map(|e| e.into_path())
            .collect()
    };
    files.sort();

    let mut sources = Vec::new();
    for path in files {
        let content = std::fs::read_to_string(&path)?;
        match request_kind(&path) {
            Some(RequestKind::Lines) => {
                for (i, line) in content.lines().enumerate() {
                    if !line.trim().is_empty() {
                        sources.push(RequestSource {
                            label: format!("{}:{}", path.display(), i + 1),
                            body: line.to_string(),
                        });
                    }
                }
            }
            _ => sources.push(RequestSource {
                label: path.display().to_string(),
                body: content,
            }),
        }
    }
    Ok(sources)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Single,
    Lines,
}

fn request_kind(path: &Path) -> Option<RequestKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(RequestKind::Single),
        "jsonl" | "ndjson" => Some(RequestKind::Lines),
        _ => None,
    }
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

fn print_summary(tally: &Tally, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!(
        "  Submitted:  {:>8}",
        tally.accepted + tally.bad_input + tally.internal
    );
    eprintln!("  Accepted:   {:>8}", tally.accepted);
    eprintln!("  Bad input:  {:>8}", tally.bad_input);
    eprintln!("  Internal:   {:>8}", tally.internal);
    eprintln!("  Elapsed:    {:>7.2}s", elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kind() {
        assert_eq!(request_kind(Path::new("a.json")), Some(RequestKind::Single));
        assert_eq!(request_kind(Path::new("a.JSONL")), Some(RequestKind::Lines));
        assert_eq!(request_kind(Path::new("a.txt")), None);
    }

    #[test]
    fn test_collect_requests_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"user_id": "b"}"#).unwrap();
        std::fs::write(
            dir.path().join("a.jsonl"),
            "{\"user_id\": \"a1\"}\n\n{\"user_id\": \"a2\"}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sources = collect_requests(dir.path()).unwrap();
        let labels: Vec<&str> = sources.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(sources.len(), 3);
        assert!(labels[0].ends_with("a.jsonl:1"));
        assert!(labels[1].ends_with("a.jsonl:3"));
        assert!(labels[2].ends_with("b.json"));
    }

    #[tokio::test]
    async fn test_submit_one_reports_wire_error() {
        let pipeline = Pipeline::new(&Config::default()).unwrap();
        let (response, failure) =
            submit_one(&pipeline, r#"{"user_id": "u", "image": {"data": "!!"}}"#).await;
        assert_eq!(failure, Some(ErrorKind::BadInput));
        let commitment = response.commitment.unwrap();
        assert_eq!(commitment.user_id, "u");
        assert!(commitment.error.contains("base64"));
        assert!(!response.vector.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_submit_one_reports_validation_error() {
        let pipeline = Pipeline::new(&Config::default()).unwrap();
        let (response, failure) =
            submit_one(&pipeline, r#"{"device_id": "d", "user_id": "u"}"#).await;
        assert_eq!(failure, Some(ErrorKind::BadInput));
        assert_eq!(
            response.commitment.unwrap().error,
            "Image data cannot be empty"
        );
    }

    #[tokio::test]
    async fn test_submit_one_accepts_valid_request() {
        let pipeline = Pipeline::new(&Config::default()).unwrap();
        // 1x1 PNG
        let body = r#"{"device_id": "d", "user_id": "u", "session_id": "s",
            "image": {"format": "png", "data": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg=="}}"#;
        let (response, failure) = submit_one(&pipeline, body).await;
        assert_eq!(failure, None);
        assert!(response.is_ok());
    }

    #[test]
    fn test_tally_splits_failures_by_kind() {
        let mut tally = Tally::default();
        tally.record(None);
        tally.record(Some(ErrorKind::BadInput));
        tally.record(Some(ErrorKind::BadInput));
        tally.record(Some(ErrorKind::Internal));
        assert_eq!(
            tally,
            Tally {
                accepted: 1,
                bad_input: 2,
                internal: 1,
            }
        );
    }
}
