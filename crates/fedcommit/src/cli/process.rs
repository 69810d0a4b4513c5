//! The `fedcommit process` command: one image file, identifiers from flags.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Args;
use fedcommit_core::{Config, ImagePayload, Pipeline, Submission, SubmissionResponse};

use super::types::OutputFormat;
use super::{open_writer, Rejected};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file to submit (JPEG or PNG)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Submitting device identifier
    #[arg(long)]
    pub device_id: String,

    /// User identifier the commitment is made for
    #[arg(long)]
    pub user_id: String,

    /// Session identifier
    #[arg(long)]
    pub session_id: String,

    /// Session issue time (RFC 3339), checked when sessions expire
    #[arg(long, value_parser = parse_timestamp)]
    pub session_issued_at: Option<DateTime<Utc>>,

    /// Free-form context bound into the commitment
    #[arg(long, default_value = "")]
    pub context: String,

    /// Declared content type (defaults to one guessed from the file extension)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Disable feature vector extraction
    #[arg(long)]
    pub no_vector: bool,

    /// Disable commitment generation
    #[arg(long)]
    pub no_commitment: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.is_file() {
        anyhow::bail!(
            "Input file does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }
    if args.no_vector && args.no_commitment {
        anyhow::bail!("Nothing to do: both --no-vector and --no-commitment were given.");
    }
    if args.no_vector {
        config.services.vector = false;
    }
    if args.no_commitment {
        config.services.commitment = false;
    }

    let pipeline = Pipeline::new(&config)?;
    tracing::debug!("Using feature extractor v{}", pipeline.extractor().version());
    let data = tokio::fs::read(&args.input).await?;
    let content_type = args
        .content_type
        .clone()
        .or_else(|| guess_content_type(&args.input).map(str::to_string));

    let submission = Submission {
        device_id: args.device_id.clone(),
        user_id: args.user_id.clone(),
        session_id: args.session_id.clone(),
        session_issued_at: args.session_issued_at,
        image: ImagePayload::new(data, content_type),
        context: args.context.clone(),
        ..Submission::default()
    };

    let outcome = pipeline.process(submission).await;
    let response = SubmissionResponse::from_outcome(pipeline.services(), &args.user_id, &outcome);

    let format = OutputFormat::resolve(args.format, &config.output.format);
    let mut writer = open_writer(args.output.as_deref(), format, config.output.pretty)?;
    writer.write(&response)?;
    writer.flush()?;
    if let Some(path) = &args.output {
        tracing::info!("Output written to {:?}", path);
    }

    outcome.map_err(Rejected::from)?;
    Ok(())
}

/// Map a file extension to the content type clients would declare.
fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(guess_content_type(Path::new("a.png")), Some("image/png"));
        assert_eq!(guess_content_type(Path::new("a.gif")), Some("image/gif"));
        assert_eq!(guess_content_type(Path::new("a")), None);
    }

    fn args(input: PathBuf, output: PathBuf) -> ProcessArgs {
        ProcessArgs {
            input,
            device_id: "d1".into(),
            user_id: "u1".into(),
            session_id: "s1".into(),
            session_issued_at: None,
            context: String::new(),
            content_type: None,
            no_vector: false,
            no_commitment: false,
            output: Some(output),
            format: None,
        }
    }

    #[tokio::test]
    async fn test_unsupported_image_exits_as_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.gif");
        let output = dir.path().join("out.json");
        std::fs::write(&input, b"GIF89a\x01\x00").unwrap();

        let err = execute(args(input, output.clone()), Config::default())
            .await
            .unwrap_err();
        let rejected = err.downcast_ref::<Rejected>().unwrap();
        assert_eq!(rejected.exit_code(), crate::cli::EXIT_BAD_INPUT);

        let written = std::fs::read_to_string(output).unwrap();
        assert!(written.contains("Unsupported image format"));
    }

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("2026-03-01T12:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-03-01T10:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
