//! Subcommand implementations.

pub mod config;
pub mod process;
pub mod submit;
pub mod types;
pub mod verify;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use fedcommit_core::{Config, ErrorKind, OutputWriter, PipelineError};

use types::OutputFormat;

/// Exit code for a submission rejected as bad input.
pub const EXIT_BAD_INPUT: i32 = 2;

/// Exit code for a submission that failed on the serving side.
pub const EXIT_INTERNAL: i32 = 3;

/// A submission the pipeline refused; the process exits by its kind.
#[derive(Debug, thiserror::Error)]
#[error("Submission rejected in {} stage: {source}", .source.stage())]
pub struct Rejected {
    #[from]
    pub source: PipelineError,
}

impl Rejected {
    pub fn exit_code(&self) -> i32 {
        exit_code(self.source.kind())
    }
}

/// Map an error kind to the process exit code.
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::BadInput => EXIT_BAD_INPUT,
        ErrorKind::Internal => EXIT_INTERNAL,
    }
}

/// Load configuration from an explicit path, or the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Open a result writer on a file, or stdout when no path is given.
pub fn open_writer(
    output: Option<&Path>,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<OutputWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    Ok(OutputWriter::new(sink, format.into(), pretty))
}
