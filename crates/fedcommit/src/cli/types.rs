//! CLI enum types shared by subcommands.

use clap::ValueEnum;
use fedcommit_core::OutputFormat as CoreOutputFormat;

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl OutputFormat {
    /// Resolve the CLI flag, falling back to the `[output]` config format.
    pub fn resolve(flag: Option<Self>, configured: &str) -> Self {
        flag.unwrap_or_else(|| match CoreOutputFormat::parse(configured) {
            Some(CoreOutputFormat::JsonLines) => OutputFormat::Jsonl,
            _ => OutputFormat::Json,
        })
    }
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_flag() {
        assert!(matches!(
            OutputFormat::resolve(Some(OutputFormat::Json), "jsonl"),
            OutputFormat::Json
        ));
        assert!(matches!(
            OutputFormat::resolve(None, "jsonl"),
            OutputFormat::Jsonl
        ));
        assert!(matches!(
            OutputFormat::resolve(None, "bogus"),
            OutputFormat::Json
        ));
    }
}
