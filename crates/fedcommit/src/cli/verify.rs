//! The `fedcommit verify` command: re-derive a commitment and compare.

use std::path::PathBuf;

use clap::Args;
use fedcommit_core::CommitmentBuilder;

/// Arguments for the `verify` command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// The original image file, byte for byte
    #[arg(required = true)]
    pub input: PathBuf,

    /// Device identifier used at submission time
    #[arg(long)]
    pub device_id: String,

    /// User identifier used at submission time
    #[arg(long)]
    pub user_id: String,

    /// Context string used at submission time
    #[arg(long, default_value = "")]
    pub context: String,

    /// The claimed commitment, as hex
    #[arg(long)]
    pub hash: String,
}

/// Execute the verify command.
pub async fn execute(args: VerifyArgs) -> anyhow::Result<()> {
    if !args.input.is_file() {
        anyhow::bail!(
            "Input file does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }
    let image = tokio::fs::read(&args.input).await?;

    match CommitmentBuilder::verify(
        &args.device_id,
        &args.user_id,
        &image,
        &args.context,
        &args.hash,
    ) {
        Ok(()) => {
            tracing::info!("Commitment verified for user {}", args.user_id);
            println!("OK {}", args.hash.trim().to_ascii_lowercase());
            Ok(())
        }
        Err(mismatch) => {
            println!("MISMATCH {}", mismatch.actual);
            Err(mismatch.into())
        }
    }
}
