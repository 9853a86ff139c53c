use std::path::PathBuf;

use clap::{Args, ValueEnum};
use neuronote_core::{Config, MlClient};

#[derive(Args)]
pub struct UploadArgs {
    /// File to process
    pub file: PathBuf,
    /// User the resulting note belongs to
    #[arg(long, default_value = "")]
    pub user: String,
    /// ML endpoint to call
    #[arg(long, value_enum, default_value_t = Endpoint::Pipeline)]
    pub endpoint: Endpoint,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Endpoint {
    /// Full extraction pipeline; creates a note
    Pipeline,
    /// Text blocks from an image
    Ocr,
    /// Audio transcription
    Asr,
}

pub fn run(args: UploadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = MlClient::with_timeout(&config.ml.base_url, config.ml.timeout_secs)?;

    let data = std::fs::read(&args.file)?;
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    let runtime = tokio::runtime::Runtime::new()?;
    match args.endpoint {
        Endpoint::Pipeline => {
            let note_id = runtime.block_on(client.pipeline(data, &filename, &args.user))?;
            println!("{}", serde_json::json!({ "note_id": note_id }));
        }
        Endpoint::Ocr => {
            let blocks = runtime.block_on(client.ocr(data, &filename, &args.user))?;
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        }
        Endpoint::Asr => {
            let transcript = runtime.block_on(client.asr(data, &filename, &args.user))?;
            println!("{}", serde_json::json!({ "transcript": transcript }));
        }
    }
    Ok(())
}
