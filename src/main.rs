mod config;
mod error;
mod s3;

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use config::{UploadConfig, DEFAULT_CONFIG_PATH};

#[::tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    match run(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}: {err}", err.phase());
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: &str) -> error::Result<()> {
    let config = UploadConfig::load(config_path)?;
    tracing::info!(
        file = %config.file_path.display(),
        bucket = %config.bucket_name,
        key = %config.object_name,
        endpoint = %config.endpoint,
        "configuration loaded"
    );

    let client = s3::connect(&config).await;
    let report = s3::multipart_upload(&client, &config).await?;
    println!(
        "success: {} -> {} | {} parts, {} bytes, upload id {} | time elapsed: {:?}",
        config.object_name,
        config.bucket_name,
        report.parts,
        report.bytes,
        report.upload_id,
        report.elapsed
    );
    Ok(())
}
