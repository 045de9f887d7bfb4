use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omnitext::{detect_format, Config, ContentExtractor, OmnitextError, Storage};

const LOG_FILE: &str = "omnitext.log";

#[derive(Parser)]
#[command(name = "omnitext")]
#[command(about = "Extract plain text from images, PDFs, audio, video, text and Word files")]
struct Args {
    /// Files to extract, processed in order
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Storage root for uploads, saved extractions and logs
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Print one JSON object per file instead of raw text
    #[arg(long)]
    json: bool,

    /// Copy each input into uploads/ and write its text to extracted/
    #[arg(long)]
    save: bool,
}

fn init_tracing(storage: &Storage, log_to_file: bool) -> anyhow::Result<()> {
    let file_layer = if log_to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(storage.logs_dir().join(LOG_FILE))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omnitext=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

fn report_failure(path: &std::path::Path, err: &OmnitextError, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string(),
                "error": { "kind": err.kind(), "message": err.to_string() },
            })
        );
    } else {
        eprintln!("{}: {err}", path.display());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(dir) = args.storage_dir {
        config.storage.root = dir;
    }

    let storage = Storage::init(&config.storage.root)?;
    init_tracing(&storage, config.storage.log_to_file)?;

    tracing::info!(
        storage = %storage.root().display(),
        files = args.paths.len(),
        "Starting omnitext"
    );

    let extractor = ContentExtractor::from_config(&config);
    let mut exit_code = 0;

    for path in &args.paths {
        let outcome = match extractor.extract(path).await {
            Ok(text) if args.save => match storage.store_upload(path).await {
                Ok(_) => storage.save_extracted(path, &text).await.map(|_| text),
                Err(e) => Err(e),
            },
            other => other,
        };

        match outcome {
            Ok(text) => {
                if args.json {
                    let format = detect_format(path).ok();
                    println!(
                        "{}",
                        serde_json::json!({
                            "path": path.display().to_string(),
                            "format": format,
                            "text": text,
                        })
                    );
                } else {
                    println!("{text}");
                }
            }
            Err(e) => {
                report_failure(path, &e, args.json);
                exit_code = e.exit_code();
            }
        }
    }

    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}
