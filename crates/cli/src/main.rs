use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filler_core::{
    dates, extraction::GeminiExtractor, DocumentId, FileRecordSource, FillerConfig,
    GoogleSlidesStore, HttpRecordSource, MemoryDocumentStore, RecordSource, TemplateFiller,
};

#[derive(Parser)]
#[command(name = "slide-filler")]
#[command(about = "Fill presentation templates from patient records")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the configured record and fill the configured template
    Pull {
        /// Template id (overrides SLIDES_TEMPLATE_ID)
        #[arg(long)]
        template: Option<String>,
    },
    /// Fill the configured template from a record file
    Fill {
        /// JSON file holding the record, an envelope or a keyed collection
        record: PathBuf,
        /// Member of the file holding the record
        #[arg(long)]
        key: Option<String>,
        /// Template id (overrides SLIDES_TEMPLATE_ID)
        #[arg(long)]
        template: Option<String>,
    },
    /// Fill a local deck file without touching Google, printing the result
    Preview {
        /// JSON file holding the record
        record: PathBuf,
        /// Deck JSON file used as the template
        #[arg(long)]
        deck: PathBuf,
        /// Member of the record file holding the record
        #[arg(long)]
        key: Option<String>,
        /// Write the filled deck here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract a record envelope from a free-text clinical history file
    Extract {
        /// Text file with the clinical history
        history: PathBuf,
        /// POST the envelope to this fill endpoint
        #[arg(long)]
        send: Option<String>,
    },
    /// Print the date of the next Tuesday
    NextTuesday {
        /// Reference date (YYYY-MM-DD), today by default
        #[arg(long)]
        from: Option<NaiveDate>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filler_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Pull { template }) => {
            let cfg = config(template)?;
            let source = HttpRecordSource::from_config(&cfg)?;
            fill_with_google(&cfg, &source)?;
        }
        Some(Commands::Fill {
            record,
            key,
            template,
        }) => {
            let cfg = config(template)?;
            let key = key.or_else(|| cfg.record_key().map(str::to_owned));
            let source = FileRecordSource::new(record, key);
            fill_with_google(&cfg, &source)?;
        }
        Some(Commands::Preview {
            record,
            deck,
            key,
            out,
        }) => preview(&record, &deck, key, out.as_deref())?,
        Some(Commands::Extract { history, send }) => {
            let cfg = FillerConfig::from_env()?;
            let text = std::fs::read_to_string(&history)
                .with_context(|| format!("reading {}", history.display()))?;
            let envelope = GeminiExtractor::from_config(&cfg)?.extract(&text)?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);

            if let Some(url) = send {
                send_envelope(&cfg, &url, &envelope)?;
            }
        }
        Some(Commands::NextTuesday { from }) => {
            let from = from.unwrap_or_else(filler_core::local_today);
            let next = dates::next_tuesday(from)
                .with_context(|| format!("no Tuesday after {from}"))?;
            println!("{}", dates::format_br(next));
        }
        None => {
            println!("Use 'slide-filler --help' for commands");
        }
    }

    Ok(())
}

fn config(template: Option<String>) -> anyhow::Result<FillerConfig> {
    let cfg = FillerConfig::from_env()?;
    Ok(match template {
        Some(template) => cfg.with_template_id(DocumentId::new(template)?),
        None => cfg,
    })
}

fn fill_with_google(cfg: &FillerConfig, source: &dyn RecordSource) -> anyhow::Result<()> {
    let template = cfg.template_id()?;
    let record = source.fetch()?;
    let filler = TemplateFiller::new(Arc::new(GoogleSlidesStore::from_config(cfg)?));

    let filled = filler.fill(&record, template, filler_core::local_today())?;
    println!("Filled document {} ({})", filled.id, filled.name);
    Ok(())
}

fn preview(
    record: &Path,
    deck: &Path,
    key: Option<String>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let record = FileRecordSource::new(record, key).fetch()?;
    let store = Arc::new(MemoryDocumentStore::new());
    let template = store.load_deck(deck)?;

    let filled = TemplateFiller::new(store.clone()).fill(
        &record,
        &template,
        filler_core::local_today(),
    )?;
    let json = store.deck_json(&filled.id)?;

    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} ({} exam slide(s))", path.display(), filled.exam_slides.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn send_envelope(
    cfg: &FillerConfig,
    url: &str,
    envelope: &serde_json::Value,
) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs()))
        .build()?;
    let mut req = client.post(url).json(envelope);
    if let Some(key) = cfg.api_key() {
        req = req.header("x-api-key", key);
    }

    let res = req.send()?;
    let status = res.status();
    let body = res.text()?;
    tracing::info!("fill endpoint answered {}", status);
    if !status.is_success() {
        anyhow::bail!("fill endpoint answered {status}: {body}");
    }
    println!("{body}");
    Ok(())
}
