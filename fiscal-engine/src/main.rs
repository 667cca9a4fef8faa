use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use fiscal_engine::{
    EngineConfig, FileCredentialsProvider, FiscalEngine, InMemoryRepository, InvoiceDraft,
    init_logger_with_file,
};
use pac_client::HttpPacClient;

/// Validate and stamp CFDI 4.0 invoices from JSON drafts
#[derive(Parser, Debug)]
#[command(name = "fiscal-engine", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a draft and print its totals and unsigned XML
    Preview {
        /// Invoice draft (invoice, items, emitter, receiver) as JSON
        file: PathBuf,
    },
    /// Seal and stamp a draft through the configured PAC
    Stamp {
        file: PathBuf,
        /// Write the stamped XML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = EngineConfig::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    tracing::debug!(?config, "Configuration loaded");

    let pac = HttpPacClient::new(&config.pac_config()).context("invalid PAC configuration")?;
    let credentials = FileCredentialsProvider::new(&config.csd_dir);

    match args.command {
        Command::Preview { file } => {
            let repository = InMemoryRepository::new();
            let invoice_id = load_draft(&repository, &file, &config)?;
            let engine = FiscalEngine::new(repository, credentials, pac);

            let report = engine.preview(&invoice_id).await?;
            println!("{}", serde_json::to_string_pretty(&report.totals)?);
            for message in &report.messages {
                println!("- {}", message);
            }
            if let Some(xml) = &report.xml {
                println!("{}", xml);
            }
            if !report.is_ready() {
                anyhow::bail!("{} validation message(s)", report.messages.len());
            }
        }
        Command::Stamp { file, output } => {
            let repository = InMemoryRepository::new();
            let invoice_id = load_draft(&repository, &file, &config)?;
            let engine = FiscalEngine::new(repository, credentials, pac);

            let outcome = match engine.stamp(&invoice_id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let classified = e.classify();
                    eprintln!("{}", serde_json::to_string_pretty(&classified)?);
                    anyhow::bail!("stamping failed: {}", classified.code);
                }
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &outcome.result.stamped_xml)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{}", outcome.uuid);
                }
                None => println!("{}", outcome.result.stamped_xml),
            }
        }
    }

    Ok(())
}

/// Load a JSON draft into the repository and return its invoice id
fn load_draft(
    repository: &InMemoryRepository,
    path: &Path,
    config: &EngineConfig,
) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut draft: InvoiceDraft = serde_json::from_str(&raw)
        .with_context(|| format!("invalid invoice draft in {}", path.display()))?;

    draft.invoice.environment = config.environment;
    draft.invoice.emitter_id = draft.emitter.id.clone();
    draft.invoice.receiver_id = draft.receiver.id.clone();

    let invoice_id = draft.invoice.id.clone();
    repository.insert_invoice(draft.invoice, draft.items);
    repository.insert_party(draft.emitter);
    repository.insert_party(draft.receiver);
    Ok(invoice_id)
}
