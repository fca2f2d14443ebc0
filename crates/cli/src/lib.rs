use crate::app::{history_item, App};
use crate::sources::SourcesConfig;
use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use claimcheck_history::{JsonlHistory, VerdictSink};
use claimcheck_protocol::{
    parse_evidence_groups, serialize_json, ErrorEnvelope, HistoryResponse, VerifyResponse,
};
use claimcheck_similarity::BackendKind;
use claimcheck_verdict::{VerdictConfig, VerdictError, VerdictPipeline, VerdictResult};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

pub mod app;
pub mod http_api;
pub mod sources;

#[derive(Parser)]
#[command(name = "claimcheck")]
#[command(about = "Check a claim against news and social evidence", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Verdict configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Similarity backend (overrides CLAIMCHECK_SIMILARITY_BACKEND)
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// History file (JSON Lines)
    #[arg(long, global = true, default_value = ".claimcheck/history.jsonl")]
    history: PathBuf,

    /// Do not record or read history
    #[arg(long, global = true)]
    no_history: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Tfidf,
    Embedding,
}

impl BackendArg {
    const fn as_kind(self) -> BackendKind {
        match self {
            Self::Tfidf => BackendKind::Tfidf,
            Self::Embedding => BackendKind::Embedding,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a claim
    Verify(VerifyArgs),

    /// List or clear past checks
    History(HistoryArgs),

    /// Validate configuration and print the effective values
    CheckConfig,

    /// Serve the verification API over HTTP
    ServeHttp(ServeArgs),
}

#[derive(Args)]
struct VerifyArgs {
    /// Claim text
    text: String,

    /// JSON file with pre-fetched evidence groups instead of live retrieval
    #[arg(long)]
    evidence: Option<PathBuf>,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// Number of entries to show
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Remove all entries
    #[arg(long)]
    clear: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: String,
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Verify(args) => args.json,
        Commands::History(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper connection chatter is only useful when verbose
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_ref())?;

    match &cli.command {
        Commands::Verify(args) => run_verify(&cli, args, config).await?,
        Commands::History(args) => run_history(&cli, args).await?,
        Commands::CheckConfig => run_check_config(&cli, &config)?,
        Commands::ServeHttp(args) => {
            let app = build_app(&cli, config, true)?;
            http_api::serve(&args.bind, Arc::new(app)).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<VerdictConfig> {
    match path {
        Some(path) => VerdictConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(VerdictConfig::default()),
    }
}

fn resolve_backend(cli: &Cli) -> Result<BackendKind> {
    match cli.backend {
        Some(arg) => Ok(arg.as_kind()),
        None => BackendKind::from_env().context("Invalid similarity backend"),
    }
}

fn open_history(cli: &Cli) -> Option<Arc<dyn VerdictSink>> {
    if cli.no_history {
        return None;
    }
    Some(Arc::new(JsonlHistory::new(&cli.history)))
}

fn build_app(cli: &Cli, config: VerdictConfig, live_sources: bool) -> Result<App> {
    let backend = resolve_backend(cli)?;
    let pipeline = VerdictPipeline::new(backend.build(), Arc::new(config));
    let sources = if live_sources {
        SourcesConfig::from_env()?.build()?
    } else {
        Vec::new()
    };
    Ok(App::new(pipeline, sources, open_history(cli), backend))
}

async fn run_verify(cli: &Cli, args: &VerifyArgs, config: VerdictConfig) -> Result<()> {
    let evidence = match &args.evidence {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read evidence file {}", path.display()))?;
            Some(parse_evidence_groups(&raw).context("Invalid evidence file")?)
        }
        None => None,
    };

    let app = build_app(cli, config, evidence.is_none())?;
    let result = match app.verify(&args.text, evidence).await {
        Ok(result) => result,
        Err(VerdictError::InvalidInput(message)) => {
            if args.json {
                print_stdout(&serialize_json(&ErrorEnvelope::invalid_input(message.clone()))?)?;
            }
            anyhow::bail!("Invalid input: {message}");
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        print_stdout(&serialize_json(&VerifyResponse::from(&result))?)
    } else {
        print_stdout(&render_result(&result))
    }
}

fn render_result(result: &VerdictResult) -> String {
    let mut out = format!("Verdict: {} (score {:.2})", result.verdict, result.score);
    if result.evidence.is_empty() {
        out.push_str("\nNo evidence found.");
    }
    for item in &result.evidence {
        let label = item
            .meta
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .unwrap_or(item.text.as_str());
        out.push_str(&format!(
            "\n  [{}] {:.2}  {}",
            item.source_type, item.similarity, label
        ));
        if let Some(url) = item.meta.as_ref().and_then(|m| m.url.as_deref()) {
            out.push_str(&format!("\n         {url}"));
        }
    }
    out
}

async fn run_history(cli: &Cli, args: &HistoryArgs) -> Result<()> {
    let Some(history) = open_history(cli) else {
        anyhow::bail!("History is disabled (--no-history)");
    };

    if args.clear {
        let removed = history.clear().await?;
        return if args.json {
            print_stdout(&serialize_json(&claimcheck_protocol::ClearHistoryResponse {
                removed,
            })?)
        } else {
            print_stdout(&format!("Removed {removed} entries"))
        };
    }

    let entries = history.recent(args.limit).await?;
    if args.json {
        let response = HistoryResponse {
            items: entries.iter().map(history_item).collect(),
        };
        return print_stdout(&serialize_json(&response)?);
    }

    if entries.is_empty() {
        return print_stdout("No checks recorded yet.");
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "#{:<4} {}  {:<12} {:.2}  {}",
                e.id,
                e.created_at.format("%Y-%m-%d %H:%M"),
                e.verdict.as_str(),
                e.score,
                e.query_text
            )
        })
        .collect();
    print_stdout(&lines.join("\n"))
}

fn run_check_config(cli: &Cli, config: &VerdictConfig) -> Result<()> {
    let backend = resolve_backend(cli)?;
    let sources = SourcesConfig::from_env()?;
    let mut out = config.to_toml_string()?;
    out.push_str(&format!("\n# similarity backend: {backend}\n"));
    out.push_str(&format!(
        "# article search: {}, tweet search: {}\n",
        if sources.newsapi_key.is_some() { "enabled" } else { "disabled" },
        if sources.twitter_bearer.is_some() { "enabled" } else { "disabled" },
    ));
    print_stdout(out.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcheck_verdict::{EvidenceMeta, ScoredEvidence, SourceType, Verdict};

    #[test]
    fn renders_titles_and_urls_for_articles() {
        let result = VerdictResult {
            verdict: Verdict::Unsure,
            score: 0.63,
            evidence: vec![ScoredEvidence {
                source_type: SourceType::article(),
                similarity: 0.9,
                text: "Dam opens Officials confirm".to_string(),
                meta: Some(EvidenceMeta {
                    source: None,
                    title: Some("Dam opens".to_string()),
                    url: Some("https://example.com/dam".to_string()),
                }),
            }],
        };
        let rendered = render_result(&result);
        assert!(rendered.starts_with("Verdict: Unsure (score 0.63)"));
        assert!(rendered.contains("[article] 0.90  Dam opens"));
        assert!(rendered.contains("https://example.com/dam"));
    }

    #[test]
    fn renders_empty_evidence() {
        let rendered = render_result(&VerdictResult::no_evidence());
        assert!(rendered.contains("No evidence found."));
    }
}
