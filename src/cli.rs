use crate::config::{ConfigLoader, PanelConfig};
use crate::engine::PipelineClient;
use crate::model::{PanelEvent, RunState, EXAMPLE_NEWS};
use crate::orchestrator::{execute, PanelController};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "mbtiverse-panel",
    version,
    about = "Submit a news item to the MBTIverse analysis service and read the panel's reactions"
)]
pub struct Cli {
    /// Print the rendered panel as plain text and exit (no TUI)
    #[arg(long, conflicts_with = "json")]
    pub text: bool,

    /// Print the parsed result as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// News text to analyze
    #[arg(long, conflicts_with_all = ["news_file", "example"])]
    pub news: Option<String>,

    /// Read the news text from a file (`-` for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "example")]
    pub news_file: Option<PathBuf>,

    /// Use the built-in example news item
    #[arg(long)]
    pub example: bool,

    /// Base URL of the analysis service
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output token budget sent with the request
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Whole-request timeout (e.g. `90s`, `2m`)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Path to an extra config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log structured meta reviews that fail to parse
    #[arg(long)]
    pub log_parse_failures: bool,

    /// Write logs to this file (the TUI discards logs otherwise)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// True when no one-shot mode was requested and the TUI is compiled in.
    pub fn wants_tui(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;

    if args.wants_tui() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg).await;
        }
    }

    if args.json {
        return run_once(&args, cfg, OneShot::Json).await;
    }

    run_once(&args, cfg, OneShot::Text).await
}

/// Load layered configuration, then apply CLI flags on top.
pub fn build_config(args: &Cli) -> Result<PanelConfig> {
    let mut cfg = ConfigLoader::load(args.config.as_deref())
        .map_err(|e| anyhow!("failed to load configuration: {e}"))?;

    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(max_tokens) = args.max_tokens {
        cfg.max_tokens = max_tokens;
    }
    if let Some(timeout) = args.timeout {
        cfg.timeout = timeout.into();
    }
    if args.log_parse_failures {
        cfg.log_parse_failures = true;
    }
    Ok(cfg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OneShot {
    Text,
    Json,
}

/// Resolve the news text for one-shot modes.
fn read_news(args: &Cli) -> Result<String> {
    if args.example {
        return Ok(EXAMPLE_NEWS.to_string());
    }
    if let Some(news) = &args.news {
        return Ok(news.clone());
    }
    if let Some(path) = &args.news_file {
        return read_news_file(path);
    }
    bail!("no news given; pass --news, --news-file or --example")
}

fn read_news_file(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read news from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read news file {}", path.display()))
}

/// Submit once, wait for the outcome, print it.
async fn run_once(args: &Cli, cfg: PanelConfig, mode: OneShot) -> Result<()> {
    let mut controller = PanelController::new(cfg.max_tokens);
    controller.set_text(read_news(args)?);
    let Some(ticket) = controller.submit() else {
        bail!("news text is empty; nothing was submitted");
    };

    let client = PipelineClient::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    if mode == OneShot::Text {
        let _ = out_tx.send(OutputLine::Stderr(format!("Submitting to {} …", client.url())));
    }

    if let PanelEvent::Completed { seq, outcome } = execute(&client, ticket).await {
        controller.complete(seq, outcome);
    }

    let outcome = match controller.state() {
        RunState::Succeeded(result) => {
            match mode {
                OneShot::Json => {
                    let out = serde_json::to_string_pretty(result)?;
                    let _ = out_tx.send(OutputLine::Stdout(out));
                }
                OneShot::Text => {
                    let summary = crate::text_summary::build_text_summary(
                        result,
                        &cfg.render_options(),
                    );
                    for line in summary.lines {
                        let _ = out_tx.send(OutputLine::Stdout(line));
                    }
                }
            }
            Ok(())
        }
        RunState::Failed(message) => Err(anyhow!("request failed: {message}")),
        other => Err(anyhow!("request did not complete (state: {})", other.label())),
    };

    drop(out_tx);
    let _ = out_handle.await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["mbtiverse-panel"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "--text",
            "--base-url",
            "http://example.test:9000",
            "--max-tokens",
            "256",
            "--timeout",
            "15s",
            "--log-parse-failures",
        ]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.base_url, "http://example.test:9000");
        assert_eq!(cfg.max_tokens, 256);
        assert_eq!(cfg.timeout, std::time::Duration::from_secs(15));
        assert!(cfg.log_parse_failures);
    }

    #[test]
    fn test_one_shot_modes_conflict() {
        let argv = ["mbtiverse-panel", "--text", "--json"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_news_sources_conflict() {
        let argv = ["mbtiverse-panel", "--news", "a", "--example"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_one_shot_modes_skip_tui() {
        assert!(!parse(&["--json"]).wants_tui());
        assert!(!parse(&["--text"]).wants_tui());
    }

    #[test]
    fn test_read_news_sources() {
        assert_eq!(read_news(&parse(&["--example"])).unwrap(), EXAMPLE_NEWS);
        assert_eq!(read_news(&parse(&["--news", "hello"])).unwrap(), "hello");
        assert!(read_news(&parse(&[])).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.txt");
        std::fs::write(&path, "from a file\n").unwrap();
        let args = parse(&["--news-file", path.to_str().unwrap()]);
        assert_eq!(read_news(&args).unwrap(), "from a file\n");
    }

    #[tokio::test]
    async fn test_blank_news_is_rejected_without_network() {
        let args = parse(&["--text", "--news", "   ", "--base-url", "http://127.0.0.1:9"]);
        let cfg = build_config(&args).unwrap();
        let err = run_once(&args, cfg, OneShot::Text).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
