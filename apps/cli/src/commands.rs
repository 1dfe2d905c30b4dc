//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pagetrail_core::pipeline::{ProgressReporter, ScrapeConfig, ScrapeResult};
use pagetrail_shared::{
    AppConfig, ReportFormat, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pagetrail: crawl a documentation site into a single report.
#[derive(Parser)]
#[command(
    name = "pagetrail",
    version,
    about = "Crawl a site breadth-first from a start URL and save every page it reaches.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.pagetrail/pagetrail.toml.
    #[arg(long, global = true, env = "PAGETRAIL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report format flag.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FormatArg {
    Markdown,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl a site starting from URL and write the report.
    Crawl {
        /// Start URL; only pages under its path are followed.
        url: String,

        #[command(flatten)]
        overrides: CrawlOverrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags that override values from the config file.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct CrawlOverrides {
    /// Maximum link hops from the start page.
    #[arg(short, long, allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Report output path.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Report format.
    #[arg(short, long)]
    pub format: Option<FormatArg>,

    /// Maximum concurrent fetches.
    #[arg(long)]
    pub concurrency: Option<u32>,

    /// Pause before each request, in milliseconds.
    #[arg(long)]
    pub rate_limit_ms: Option<u64>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pagetrail=info",
        1 => "pagetrail=debug",
        _ => "pagetrail=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Crawl { url, overrides } => cmd_crawl(&url, &overrides, config_path).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

/// Merge CLI flags over the loaded config.
fn scrape_config(url: &str, overrides: &CrawlOverrides, app: &AppConfig) -> ScrapeConfig {
    let mut config = ScrapeConfig::new(url, app);
    if let Some(depth) = overrides.depth {
        config.max_depth = depth;
    }
    // The format may rename the default output; an explicit path wins.
    if let Some(format) = overrides.format {
        config = config.with_format(format.into());
    }
    if let Some(out) = &overrides.out {
        config.output = out.clone();
    }
    if let Some(concurrency) = overrides.concurrency {
        config.crawl.concurrency = concurrency;
    }
    if let Some(rate_limit_ms) = overrides.rate_limit_ms {
        config.crawl.rate_limit_ms = rate_limit_ms;
    }
    config
}

async fn cmd_crawl(url: &str, overrides: &CrawlOverrides, config_path: Option<&Path>) -> Result<()> {
    let app = resolve_config(config_path)?;
    let config = scrape_config(url, overrides, &app);

    info!(
        url,
        max_depth = config.max_depth,
        output = %config.output.display(),
        "crawling site"
    );

    // Ctrl-C stops the crawl between pages; what was fetched is still saved.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight pages");
            on_interrupt.cancel();
        }
    });

    let reporter = CliProgress::new()?;
    let result = pagetrail_core::pipeline::scrape_and_save_until(&config, &reporter, cancel).await;
    reporter.spinner.finish_and_clear();
    let result = result?;

    for (page, error) in &result.summary.failures {
        warn!(url = %page, %error, "page not saved");
    }

    println!();
    if result.summary.cancelled {
        println!("  Crawl interrupted, partial results saved.");
    } else {
        println!("  Crawl complete!");
    }
    println!("  Start:   {}", result.summary.root_url);
    println!("  Pages:   {}", result.page_count);
    println!("  Failed:  {}", result.summary.pages_failed);
    println!("  Report:  {}", result.report_path.display());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_fetched(&self, url: &str, fetched: usize, queued: usize) {
        self.spinner
            .set_message(format!("Fetched {fetched} ({queued} queued) {url}"));
    }

    fn page_failed(&self, url: &str, error: &str) {
        self.spinner.println(format!("  failed: {url} ({error})"));
    }

    fn done(&self, _result: &ScrapeResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let source = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    println!("# {}", source.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
