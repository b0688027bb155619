use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tainted::catalog::CatalogKind;
use tainted::commands::{self, AffectedOptions, OutputFormat};
use tainted::core::context::{AnalysisContext, ConfigOverrides};
use tainted::core::error::{TaintError, print_error};
use tracing_subscriber::EnvFilter;

/// Select the packages affected by a change, through their import graph
#[derive(Parser)]
#[command(name = "tainted")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(flatten)]
  common: CommonArgs,

  /// Increase log verbosity (-v info, -vv debug); TAINTED_LOG overrides
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

/// Where to analyze and how to learn the import graph
#[derive(Args)]
struct CommonArgs {
  /// Analysis root
  #[arg(long, global = true, default_value = ".")]
  dir: PathBuf,

  /// Package catalog backend
  #[arg(long, global = true, value_enum)]
  catalog: Option<CatalogKind>,

  /// Dependency manifest (implies --catalog manifest)
  #[arg(long, global = true, value_name = "FILE")]
  manifest: Option<PathBuf>,

  /// Import path of the analysis root (default: from `go list -m`)
  #[arg(long, global = true, value_name = "PREFIX")]
  import_prefix: Option<String>,

  /// Build tags for `go list`, comma-separated
  #[arg(long, global = true, value_delimiter = ',')]
  tags: Vec<String>,
}

/// Revision range selection
#[derive(Args)]
struct RangeArgs {
  /// Base revision (default: HEAD~1)
  #[arg(long)]
  from: Option<String>,

  /// Target revision (default: HEAD)
  #[arg(long)]
  to: Option<String>,

  /// Count changes to test files
  #[arg(long = "test", overrides_with = "no_test")]
  include_tests: bool,

  /// Ignore changes to test files, even when tainted.toml counts them
  #[arg(long, overrides_with = "include_tests")]
  no_test: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Print candidates affected by the revision range
  Affected {
    #[command(flatten)]
    range: RangeArgs,
    /// Read newline-delimited candidates from stdin instead of enumerating packages
    #[arg(long)]
    stdin: bool,
    /// Only report candidates under these directories (glob, repeatable)
    #[arg(long = "entrypoints", value_name = "GLOB")]
    entrypoints: Vec<String>,
    /// Worker threads (default: available parallelism)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    jobs: Option<u64>,
    /// Select candidates that fail to resolve instead of aborting
    #[arg(long)]
    keep_going: bool,
    /// A candidate's own directory counts as part of its impact set
    #[arg(long, overrides_with = "no_include_self")]
    include_self: bool,
    /// Only imports count, even when tainted.toml sets include_self
    #[arg(long, overrides_with = "include_self")]
    no_include_self: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Names)]
    format: OutputFormat,
    /// Show a progress bar on stderr
    #[arg(long)]
    progress: bool,
  },

  /// Print changed directories for the revision range
  Changed {
    #[command(flatten)]
    range: RangeArgs,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Print the dependency closure of a package
  Deps {
    /// Import path of the package
    import_path: String,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Print the packages known to the catalog
  Packages {
    /// Only list packages under these directories (glob, repeatable)
    #[arg(long = "entrypoints", value_name = "GLOB")]
    entrypoints: Vec<String>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr; stdout carries results only
fn init_tracing(verbose: u8) {
  let default_level = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_env("TAINTED_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let common = cli.common;
  let mut overrides = ConfigOverrides {
    catalog: common.catalog,
    manifest: common.manifest,
    import_prefix: common.import_prefix,
    tags: common.tags,
    ..Default::default()
  };

  let command = match cli.command {
    Commands::Affected {
      range,
      stdin,
      entrypoints,
      jobs,
      keep_going,
      include_self,
      no_include_self,
      format,
      progress,
    } => {
      apply_range(&mut overrides, range);
      overrides.entrypoints = entrypoints;
      overrides.jobs = jobs.map(|j| j as usize);
      overrides.include_self = switch(include_self, no_include_self);
      Run::Affected(AffectedOptions {
        stdin,
        format,
        progress,
        keep_going,
      })
    }
    Commands::Changed { range, json } => {
      apply_range(&mut overrides, range);
      Run::Changed { json }
    }
    Commands::Deps { import_path, json } => Run::Deps { import_path, json },
    Commands::Packages { entrypoints, json } => {
      overrides.entrypoints = entrypoints;
      Run::Packages { json }
    }
  };

  // Build analysis context once (config + overrides); catalogs are created on demand
  let ctx = match AnalysisContext::build(&common.dir, overrides) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match command {
    Run::Affected(options) => commands::run_affected(&ctx, options),
    Run::Changed { json } => commands::run_changed(&ctx, json),
    Run::Deps { import_path, json } => commands::run_deps(&ctx, &import_path, json),
    Run::Packages { json } => commands::run_packages(&ctx, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

/// Parsed command, detached from its config overrides
enum Run {
  Affected(AffectedOptions),
  Changed { json: bool },
  Deps { import_path: String, json: bool },
  Packages { json: bool },
}

fn apply_range(overrides: &mut ConfigOverrides, range: RangeArgs) {
  overrides.from = range.from;
  overrides.to = range.to;
  overrides.include_tests = switch(range.include_tests, range.no_test);
}

/// `--flag` / `--no-flag` pair; neither leaves the config value alone
fn switch(on: bool, off: bool) -> Option<bool> {
  match (on, off) {
    (true, _) => Some(true),
    (_, true) => Some(false),
    _ => None,
  }
}

fn handle_error(err: TaintError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
