//! Error types for tainted with contextual messages and exit codes
//!
//! Every failure of a run is one of a small set of categories. Each category knows
//! its exit code and, where there is something useful to say, a help message.
//! Nothing here is recoverable within a run: errors travel up to `main`, which
//! prints a single diagnostic line and exits.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for tainted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, go, I/O)
  System = 2,
  /// A package closure could not be resolved
  Resolution = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for tainted
#[derive(Debug)]
pub enum TaintError {
  /// Configuration errors
  Config(ConfigError),

  /// Revision range or repository errors
  ChangeSet(ChangeSetError),

  /// Package enumeration or metadata errors
  Catalog(CatalogError),

  /// An import could not be resolved while building a closure
  Resolution(ResolutionError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl TaintError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    TaintError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    TaintError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      TaintError::Message { message, context, help } => TaintError::Message {
        message,
        context: Some(context.map(|c| format!("{}: {}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      TaintError::Io(err) => TaintError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      TaintError::Config(_) => ExitCode::User,
      TaintError::ChangeSet(_) => ExitCode::System,
      TaintError::Catalog(_) => ExitCode::System,
      TaintError::Resolution(_) => ExitCode::Resolution,
      TaintError::Io(_) => ExitCode::System,
      TaintError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      TaintError::Config(e) => e.help_message(),
      TaintError::ChangeSet(e) => e.help_message(),
      TaintError::Catalog(e) => e.help_message(),
      TaintError::Resolution(e) => e.cause.help_message(),
      TaintError::Message { help, .. } => help.clone(),
      TaintError::Io(_) => None,
    }
  }
}

impl fmt::Display for TaintError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TaintError::Config(e) => write!(f, "{}", e),
      TaintError::ChangeSet(e) => write!(f, "{}", e),
      TaintError::Catalog(e) => write!(f, "{}", e),
      TaintError::Resolution(e) => write!(f, "{}", e),
      TaintError::Io(e) => write!(f, "I/O error: {}", e),
      TaintError::Message { message, context, .. } => {
        if let Some(ctx) = context {
          write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", message)
      }
    }
  }
}

impl std::error::Error for TaintError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TaintError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for TaintError {
  fn from(err: io::Error) -> Self {
    TaintError::Io(err)
  }
}

impl From<String> for TaintError {
  fn from(msg: String) -> Self {
    TaintError::message(msg)
  }
}

impl From<&str> for TaintError {
  fn from(msg: &str) -> Self {
    TaintError::message(msg)
  }
}

impl From<ConfigError> for TaintError {
  fn from(err: ConfigError) -> Self {
    TaintError::Config(err)
  }
}

impl From<ChangeSetError> for TaintError {
  fn from(err: ChangeSetError) -> Self {
    TaintError::ChangeSet(err)
  }
}

impl From<CatalogError> for TaintError {
  fn from(err: CatalogError) -> Self {
    TaintError::Catalog(err)
  }
}

impl From<ResolutionError> for TaintError {
  fn from(err: ResolutionError) -> Self {
    TaintError::Resolution(err)
  }
}

impl From<serde_json::Error> for TaintError {
  fn from(err: serde_json::Error) -> Self {
    TaintError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for TaintError {
  fn from(err: glob::PatternError) -> Self {
    TaintError::message(format!("Invalid pattern: {}", err))
  }
}

impl From<rayon::ThreadPoolBuildError> for TaintError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    TaintError::message(format!("Failed to start worker pool: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but could not be read or parsed
  Unreadable { path: PathBuf, reason: String },

  /// A field holds a value we cannot work with
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Unreadable { .. } => Some("Check the TOML syntax of the configuration file.".to_string()),
      ConfigError::Invalid { field, .. } if field == "catalog.manifest" => {
        Some("Pass --manifest <file> or set catalog.manifest in tainted.toml.".to_string())
      }
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Unreadable { path, reason } => {
        write!(f, "Failed to load config {}: {}", path.display(), single_line(reason))
      }
      ConfigError::Invalid { field, reason } => write!(f, "Invalid config value for '{}': {}", field, reason),
    }
  }
}

/// Revision range and repository errors
#[derive(Debug)]
pub enum ChangeSetError {
  /// Root is not inside a git repository
  RepoNotFound { path: PathBuf },

  /// A revision does not name a commit
  UnknownRevision { rev: String },

  /// Git command failed
  CommandFailed { command: String, stderr: String },
}

impl ChangeSetError {
  fn help_message(&self) -> Option<String> {
    match self {
      ChangeSetError::RepoNotFound { path } => Some(format!(
        "Point --dir at a directory inside a git repository (got {}).",
        path.display()
      )),
      ChangeSetError::UnknownRevision { rev } => Some(format!(
        "Fetch the missing history (e.g. `git fetch --unshallow`) or check that '{}' exists.",
        rev
      )),
      ChangeSetError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for ChangeSetError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ChangeSetError::RepoNotFound { path } => write!(f, "Git repository not found at: {}", path.display()),
      ChangeSetError::UnknownRevision { rev } => write!(f, "Unknown revision: {}", rev),
      ChangeSetError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}: {}", command, single_line(stderr))
      }
    }
  }
}

/// Package enumeration and metadata errors
#[derive(Debug, Clone)]
pub enum CatalogError {
  /// The tool backing the catalog is not installed
  ToolMissing { tool: String },

  /// The catalog tool exited unsuccessfully
  CommandFailed { command: String, stderr: String },

  /// The catalog knows nothing about this import path
  UnknownPackage { import_path: String },

  /// The catalog reported an error for this package
  Package { import_path: String, message: String },

  /// Package metadata could not be parsed
  Malformed { import_path: String, reason: String },

  /// Dependency manifest could not be loaded
  Manifest { path: PathBuf, reason: String },
}

impl CatalogError {
  fn help_message(&self) -> Option<String> {
    match self {
      CatalogError::ToolMissing { tool } => Some(format!(
        "Install '{}' or use --catalog manifest with a dependency manifest.",
        tool
      )),
      CatalogError::UnknownPackage { .. } => {
        Some("Every imported package must be declared in the dependency manifest.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for CatalogError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CatalogError::ToolMissing { tool } => write!(f, "'{}' was not found on PATH", tool),
      CatalogError::CommandFailed { command, stderr } => {
        write!(f, "Catalog command failed: {}: {}", command, single_line(stderr))
      }
      CatalogError::UnknownPackage { import_path } => write!(f, "Unknown package '{}'", import_path),
      CatalogError::Package { import_path, message } => {
        write!(f, "Package '{}' is broken: {}", import_path, single_line(message))
      }
      CatalogError::Malformed { import_path, reason } => {
        write!(f, "Malformed metadata for '{}': {}", import_path, single_line(reason))
      }
      CatalogError::Manifest { path, reason } => {
        write!(f, "Failed to load manifest {}: {}", path.display(), single_line(reason))
      }
    }
  }
}

/// An import that could not be resolved while building the closure of `root`.
///
/// Import cycles never produce this error.
#[derive(Debug, Clone)]
pub struct ResolutionError {
  /// Candidate whose closure was being built
  pub root: String,
  /// Import that failed
  pub import_path: String,
  /// Package that imports `import_path` (None when the root itself failed)
  pub importer: Option<String>,
  /// Underlying catalog failure
  pub cause: CatalogError,
}

impl fmt::Display for ResolutionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.importer {
      Some(importer) => write!(
        f,
        "Cannot resolve '{}' (imported by '{}') while resolving '{}': {}",
        self.import_path, importer, self.root, self.cause
      ),
      None => write!(f, "Cannot resolve '{}': {}", self.import_path, self.cause),
    }
  }
}

/// Collapse multi-line tool output so every diagnostic stays on one line
fn single_line(text: &str) -> String {
  text
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .collect::<Vec<_>>()
    .join("; ")
}

/// Result type alias for tainted
pub type TaintResult<T> = Result<T, TaintError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> TaintResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<TaintError>,
{
  fn context(self, ctx: impl Into<String>) -> TaintResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }
}

/// Print an error to stderr as a single diagnostic line
pub fn print_error(error: &TaintError) {
  match error.help_message() {
    Some(help) => eprintln!("error: {} (help: {})", error, help),
    None => eprintln!("error: {}", error),
  }
}
