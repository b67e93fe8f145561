//! `XferSite` CLI - Command-line interface for `XferSite` session profiles
//!
//! Provides commands for listing, showing, resolving, renaming and deleting
//! stored sites, generating session URLs, importing from PuTTY and FileZilla,
//! exporting, and managing workspaces and default settings.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use xfersite_core::config::{AppSettings, ConfigManager};
use xfersite_core::error::SessionError;
use xfersite_core::export::{ExportTarget, PuttyExporter};
use xfersite_core::import::{FileZillaImporter, ImportResult, ImportSource, PuttyImporter};
use xfersite_core::models::SessionData;
use xfersite_core::sessions::StoredSessionList;
use xfersite_core::url::{SessionOptions, SessionUrlFlags};

/// `XferSite` command-line interface for managing stored sites
#[derive(Parser)]
#[command(name = "xfersite")]
#[command(author, version, about = "XferSite command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List stored sites
    #[command(about = "List all stored sites")]
    List {
        /// Output format for the site list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Only sites in this folder or workspace
        #[arg(long)]
        folder: Option<String>,
    },

    /// Show site details
    #[command(about = "Show details of a stored site")]
    Show {
        /// Site name
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Resolve a session URL or site name
    #[command(about = "Resolve a session URL or stored site name")]
    Resolve {
        /// URL or site name, optionally followed by a path
        url: String,

        /// Switch to apply, as name or name=value
        #[arg(short, long = "switch")]
        switches: Vec<String>,

        /// Raw setting to apply, as name=value
        #[arg(long = "rawsettings", value_parser = parse_key_val)]
        raw_settings: Vec<(String, String)>,

        /// Store the result as a site of this name
        #[arg(long)]
        save: Option<String>,
    },

    /// Generate the session URL of a site
    #[command(about = "Generate the session URL of a stored site")]
    Url {
        /// Site name
        name: String,

        /// Include the password
        #[arg(long)]
        password: bool,

        /// Include the host key fingerprint
        #[arg(long)]
        host_key: bool,

        /// Prefix the scheme with the product marker
        #[arg(long)]
        product_prefix: bool,
    },

    /// Delete a site
    #[command(about = "Delete a stored site")]
    Delete {
        /// Site name
        name: String,
    },

    /// Rename a site within its folder
    #[command(about = "Rename a stored site")]
    Rename {
        /// Current site name
        name: String,

        /// New name, without folder
        new_name: String,
    },

    /// Import sites from another tool
    #[command(about = "Import sites from PuTTY or FileZilla")]
    Import {
        /// Import source
        #[arg(value_enum)]
        source: ImportSourceArg,

        /// Session directory or site manager file instead of the default
        path: Option<PathBuf>,

        /// Only import SSH sessions
        #[arg(long)]
        ssh_only: bool,
    },

    /// Export all sites to a profile store file
    #[command(about = "Export all sites to a TOML profile store file")]
    Export {
        /// Output file path
        file: PathBuf,
    },

    /// Export sites as PuTTY sessions
    #[command(about = "Export SSH sites as PuTTY session files")]
    ExportPutty {
        /// Output directory
        dir: PathBuf,
    },

    /// Manage workspaces
    #[command(subcommand, about = "List and inspect workspaces")]
    Workspace(WorkspaceCommands),

    /// Set the default settings from a URL
    #[command(about = "Set the default settings new sites start from")]
    SetDefault {
        /// URL describing the defaults
        url: String,
    },

    /// Re-encrypt stored passwords with the current codec
    #[command(about = "Re-encrypt all stored passwords")]
    Recrypt,

    /// Show usage statistics
    #[command(about = "Show statistics about stored sites")]
    Stats,
}

/// Workspace subcommands
#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// List workspaces
    List,

    /// Show the sites a workspace opens
    Show {
        /// Workspace name
        name: String,
    },
}

/// Output format for list and show commands
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
    /// Output as CSV
    Csv,
}

/// Import source options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ImportSourceArg {
    /// PuTTY session files
    Putty,
    /// FileZilla site manager
    Filezilla,
}

/// Parse a key=value pair
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    let cli = Cli::parse();

    let result = Context::open(cli.config.clone()).and_then(|mut ctx| {
        init_logging(cli.verbose, &ctx.settings.logging.level);
        run(cli.command, &mut ctx)
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// Installs the log subscriber; `RUST_LOG` wins over flags and settings
fn init_logging(verbose: u8, configured_level: &str) {
    let fallback = match verbose {
        0 => configured_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, ctx: &mut Context) -> Result<(), CliError> {
    match command {
        Commands::List { format, folder } => cmd_list(ctx, format, folder.as_deref()),
        Commands::Show { name, format } => cmd_show(ctx, &name, format),
        Commands::Resolve {
            url,
            switches,
            raw_settings,
            save,
        } => cmd_resolve(ctx, &url, &switches, &raw_settings, save.as_deref()),
        Commands::Url {
            name,
            password,
            host_key,
            product_prefix,
        } => cmd_url(
            ctx,
            &name,
            SessionUrlFlags {
                product_prefix,
                user_name: true,
                password,
                host_key,
            },
        ),
        Commands::Delete { name } => cmd_delete(ctx, &name),
        Commands::Rename { name, new_name } => cmd_rename(ctx, &name, &new_name),
        Commands::Import {
            source,
            path,
            ssh_only,
        } => cmd_import(ctx, source, path.as_deref(), ssh_only),
        Commands::Export { file } => cmd_export(ctx, &file),
        Commands::ExportPutty { dir } => cmd_export_putty(ctx, &dir),
        Commands::Workspace(subcmd) => cmd_workspace(ctx, subcmd),
        Commands::SetDefault { url } => cmd_set_default(ctx, &url),
        Commands::Recrypt => cmd_recrypt(ctx),
        Commands::Stats => cmd_stats(ctx),
    }
}

/// Configuration shared by all commands
struct Context {
    manager: ConfigManager,
    settings: AppSettings,
}

impl Context {
    fn open(config_dir: Option<PathBuf>) -> Result<Self, CliError> {
        let manager = match config_dir {
            Some(dir) => ConfigManager::with_config_dir(dir),
            None => ConfigManager::new()
                .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}")))?,
        };
        let settings = manager
            .load_settings()
            .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
        Ok(Self { manager, settings })
    }

    /// Loads the stored sites
    fn sessions(&mut self) -> Result<StoredSessionList, CliError> {
        let mut list = self
            .manager
            .session_list(&mut self.settings)
            .map_err(|e| CliError::Config(format!("Failed to open sites: {e}")))?;
        list.load()
            .map_err(|e| CliError::Storage(format!("Failed to load sites: {e}")))?;
        tracing::debug!(sites = list.len(), file = %self.manager.sessions_file().display(), "Loaded sites");
        Ok(list)
    }
}

// ========== Output ==========

/// Simplified site output for CLI
#[derive(Debug, Clone, serde::Serialize)]
pub struct SiteOutput {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub workspace: bool,
}

impl From<&SessionData> for SiteOutput {
    fn from(data: &SessionData) -> Self {
        Self {
            name: data.session_name(),
            host: data.host_name().to_string(),
            port: data.port_number(),
            protocol: data.fs_protocol_str().to_string(),
            user: data.user_name().to_string(),
            workspace: data.is_workspace(),
        }
    }
}

/// Full site output for `show`
#[derive(Debug, Clone, serde::Serialize)]
pub struct SiteDetails {
    #[serde(flatten)]
    pub site: SiteOutput,
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_directory: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub has_password: bool,
    pub customized: Vec<&'static str>,
}

/// Formats sites as a table
#[must_use]
pub fn format_table(sites: &[SiteOutput]) -> String {
    if sites.is_empty() {
        return "No sites found.".to_string();
    }

    let mut output = String::new();

    let name_width = sites.iter().map(|s| s.name.len()).max().unwrap_or(4).max(4);
    let host_width = sites.iter().map(|s| s.host.len()).max().unwrap_or(4).max(4);
    let port_width = 5;
    let protocol_width = sites
        .iter()
        .map(|s| s.protocol.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let _ = writeln!(
        output,
        "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<protocol_width$}  USER",
        "NAME", "HOST", "PORT", "PROTOCOL"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<host_width$}  {:-<port_width$}  {:-<protocol_width$}  ----",
        "", "", "", ""
    );

    for site in sites {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<protocol_width$}  {}",
            site.name, site.host, site.port, site.protocol, site.user
        );
    }

    output
}

/// Formats sites as JSON
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn format_json(sites: &[SiteOutput]) -> Result<String, CliError> {
    serde_json::to_string_pretty(sites)
        .map_err(|e| CliError::Config(format!("Failed to serialize: {e}")))
}

/// Formats sites as CSV
#[must_use]
pub fn format_csv(sites: &[SiteOutput]) -> String {
    let mut output = String::from("name,host,port,protocol,user\n");
    for site in sites {
        let _ = writeln!(
            output,
            "{},{},{},{},{}",
            escape_csv_field(&site.name),
            escape_csv_field(&site.host),
            site.port,
            escape_csv_field(&site.protocol),
            escape_csv_field(&site.user)
        );
    }
    output
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn print_sites(sites: &[SiteOutput], format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Table => print!("{}", format_table(sites)),
        OutputFormat::Json => println!("{}", format_json(sites)?),
        OutputFormat::Csv => print!("{}", format_csv(sites)),
    }
    Ok(())
}

fn print_session(data: &SessionData) {
    println!("Site:       {}", data.session_name());
    println!("  Host:     {}", data.host_name());
    println!("  Port:     {}", data.port_number());
    println!("  Protocol: {}", data.fs_protocol_str());
    if !data.user_name().is_empty() {
        println!("  User:     {}", data.user_name());
    }
    if !data.remote_directory().is_empty() {
        println!("  Remote:   {}", data.remote_directory());
    }
}

// ========== Commands ==========

/// List sites command handler
fn cmd_list(ctx: &mut Context, format: OutputFormat, folder: Option<&str>) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    let sites: Vec<SiteOutput> = list
        .iter()
        .filter(|data| folder.is_none_or(|folder| data.is_in_folder_or_workspace(folder)))
        .map(SiteOutput::from)
        .collect();
    print_sites(&sites, format)
}

/// Show site command handler
fn cmd_show(ctx: &mut Context, name: &str, format: OutputFormat) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    let data = find_session(&list, name)?;
    let defaults = list.new_session_data("");

    let details = SiteDetails {
        site: SiteOutput::from(data),
        url: data.generate_session_url(SessionUrlFlags {
            password: false,
            ..SessionUrlFlags::OPEN
        }),
        remote_directory: data.remote_directory().to_string(),
        note: data.note().to_string(),
        has_password: data.has_password(),
        customized: data.different_properties(&defaults, false),
    };

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&details)
                .map_err(|e| CliError::Config(format!("Failed to serialize: {e}")))?
        ),
        OutputFormat::Csv => print!("{}", format_csv(std::slice::from_ref(&details.site))),
        OutputFormat::Table => {
            print_session(data);
            println!("  URL:      {}", details.url);
            if !details.note.is_empty() {
                println!("  Note:     {}", details.note);
            }
            println!("  Password: {}", if details.has_password { "stored" } else { "none" });
            if !details.customized.is_empty() {
                println!("  Customized: {}", details.customized.join(", "));
            }
        }
    }
    Ok(())
}

/// Resolve URL command handler
fn cmd_resolve(
    ctx: &mut Context,
    url: &str,
    switches: &[String],
    raw_settings: &[(String, String)],
    save: Option<&str>,
) -> Result<(), CliError> {
    let mut options = SessionOptions::new();
    for switch in switches {
        let (name, value) = match switch.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (switch.as_str(), None),
        };
        options = options.with_switch(name, value);
    }
    for (name, value) in raw_settings {
        options = options.with_raw_setting(name, value);
    }

    let mut list = ctx.sessions()?;
    let (data, outcome) = list.parse_url(url, Some(&options), false)?;

    println!("URL:        {}", outcome.masked_url);
    print_session(&data);
    if outcome.defaults_only {
        println!("  (only a host name was given)");
    }

    if let Some(name) = save {
        if name.trim().is_empty() {
            return Err(CliError::Session("Site name cannot be empty".to_string()));
        }
        SessionData::validate_name(SessionData::extract_local_name(name))?;
        list.new_session(name, &data);
        list.save(false)
            .map_err(|e| CliError::Storage(format!("Failed to save sites: {e}")))?;
        println!("Saved site '{name}'");
    }
    Ok(())
}

/// Generate URL command handler
fn cmd_url(ctx: &mut Context, name: &str, flags: SessionUrlFlags) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    let data = find_session(&list, name)?;
    println!("{}", data.generate_session_url(flags));
    Ok(())
}

/// Delete site command handler
fn cmd_delete(ctx: &mut Context, name: &str) -> Result<(), CliError> {
    let mut list = ctx.sessions()?;
    let removed = list.remove(name)?;
    println!("Deleted site '{}'", removed.name());
    Ok(())
}

/// Rename site command handler
fn cmd_rename(ctx: &mut Context, name: &str, new_name: &str) -> Result<(), CliError> {
    let mut list = ctx.sessions()?;
    let renamed = list.rename(name, new_name)?;
    println!("Renamed site '{name}' to '{}'", renamed.name());
    Ok(())
}

/// Import command handler
fn cmd_import(
    ctx: &mut Context,
    source: ImportSourceArg,
    path: Option<&Path>,
    ssh_only: bool,
) -> Result<(), CliError> {
    let mut list = ctx.sessions()?;
    let defaults = list.default_settings().clone();
    let paths: Vec<PathBuf> = path.map(Path::to_path_buf).into_iter().collect();

    let importer: Box<dyn ImportSource> = match source {
        ImportSourceArg::Putty => Box::new(
            PuttyImporter::with_paths(paths)
                .with_defaults(defaults)
                .with_ssh_only(ssh_only),
        ),
        ImportSourceArg::Filezilla => {
            Box::new(FileZillaImporter::with_paths(paths).with_defaults(defaults))
        }
    };

    let result = importer
        .import()
        .map_err(|e| CliError::Import(format!("{} import failed: {e}", importer.display_name())))?;
    print_import_result(&result);

    let names = list.import_sessions(result.sessions)?;
    for name in &names {
        println!("  + {name}");
    }
    Ok(())
}

fn print_import_result(result: &ImportResult) {
    println!("{}", result.summary());
    for skipped in &result.skipped {
        println!("  - {}: {}", skipped.identifier, skipped.reason);
    }
    for error in &result.errors {
        eprintln!("  ! {error}");
    }
}

/// Export command handler
fn cmd_export(ctx: &mut Context, file: &Path) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    list.export(file)
        .map_err(|e| CliError::Export(format!("Failed to export to {}: {e}", file.display())))?;
    println!("Exported {} sites to {}", list.len(), file.display());
    Ok(())
}

/// PuTTY export command handler
fn cmd_export_putty(ctx: &mut Context, dir: &Path) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    let sites: Vec<SessionData> = list
        .iter()
        .filter(|data| !data.is_workspace())
        .cloned()
        .collect();
    let result = PuttyExporter::new()
        .export(&sites, dir)
        .map_err(|e| CliError::Export(e.to_string()))?;
    println!("{}", result.summary());
    for warning in &result.warnings {
        println!("  - {warning}");
    }
    Ok(())
}

/// Workspace command handler
fn cmd_workspace(ctx: &mut Context, subcmd: WorkspaceCommands) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    match subcmd {
        WorkspaceCommands::List => {
            let workspaces = list.workspaces();
            if workspaces.is_empty() {
                println!("No workspaces found.");
            }
            for name in workspaces {
                println!("{name}");
            }
        }
        WorkspaceCommands::Show { name } => {
            if !list.is_workspace(&name) && !list.is_folder(&name) {
                return Err(CliError::SiteNotFound(name));
            }
            let sites: Vec<SiteOutput> = list
                .get_folder_or_workspace(&name)
                .iter()
                .map(SiteOutput::from)
                .collect();
            print!("{}", format_table(&sites));
        }
    }
    Ok(())
}

/// Set default settings command handler
fn cmd_set_default(ctx: &mut Context, url: &str) -> Result<(), CliError> {
    let mut list = ctx.sessions()?;
    let mut data = list.default_settings().clone();
    data.parse_url(url, None, None, false)?;
    list.set_default_settings(&data)
        .map_err(|e| CliError::Storage(format!("Failed to save default settings: {e}")))?;
    println!("Default settings updated");
    Ok(())
}

/// Recrypt command handler
fn cmd_recrypt(ctx: &mut Context) -> Result<(), CliError> {
    let mut list = ctx.sessions()?;
    let failures = list.recrypt_passwords()?;
    for failure in &failures {
        eprintln!("  ! {failure}");
    }
    println!(
        "Re-encrypted passwords of {} sites, {} failed",
        list.len_including_hidden(),
        failures.len()
    );
    Ok(())
}

/// Statistics command handler
fn cmd_stats(ctx: &mut Context) -> Result<(), CliError> {
    let list = ctx.sessions()?;
    let stats = list.statistics();
    println!(
        "{}",
        serde_json::to_string_pretty(&stats)
            .map_err(|e| CliError::Config(format!("Failed to serialize: {e}")))?
    );
    Ok(())
}

fn find_session<'a>(list: &'a StoredSessionList, name: &str) -> Result<&'a SessionData, CliError> {
    list.find_by_name(name)
        .ok_or_else(|| CliError::SiteNotFound(name.to_string()))
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other errors
    pub const GENERAL_ERROR: i32 = 1;
    /// The named site does not exist
    pub const SITE_NOT_FOUND: i32 = 2;
    /// A site name or switch value was rejected
    pub const INVALID_INPUT: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Site not found
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    /// Invalid site name or switch
    #[error("{0}")]
    Session(String),

    /// Profile store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export error
    #[error("Export error: {0}")]
    Export(String),

    /// Import error
    #[error("Import error: {0}")]
    Import(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, storage, export, import, IO)
    /// - 2: Site not found
    /// - 3: Invalid site name or switch value
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SiteNotFound(_) => exit_codes::SITE_NOT_FOUND,
            Self::Session(_) => exit_codes::INVALID_INPUT,
            Self::Config(_) | Self::Storage(_) | Self::Export(_) | Self::Import(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}

impl From<SessionError> for CliError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound(name) => Self::SiteNotFound(name),
            SessionError::Storage(e) => Self::Storage(e.to_string()),
            other @ (SessionError::InvalidName { .. } | SessionError::InvalidSwitch { .. }) => {
                Self::Session(other.to_string())
            }
        }
    }
}
