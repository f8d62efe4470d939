use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use user_directory::{UserDirectoryConfig, UserDirectoryModule};
use userdir_db::{ConnectOpts, DbHandle};

mod request_id;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "user_directory";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// In-memory DSNs are returned as `sqlite::memory:`; backslashes become forward slashes.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        bail!("Empty SQLite path in DSN");
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Reject DSNs whose scheme neither backend understands before opening a pool.
fn detect_backend(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        bail!("Database URL not configured");
    }
    if raw.eq_ignore_ascii_case("sqlite::memory:") {
        return Ok("sqlite");
    }

    let url = url::Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// User directory server: role-gated user management with profile photos
#[derive(Parser)]
#[command(name = "userdir-server")]
#[command(about = "User directory server: role-gated user management with profile photos")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
    }

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("User directory server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
    }
}

async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<DbHandle> {
    let db_config = config.database.clone().unwrap_or_else(|| {
        tracing::warn!("No database configuration found, using in-memory SQLite");
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_conns: None,
            acquire_timeout_sec: None,
            busy_timeout_ms: None,
        }
    });

    let mut dsn = if args.mock {
        "sqlite::memory:".to_string()
    } else {
        detect_backend(&db_config)?;
        db_config.url.trim().to_owned()
    };
    if dsn.starts_with("sqlite://") {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.server.home_dir), true)?;
    }

    let mut opts = ConnectOpts {
        max_conns: db_config.max_conns,
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms))),
        create_sqlite_dirs: true,
        ..Default::default()
    };
    if let Some(secs) = db_config.acquire_timeout_sec {
        opts.acquire_timeout = Some(Duration::from_secs(secs));
    }

    let db = DbHandle::connect(&dsn, opts).await?;
    tracing::info!(dsn = %db.dsn(), engine = ?db.engine(), "Connected to database");
    Ok(db)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let module_cfg: UserDirectoryConfig = config.module_config(MODULE_NAME)?;
    let photo_root = config.resolve_under_home(&module_cfg.photo_dir);

    let db = connect_db(&config, &args).await?;
    let conn = db.sea();
    UserDirectoryModule::migrate(&conn).await?;
    let module = UserDirectoryModule::init(conn, module_cfg, photo_root)
        .await
        .context("Failed to initialize user_directory")?;

    let router = server::build_router(&module, server::request_timeout(config.server.timeout_sec));
    let served = server::serve(router, &config.server.host, config.server.port).await;

    db.close().await;
    tracing::info!("User directory server stopped");
    served
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(db) = &config.database {
        detect_backend(db)?;
    }
    let module_cfg: UserDirectoryConfig = config.module_config(MODULE_NAME)?;
    module_cfg.validate()?;

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_conns: None,
            acquire_timeout_sec: None,
            busy_timeout_ms: None,
        }
    }

    #[test]
    fn relative_sqlite_path_lands_under_base_dir() {
        let dsn = absolutize_sqlite_dsn("sqlite://db/users.db?mode=rwc", Path::new("/srv/app"), false)
            .unwrap();
        assert_eq!(dsn, "sqlite:///srv/app/db/users.db?mode=rwc");
    }

    #[test]
    fn absolute_and_memory_dsns_are_kept() {
        let base = Path::new("/srv/app");
        assert_eq!(
            absolutize_sqlite_dsn("sqlite:///var/users.db", base, false).unwrap(),
            "sqlite:///var/users.db"
        );
        assert_eq!(
            absolutize_sqlite_dsn("sqlite://:memory:", base, false).unwrap(),
            "sqlite::memory:"
        );
        assert!(absolutize_sqlite_dsn("sqlite://", base, false).is_err());
        assert!(absolutize_sqlite_dsn("postgres://h/db", base, false).is_err());
    }

    #[test]
    fn backend_follows_scheme() {
        assert_eq!(detect_backend(&db("sqlite://users.db")).unwrap(), "sqlite");
        assert_eq!(detect_backend(&db("sqlite::memory:")).unwrap(), "sqlite");
        assert_eq!(detect_backend(&db("postgres://u:p@h/db")).unwrap(), "postgres");
        assert!(detect_backend(&db("mysql://h/db")).is_err());
        assert!(detect_backend(&db("  ")).is_err());
    }
}
