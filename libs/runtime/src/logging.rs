use crate::config::{LoggingConfig, Section};
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

const DEFAULT_SECTION: &str = "default";

// -------- level helpers --------

/// Unknown strings fall back to INFO; "off"/"none" disable output.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" | "" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Returns true if target == crate_name or target starts with "crate_name::"
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target == crate_name
        || (target.starts_with(crate_name) && target[crate_name.len()..].starts_with("::"))
}

// -------- rotating file writers --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).flush()
    }
}

/// Writer chosen per record; `None` drops the bytes.
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to per-subsystem files by target prefix, falling back to the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(name, _)| matches_crate_prefix(target, name))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

/// Resolve a log file path against `base_dir` (home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Open a size-rotated log file, creating its parent directory.
fn open_rotating_writer(section: &Section, base_dir: &Path) -> std::io::Result<RotWriter> {
    let log_path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let rot = FileRotate::new(
        &log_path,
        AppendCount::new(section.max_backups.unwrap_or(3)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

// -------- filters --------

fn console_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_SECTION)
        .map_or(LevelFilter::INFO, |s| parse_level(&s.console_level));

    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default), |t, (name, s)| {
            t.with_target(name.clone(), parse_level(&s.console_level))
        })
}

/// A section without a file contributes nothing to the file sink.
fn file_level(section: &Section) -> LevelFilter {
    if section.file.trim().is_empty() {
        LevelFilter::OFF
    } else {
        parse_level(&section.file_level)
    }
}

fn file_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg.get(DEFAULT_SECTION).map_or(LevelFilter::OFF, file_level);

    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default), |t, (name, s)| {
            t.with_target(name.clone(), file_level(s))
        })
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    for (name, section) in cfg {
        if section.file.trim().is_empty() {
            continue;
        }
        match open_rotating_writer(section, base_dir) {
            Ok(w) if name == DEFAULT_SECTION => router.default = Some(w),
            Ok(w) => router.by_prefix.push((name.clone(), w)),
            Err(e) => eprintln!(
                "Failed to open log file '{}' for '{}': {}",
                resolve_log_path(&section.file, base_dir).display(),
                name,
                e
            ),
        }
    }
    router
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: subsystem sections, "default" being the catch-all
/// - `base_dir`: base directory used to resolve relative log file paths (usually server.home_dir)
///
/// Console output is human-readable; files receive JSON lines.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let ansi = atty::is(atty::Stream::Stdout);
    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets(cfg));

    let router = build_file_router(cfg, base_dir);
    let file_layer = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(file_targets(cfg))
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

// =================== tests ===================
