//! SQLite DSN helpers.

use std::io;
use std::path::{Path, PathBuf};

/// True for DSNs that open a private in-memory database.
pub fn is_memory_dsn(dsn: &str) -> bool {
    let d = dsn.trim().to_ascii_lowercase();
    d == "sqlite::memory:"
        || d == "sqlite://:memory:"
        || d == "sqlite://memory:"
        || d.contains("mode=memory")
}

/// Path component of a file DSN, without scheme and query.
fn file_path_of(dsn: &str) -> Option<PathBuf> {
    if is_memory_dsn(dsn) {
        return None;
    }
    let rest = dsn
        .trim()
        .strip_prefix("sqlite://")
        .or_else(|| dsn.trim().strip_prefix("sqlite:"))?;
    let path = rest.split_once('?').map_or(rest, |(p, _)| p);
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Create the parent directory of a file DSN if it does not exist yet.
pub(crate) fn ensure_parent_dir(dsn: &str) -> io::Result<()> {
    if let Some(parent) = file_path_of(dsn).as_deref().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Rewrite a SQLite DSN so relative paths are resolved against `base_dir`.
/// - In-memory DSNs collapse to `sqlite::memory:`.
/// - Backslashes are normalized to forward slashes.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> io::Result<String> {
    if is_memory_dsn(dsn) {
        return Ok("sqlite::memory:".to_string());
    }
    let rest = dsn
        .trim()
        .strip_prefix("sqlite://")
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("DSN must start with sqlite:// (got: {dsn})"),
            )
        })?;

    let (path_str, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Empty SQLite path in DSN",
        ));
    }

    let mut p = PathBuf::from(path_str);
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}
