use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// Resolve the server home directory.
///
/// - `None` (or blank) => `<user home>/<default_subdir>`
/// - a leading `~` is expanded to the user home
/// - relative paths are made absolute against the current directory
///
/// When `create` is set the directory is created if missing.
pub(crate) fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let user_home = || dirs::home_dir().ok_or_else(|| anyhow!("cannot determine user home dir"));

    let path = match configured.as_deref().map(str::trim) {
        None | Some("") => user_home()?.join(default_subdir),
        Some("~") => user_home()?,
        Some(p) if p.starts_with("~/") || p.starts_with("~\\") => user_home()?.join(&p[2..]),
        Some(p) => {
            let p = PathBuf::from(p);
            if p.is_absolute() {
                p
            } else {
                std::env::current_dir()
                    .context("cannot read current dir")?
                    .join(p)
            }
        }
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}
