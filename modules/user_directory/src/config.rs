use serde::{Deserialize, Serialize};

/// Configuration for the user_directory module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UserDirectoryConfig {
    #[serde(default = "default_list_limit")]
    pub default_list_limit: u64,
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: u64,
    /// Photo content directory; relative paths resolve under `server.home_dir`.
    #[serde(default = "default_photo_dir")]
    pub photo_dir: String,
    /// Upper bound for one directory call made on behalf of a request.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Role id seeded as `ADMIN` at startup when absent.
    #[serde(default)]
    pub bootstrap_admin_role_id: Option<String>,
}

impl Default for UserDirectoryConfig {
    fn default() -> Self {
        Self {
            default_list_limit: default_list_limit(),
            max_list_limit: default_max_list_limit(),
            photo_dir: default_photo_dir(),
            call_timeout_ms: default_call_timeout_ms(),
            bootstrap_admin_role_id: None,
        }
    }
}

impl UserDirectoryConfig {
    /// Reject settings the services cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_list_limit == 0 {
            anyhow::bail!("default_list_limit must be positive");
        }
        if self.max_list_limit < self.default_list_limit {
            anyhow::bail!(
                "max_list_limit ({}) is below default_list_limit ({})",
                self.max_list_limit,
                self.default_list_limit
            );
        }
        if self.photo_dir.trim().is_empty() {
            anyhow::bail!("photo_dir must not be empty");
        }
        if self.call_timeout_ms == 0 {
            anyhow::bail!("call_timeout_ms must be positive");
        }
        Ok(())
    }
}

fn default_list_limit() -> u64 {
    10
}

fn default_max_list_limit() -> u64 {
    1000
}

fn default_photo_dir() -> String {
    "photos".to_string()
}

fn default_call_timeout_ms() -> u64 {
    5000
}
