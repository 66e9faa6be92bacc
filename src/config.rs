//! Application configuration management.
//!
//! Configuration is layered with `figment`, lowest priority first:
//!
//! 1. Built-in defaults (the two standard ad-reporting groups, `~/Downloads`)
//! 2. TOML file (`--config PATH` or the platform config directory)
//! 3. Environment variables prefixed `REPORT_MERGER_` (`__` separates nesting)
//! 4. Command-line overrides
//!
//! ```toml
//! work_dir = "~/Downloads"
//! use_trash = false
//!
//! [[groups]]
//! prefix = "AdManager Reporting"
//! output = "raw.csv"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "REPORT_MERGER_";

/// Work directory used when none is configured.
pub const DEFAULT_WORK_DIR: &str = "~/Downloads";

/// A named set of input files and the merged output they produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Filename prefix shared by every export of this report.
    pub prefix: String,
    /// Name of the merged output file, relative to the work directory.
    pub output: String,
}

impl Group {
    /// Create a group.
    #[must_use]
    pub fn new(prefix: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            output: output.into(),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be parsed or extracted.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),

    /// The group list is empty.
    #[error("no groups configured")]
    NoGroups,

    /// A group has an empty prefix.
    #[error("group #{0} has an empty prefix")]
    EmptyPrefix(usize),

    /// A group has an empty output name.
    #[error("group '{0}' has an empty output name")]
    EmptyOutput(String),

    /// Two groups share a prefix, or one prefix starts with another.
    #[error("group prefixes overlap: '{0}' and '{1}'")]
    OverlappingPrefix(String, String),

    /// Two groups write the same output file.
    #[error("output '{0}' is used by more than one group")]
    DuplicateOutput(String),

    /// An output name would be discovered as an input of some group.
    #[error("output '{output}' starts with group prefix '{prefix}'")]
    OutputMatchesPrefix { output: String, prefix: String },

    /// The home directory could not be determined for `~` expansion.
    #[error("unable to determine user home directory")]
    NoHomeDir,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Groups to merge, processed in this order.
    pub groups: Vec<Group>,
    /// Directory holding the exports (`~/` is expanded).
    pub work_dir: String,
    /// Move merged sources to the trash instead of deleting them.
    pub use_trash: bool,
    /// Leave merged sources in place.
    pub keep_sources: bool,
    /// Process groups concurrently.
    pub parallel: bool,
    /// Worker threads for parallel mode (0 = one per CPU).
    pub jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groups: vec![
                Group::new("AdManager Reporting", "raw.csv"),
                Group::new("Revenue per AdUnit", "raw-revenue.csv"),
            ],
            work_dir: DEFAULT_WORK_DIR.to_string(),
            use_trash: false,
            keep_sources: false,
            parallel: false,
            jobs: 0,
        }
    }
}

/// Values supplied on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_trash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_sources: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Config {
    /// Load configuration from all layers and validate it.
    ///
    /// `path` selects the TOML file; when `None` the platform default is
    /// used if it exists.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer fails to parse or the merged
    /// configuration is invalid.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) if !p.is_file() => return Err(ConfigError::MissingFile(p.to_path_buf())),
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(ref file) = file {
            log::debug!("Loading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        let figment = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform-specific default configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "report-merger", "report-merger")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check the group list for problems that would make groups collide.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }

        let mut outputs = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix(i + 1));
            }
            if group.output.is_empty() {
                return Err(ConfigError::EmptyOutput(group.prefix.clone()));
            }
            if !outputs.insert(group.output.as_str()) {
                return Err(ConfigError::DuplicateOutput(group.output.clone()));
            }
        }

        for (i, a) in self.groups.iter().enumerate() {
            for b in &self.groups[i + 1..] {
                if a.prefix.starts_with(&b.prefix) || b.prefix.starts_with(&a.prefix) {
                    return Err(ConfigError::OverlappingPrefix(
                        a.prefix.clone(),
                        b.prefix.clone(),
                    ));
                }
            }
        }

        for group in &self.groups {
            let output_name = Path::new(&group.output)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| group.output.clone());
            if let Some(owner) = self
                .groups
                .iter()
                .find(|g| output_name.starts_with(&g.prefix))
            {
                return Err(ConfigError::OutputMatchesPrefix {
                    output: group.output.clone(),
                    prefix: owner.prefix.clone(),
                });
            }
        }

        Ok(())
    }

    /// Work directory with `~` expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if the path starts with `~` and
    /// the home directory is unknown.
    pub fn resolved_work_dir(&self) -> Result<PathBuf, ConfigError> {
        expand_home(&self.work_dir)
    }
}

/// Expand a leading `~` or `~/` to the user's home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if expansion is needed and the home
/// directory cannot be determined.
pub fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    let rest = if path == "~" {
        None
    } else if let Some(rest) = path.strip_prefix("~/") {
        Some(rest)
    } else {
        return Ok(PathBuf::from(path));
    };

    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)?;
    Ok(match rest {
        Some(rest) => home.join(rest),
        None => home,
    })
}
