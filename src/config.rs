use anyhow::{Context, Result};
use commit_graph::{BranchPolicy, RefFilter};
use gitcycle_query::{Pattern, DEFAULT_MAX_DECISIONS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-repository config file
pub const CONFIG_FILE: &str = ".gitcycle.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refs: RefsConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefsConfig {
    /// `exclude_tags`, `exclude_remote_head` and `exclude`
    #[serde(flatten)]
    pub filter: RefFilter,
    #[serde(default)]
    pub max_commits: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    #[serde(default)]
    pub policy: BranchPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_patterns")]
    pub patterns: Vec<Pattern>,
    #[serde(default = "default_max_decisions")]
    pub max_decisions: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            max_decisions: default_max_decisions(),
        }
    }
}

fn default_patterns() -> Vec<Pattern> {
    vec![Pattern::MaintenanceCycle]
}

fn default_max_decisions() -> u64 {
    DEFAULT_MAX_DECISIONS
}

/// Load `explicit` if given, else `<repo>/.gitcycle.toml` if it exists,
/// else defaults. An explicit path that does not exist is an error.
pub fn load(repo: &Path, explicit: Option<&Path>) -> Result<Config> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = repo.join(CONFIG_FILE);
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
