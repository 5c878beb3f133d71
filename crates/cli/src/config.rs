use anyhow::{Context, Result};
use datapath_indexer::IndexOptions;
use datapath_search::NavigatorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "datapath.toml";

/// Contents of `datapath.toml`.
///
/// ```toml
/// data_files = ["data/*.json", "constants.json"]
///
/// [index]
/// max_scan_lines = 5000
/// duplicate_policy = "last_wins"
///
/// [navigator]
/// preview_max_chars = 200
/// namespaces = ["CONST", "ENV", "EVENT", "CONFIG", "PAGE"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Paths or glob patterns, relative to the config file.
    pub data_files: Vec<String>,
    pub index: IndexOptions,
    pub navigator: NavigatorConfig,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: CliConfig,
    /// `None` when running on defaults.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Load `explicit` (relative to `cwd`), or `datapath.toml` from `cwd` when it exists.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => cwd.join(path),
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} in {}", cwd.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: CliConfig = toml::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());

        Ok(Self {
            config,
            path: Some(path),
        })
    }

    /// Configured data files expanded against the config directory, followed by `extra`.
    ///
    /// Duplicates keep their first position so document order, and with it duplicate-path
    /// precedence, stays predictable.
    pub fn data_paths(&self, cwd: &Path, extra: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let base = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);

        let mut paths = Vec::new();
        for pattern in &self.config.data_files {
            let joined = base.join(pattern);
            let joined = joined.to_string_lossy();
            let mut matched = 0usize;
            for entry in glob::glob(&joined).with_context(|| format!("bad pattern {pattern}"))? {
                let path = entry.with_context(|| format!("failed to expand {pattern}"))?;
                if path.is_file() {
                    matched += 1;
                    paths.push(path);
                }
            }
            if matched == 0 {
                log::warn!("data_files pattern {pattern} matched no files");
            }
        }
        paths.extend(extra.iter().map(|path| cwd.join(path)));

        let mut seen = std::collections::HashSet::new();
        paths.retain(|path| seen.insert(path.clone()));
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapath_indexer::DuplicatePolicy;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_partial_config() {
        let config: CliConfig = toml::from_str(
            r#"
            data_files = ["data/*.json"]

            [index]
            duplicate_policy = "first_wins"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_files, vec!["data/*.json"]);
        assert_eq!(config.index.duplicate_policy, DuplicatePolicy::FirstWins);
        assert_eq!(config.index.max_scan_lines, 5_000);
        assert_eq!(config.navigator, NavigatorConfig::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<CliConfig>("data = []").is_err());
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = LoadedConfig::load(None, dir.path()).unwrap();
        assert!(loaded.path.is_none());
        assert_eq!(loaded.config, CliConfig::default());
        assert!(LoadedConfig::load(Some(&dir.path().join("nope.toml")), dir.path()).is_err());
    }

    #[test]
    fn expands_globs_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("site/data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("b.json"), "{}").unwrap();
        std::fs::write(data.join("a.json"), "{}").unwrap();
        std::fs::write(
            dir.path().join("site/datapath.toml"),
            "data_files = [\"data/*.json\", \"data/a.json\"]",
        )
        .unwrap();

        let loaded = LoadedConfig::load(Some(Path::new("site/datapath.toml")), dir.path()).unwrap();
        let paths = loaded
            .data_paths(dir.path(), &[PathBuf::from("extra.json")])
            .unwrap();
        assert_eq!(
            paths,
            vec![
                data.join("a.json"),
                data.join("b.json"),
                dir.path().join("extra.json"),
            ]
        );
    }
}
