use crate::command::domain::{CommandOutcome, HintKind};
use crate::config::LoadedConfig;
use anyhow::{Context, Result};
use datapath_indexer::{IndexPublisher, PublishedIndex, SourceDocument};
use datapath_protocol::DocumentId;
use datapath_search::Navigator;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Shared state for one command: the data files to index and the query front-end.
pub struct CommandContext {
    cwd: PathBuf,
    config_path: Option<PathBuf>,
    data_files: Vec<PathBuf>,
    publisher: IndexPublisher,
    navigator: Navigator,
}

impl CommandContext {
    pub fn new(loaded: LoadedConfig, cwd: PathBuf, data_files: Vec<PathBuf>) -> Self {
        let LoadedConfig { config, path } = loaded;
        Self {
            cwd,
            config_path: path,
            data_files,
            publisher: IndexPublisher::new(config.index),
            navigator: Navigator::new(config.navigator),
        }
    }

    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }

    /// Path relative to the working directory when possible, for display.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.cwd)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Read every data file and publish a fresh index, recording timing in `outcome`.
    pub async fn load_index(&self, outcome: &mut CommandOutcome) -> Result<PublishedIndex> {
        let started = Instant::now();
        if self.data_files.is_empty() {
            outcome.hint(
                HintKind::Warn,
                "No data files configured; pass --data or set data_files in datapath.toml",
            );
        }

        let mut documents = Vec::with_capacity(self.data_files.len());
        for path in &self.data_files {
            let mut document = SourceDocument::read(path)
                .with_context(|| format!("failed to read data file {}", path.display()))?;
            if let Ok(relative) = path.strip_prefix(&self.cwd) {
                document.id = DocumentId::from(relative);
            }
            documents.push(document);
        }

        self.publisher.rebuild(documents).await?;
        let published = self.publisher.published();

        let meta = &mut outcome.meta;
        meta.config_path = self.config_path.as_deref().map(|p| self.display_path(p));
        meta.index_generation = Some(published.generation);
        meta.index_documents = Some(published.stats.documents);
        meta.index_paths = Some(published.stats.paths);
        #[allow(clippy::cast_possible_truncation)]
        {
            meta.timing_index_ms = Some(started.elapsed().as_millis() as u64);
        }

        if published.stats.unlocated_keys > 0 {
            outcome.hint(
                HintKind::Info,
                format!(
                    "{} keys could not be located in source text and were skipped",
                    published.stats.unlocated_keys
                ),
            );
        }
        Ok(published)
    }
}
