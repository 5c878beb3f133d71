use crate::command::context::CommandContext;
use crate::command::domain::{CommandOutcome, HintKind, IndexOutput, PathSummary};
use anyhow::Result;
use datapath_search::value_kind;

#[derive(Default)]
pub struct IndexService;

impl IndexService {
    pub async fn run(&self, include_paths: bool, ctx: &CommandContext) -> Result<CommandOutcome> {
        let mut outcome = CommandOutcome::from_value(())?;
        let published = ctx.load_index(&mut outcome).await?;
        let index = &published.index;

        let paths = include_paths.then(|| {
            index
                .entries()
                .map(|entry| PathSummary {
                    path: entry.path.clone(),
                    document: entry.document_id.to_string(),
                    line: entry.start_line,
                    column: entry.start_column,
                    kind: value_kind(&entry.value).as_str(),
                })
                .collect()
        });

        if !index.collisions().is_empty() {
            outcome.hint(
                HintKind::Warn,
                format!(
                    "{} paths are defined in more than one document",
                    index.collisions().len()
                ),
            );
        }

        outcome.data = serde_json::to_value(IndexOutput {
            stats: published.stats.clone(),
            documents: index.documents().iter().map(ToString::to_string).collect(),
            collisions: index.collisions().to_vec(),
            paths,
        })?;
        Ok(outcome)
    }
}
