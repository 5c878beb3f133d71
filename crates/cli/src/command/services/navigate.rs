use crate::command::context::CommandContext;
use crate::command::domain::{CommandOutcome, CursorPayload, HintKind};
use anyhow::{Context, Result};
use datapath_indexer::PathIndex;
use datapath_protocol::LineIndex;
use serde::Serialize;

#[derive(Default)]
pub struct NavigateService;

impl NavigateService {
    pub async fn complete(
        &self,
        payload: CursorPayload,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome> {
        self.at_cursor(payload, ctx, |index, line, column| {
            ctx.navigator().complete(index, line, column)
        })
        .await
    }

    pub async fn hover(
        &self,
        payload: CursorPayload,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome> {
        let mut outcome = self
            .at_cursor(payload, ctx, |index, line, column| {
                ctx.navigator().hover(index, line, column)
            })
            .await?;
        if outcome.data.is_null() {
            outcome.hint(HintKind::Info, "No indexed path under the cursor");
        }
        Ok(outcome)
    }

    pub async fn definition(
        &self,
        payload: CursorPayload,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome> {
        let mut outcome = self
            .at_cursor(payload, ctx, |index, line, column| {
                ctx.navigator().definition(index, line, column)
            })
            .await?;
        if outcome.data.is_null() {
            outcome.hint(HintKind::Info, "No indexed path under the cursor");
        }
        Ok(outcome)
    }

    async fn at_cursor<T, F>(
        &self,
        payload: CursorPayload,
        ctx: &CommandContext,
        query: F,
    ) -> Result<CommandOutcome>
    where
        T: Serialize,
        F: FnOnce(&PathIndex, &str, usize) -> T,
    {
        let CursorPayload { file, line, column } = payload;
        let file = ctx.resolve(&file);
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read template {}", file.display()))?;

        let mut outcome = CommandOutcome::from_value(())?;
        let published = ctx.load_index(&mut outcome).await?;

        let lines = LineIndex::new(&text);
        let Some(line_text) = lines.line_text(line) else {
            outcome.hint(
                HintKind::Warn,
                format!(
                    "Line {line} is past the end of {} ({} lines)",
                    ctx.display_path(&file),
                    lines.line_count()
                ),
            );
            outcome.data = serde_json::Value::Null;
            return Ok(outcome);
        };

        let result = query(published.index.as_ref(), line_text, column);
        outcome.data = serde_json::to_value(result)?;
        Ok(outcome)
    }
}
