use crate::command::context::CommandContext;
use crate::command::domain::{CheckFinding, CheckOutput, CommandOutcome, HintKind};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Exit code when at least one directive does not resolve.
const UNRESOLVED_EXIT_CODE: u8 = 1;

#[derive(Default)]
pub struct CheckService;

impl CheckService {
    pub async fn run(&self, files: &[PathBuf], ctx: &CommandContext) -> Result<CommandOutcome> {
        let mut outcome = CommandOutcome::from_value(())?;
        let published = ctx.load_index(&mut outcome).await?;
        let navigator = ctx.navigator();

        let mut directives = 0;
        let mut unresolved = Vec::new();
        for file in files {
            let path = ctx.resolve(file);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            let display = ctx.display_path(&path);

            directives += navigator.parser().extract_all(&text).len();
            for missing in navigator.check(&published.index, &text) {
                log::debug!("{display}:{}: unresolved {}", missing.span.line + 1, missing.path);
                unresolved.push(CheckFinding {
                    file: display.clone(),
                    path: missing.path,
                    namespace_prefix: missing.namespace_prefix,
                    line: missing.span.line,
                    start_column: missing.span.start_column,
                    end_column: missing.span.end_column,
                });
            }
        }

        if !unresolved.is_empty() {
            outcome.exit_code = UNRESOLVED_EXIT_CODE;
            outcome.hint(
                HintKind::Warn,
                format!(
                    "{} of {directives} directives reference paths missing from the index",
                    unresolved.len()
                ),
            );
        }

        outcome.data = serde_json::to_value(CheckOutput {
            files: files.len(),
            directives,
            unresolved,
        })?;
        Ok(outcome)
    }
}
