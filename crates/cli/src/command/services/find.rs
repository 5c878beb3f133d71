use crate::command::context::CommandContext;
use crate::command::domain::CommandOutcome;
use anyhow::Result;
use datapath_search::PathFinder;

#[derive(Default)]
pub struct FindService;

impl FindService {
    pub async fn run(
        &self,
        query: &str,
        limit: usize,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome> {
        let mut outcome = CommandOutcome::from_value(())?;
        let published = ctx.load_index(&mut outcome).await?;

        let matches = PathFinder::new().search(query, &published.index, limit);
        log::debug!("find {query:?}: {} matches", matches.len());
        outcome.data = serde_json::to_value(matches)?;
        Ok(outcome)
    }
}
