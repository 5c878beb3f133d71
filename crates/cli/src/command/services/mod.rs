mod check;
mod find;
mod index;
mod navigate;

use crate::command::context::CommandContext;
use crate::command::domain::{CommandOutcome, CommandRequest};
use anyhow::Result;

#[derive(Default)]
pub struct Services {
    index: index::IndexService,
    navigate: navigate::NavigateService,
    check: check::CheckService,
    find: find::FindService,
}

impl Services {
    pub async fn route(
        &self,
        request: CommandRequest,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome> {
        match request {
            CommandRequest::Index { include_paths } => self.index.run(include_paths, ctx).await,
            CommandRequest::Complete(payload) => self.navigate.complete(payload, ctx).await,
            CommandRequest::Hover(payload) => self.navigate.hover(payload, ctx).await,
            CommandRequest::Definition(payload) => self.navigate.definition(payload, ctx).await,
            CommandRequest::Check { files } => self.check.run(&files, ctx).await,
            CommandRequest::Find { query, limit } => self.find.run(&query, limit, ctx).await,
        }
    }
}
