mod context;
pub mod domain;
mod services;

pub use context::CommandContext;
pub use domain::{CommandRequest, CommandResponse, CommandStatus, CursorPayload, DEFAULT_LIMIT};

use anyhow::Result;
use services::Services;

pub struct CommandHandler {
    services: Services,
    ctx: CommandContext,
}

impl CommandHandler {
    pub fn new(ctx: CommandContext) -> Self {
        Self {
            services: Services::default(),
            ctx,
        }
    }

    pub async fn execute(&self, request: CommandRequest) -> Result<CommandResponse> {
        let action = request.action();
        let mut outcome = self.services.route(request, &self.ctx).await?;

        #[allow(clippy::cast_possible_truncation)]
        {
            outcome.meta.duration_ms = Some(outcome.started.elapsed().as_millis() as u64);
        }

        Ok(CommandResponse {
            status: CommandStatus::Ok,
            action: Some(action),
            message: None,
            hints: outcome.hints,
            data: outcome.data,
            meta: outcome.meta,
            exit_code: outcome.exit_code,
        })
    }
}
