use nq_core::{ChatResponse, Plan, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::command::CommandKind;
use crate::handlers::{self, CommandHandler, HandlerContext};

#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in handler for every command.
    pub fn with_default_handlers(ctx: HandlerContext) -> Self {
        let mut registry = Self::new();
        for kind in CommandKind::ALL {
            registry.register(kind, handlers::default_handler(kind, ctx.clone()));
        }
        registry
    }

    pub fn register(&mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) {
        if self.handlers.insert(kind, handler).is_some() {
            debug!("Replaced handler for {}", kind);
        }
    }

    /// Run the handler for `plan.command`. Unknown commands produce an answer, not an error.
    pub async fn execute(&self, plan: &Plan, query: &str) -> Result<ChatResponse> {
        let handler = plan
            .command
            .parse::<CommandKind>()
            .ok()
            .and_then(|kind| self.handlers.get(&kind));

        let Some(handler) = handler else {
            info!("🤷 Command not supported: {}", plan.command);
            return Ok(ChatResponse::text(
                plan.command.clone(),
                format!("Command not supported: {}", plan.command),
            ));
        };

        info!("⚙️ Executing {}", plan.command);
        let mut response = handler.handle(plan, query).await?;
        if response.task != plan.command {
            warn!(
                "Handler for {} answered with task {}, correcting",
                plan.command, response.task
            );
            response.task = plan.command.clone();
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nq_core::Error;
    use serde_json::json;

    struct Fixed(&'static str);

    #[async_trait]
    impl CommandHandler for Fixed {
        async fn handle(&self, _plan: &Plan, _query: &str) -> Result<ChatResponse> {
            Ok(ChatResponse::text(self.0, "fixed"))
        }
    }

    struct Broken;

    #[async_trait]
    impl CommandHandler for Broken {
        async fn handle(&self, _plan: &Plan, _query: &str) -> Result<ChatResponse> {
            Err(Error::Storage("store unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unknown_command_is_soft() {
        let registry = CommandRegistry::new();
        let plan = Plan::new("translate", json!({}));

        let response = registry.execute(&plan, "translate this").await.unwrap();
        assert_eq!(response.answer, "Command not supported: translate");
        assert_eq!(response.task, "translate");
    }

    #[tokio::test]
    async fn test_known_but_unregistered_command_is_soft() {
        let registry = CommandRegistry::new();
        let plan = Plan::new("summary", json!({"urls": ["http://a.com/"]}));

        let response = registry.execute(&plan, "summarize").await.unwrap();
        assert!(response.answer.contains("Command not supported"));
    }

    #[tokio::test]
    async fn test_task_is_forced_to_command() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandKind::Summary, Arc::new(Fixed("something_else")));

        let response = registry.execute(&Plan::new("summary", json!({})), "q").await.unwrap();
        assert_eq!(response.task, "summary");
        assert_eq!(response.answer, "fixed");
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandKind::GetTopEntities, Arc::new(Broken));

        let err = registry
            .execute(&Plan::new("get_top_entities", json!({})), "q")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
