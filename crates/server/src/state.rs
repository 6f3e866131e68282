use std::sync::Arc;

use anyhow::Context;
use events::EventBus;
use github::{GitHubPublisher, Publisher, PublisherConfig};
use llm::{ChatClient, CompletionModel};
use orchestrator::{
    EvaluationNotifier, NotifierConfig, PipelineConfig, SiteGenerator, TaskDispatcher,
    TaskPipeline,
};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: TaskDispatcher,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(config: AppConfig, dispatcher: TaskDispatcher) -> Self {
        let event_bus = dispatcher.pipeline().event_bus().clone();
        Self {
            config: Arc::new(config),
            dispatcher,
            event_bus,
        }
    }

    /// Wires the production collaborators: the chat-completions model and
    /// the GitHub publisher.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let model: Arc<dyn CompletionModel> = Arc::new(
            ChatClient::new(&config.llm_api_key, &config.llm_base_url, &config.llm_model)
                .context("Failed to create model client")?,
        );

        let publisher_config = PublisherConfig::new(&config.github_username)
            .with_pages_host(&config.pages_host);
        let publisher: Arc<dyn Publisher> = Arc::new(
            GitHubPublisher::new(&config.github_token, publisher_config)
                .context("Failed to create GitHub publisher")?,
        );

        Self::with_collaborators(config, model, publisher)
    }

    /// Builds the pipeline around the given model and publisher.
    pub fn with_collaborators(
        config: AppConfig,
        model: Arc<dyn CompletionModel>,
        publisher: Arc<dyn Publisher>,
    ) -> anyhow::Result<Self> {
        let generator = SiteGenerator::new(model).context("Failed to create site generator")?;
        let notifier = EvaluationNotifier::new(NotifierConfig::default())
            .context("Failed to create notifier")?;

        let pipeline = TaskPipeline::new(
            generator,
            publisher,
            notifier,
            PipelineConfig::new(&config.email),
        );

        Ok(Self::new(config, TaskDispatcher::new(Arc::new(pipeline))))
    }
}
