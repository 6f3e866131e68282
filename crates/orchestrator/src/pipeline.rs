use std::sync::Arc;

use events::{Event, EventBus};
use github::Publisher;
use serde::Serialize;
use sitesmith_core::{NotificationPayload, PublishOperation, PublishResult, Task, TaskStage};
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::generator::SiteGenerator;
use crate::notifier::EvaluationNotifier;
use crate::state_machine::StageMachine;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub task_id: String,
    pub round: u32,
    /// Terminal stage reached: `Done` or `Failed`.
    pub stage: TaskStage,
    pub published: Option<PublishResult>,
    pub live: bool,
    pub notified: bool,
    pub error: Option<String>,
}

impl PipelineOutcome {
    fn new(task: &Task) -> Self {
        Self {
            task_id: task.task_id.clone(),
            round: task.round.get(),
            stage: TaskStage::Received,
            published: None,
            live: false,
            notified: false,
            error: None,
        }
    }
}

/// Current stage of a running task. Every move is checked against
/// [`StageMachine`] and announced on the bus.
struct StageTracker<'a> {
    task: &'a Task,
    current: TaskStage,
    event_bus: &'a EventBus,
}

impl<'a> StageTracker<'a> {
    fn new(task: &'a Task, event_bus: &'a EventBus) -> Self {
        Self {
            task,
            current: TaskStage::Received,
            event_bus,
        }
    }

    fn current(&self) -> TaskStage {
        self.current
    }

    fn advance(&mut self, to: TaskStage) -> Result<()> {
        StageMachine::validate_transition(self.current, to)?;

        debug!(
            task_id = %self.task.task_id,
            from = %self.current,
            to = %to,
            "Stage transition"
        );
        self.event_bus.emit(Event::StageChanged {
            task_id: self.task.task_id.clone(),
            round: self.task.round.get(),
            from: self.current.to_string(),
            to: to.to_string(),
        });
        self.current = to;
        Ok(())
    }
}

/// Runs a task end to end: generate, publish, wait for the site, notify.
pub struct TaskPipeline {
    generator: SiteGenerator,
    publisher: Arc<dyn Publisher>,
    notifier: EvaluationNotifier,
    config: PipelineConfig,
    event_bus: EventBus,
}

impl TaskPipeline {
    pub fn new(
        generator: SiteGenerator,
        publisher: Arc<dyn Publisher>,
        notifier: EvaluationNotifier,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            publisher,
            notifier,
            config,
            event_bus: EventBus::new(),
        }
    }

    /// Shares `event_bus` with the pipeline and its notifier.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.notifier = self.notifier.with_event_bus(event_bus.clone());
        self.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Never returns an error: failures end the task in `Failed` and are
    /// recorded on the outcome. A site that never comes up or an evaluator
    /// that never accepts the callback still ends in `Done`.
    pub async fn run(&self, task: Task) -> PipelineOutcome {
        info!(
            task_id = %task.task_id,
            round = task.round.get(),
            operation = task.operation().as_str(),
            "Starting task"
        );

        let mut outcome = PipelineOutcome::new(&task);
        let mut stage = StageTracker::new(&task, &self.event_bus);

        if let Err(e) = self.execute(&task, &mut stage, &mut outcome).await {
            error!(
                task_id = %task.task_id,
                round = task.round.get(),
                stage = %stage.current(),
                error = %e,
                "Task failed"
            );
            if let Err(transition_err) = stage.advance(TaskStage::Failed) {
                warn!(
                    task_id = %task.task_id,
                    error = %transition_err,
                    "Could not mark task as failed"
                );
            }
            self.event_bus.emit(Event::Error {
                message: e.to_string(),
                context: Some(task.task_id.clone()),
            });
            outcome.error = Some(e.to_string());
        }

        outcome.stage = stage.current();
        self.event_bus.emit(Event::TaskFinished {
            task_id: outcome.task_id.clone(),
            round: outcome.round,
            stage: outcome.stage.to_string(),
            live: outcome.live,
            notified: outcome.notified,
        });

        info!(
            task_id = %outcome.task_id,
            round = outcome.round,
            stage = %outcome.stage,
            live = outcome.live,
            notified = outcome.notified,
            "Task finished"
        );
        outcome
    }

    async fn execute(
        &self,
        task: &Task,
        stage: &mut StageTracker<'_>,
        outcome: &mut PipelineOutcome,
    ) -> Result<()> {
        stage.advance(TaskStage::Generating)?;
        let files = self
            .generator
            .generate(&task.brief, &task.checks, &task.attachments, &task.task_id)
            .await?;

        stage.advance(TaskStage::Publishing)?;
        let published = match task.operation() {
            PublishOperation::Create => {
                self.publisher.create_project(&task.task_id, files).await?
            }
            PublishOperation::Update => {
                self.publisher.update_project(&task.task_id, files).await?
            }
        };
        info!(
            task_id = %task.task_id,
            repo_url = %published.project_url,
            commit_sha = %published.revision_id,
            pages_url = %published.public_url,
            "Published"
        );
        outcome.published = Some(published.clone());

        stage.advance(TaskStage::AwaitingLive)?;
        outcome.live = self
            .publisher
            .wait_until_live(&published.public_url, self.config.live_timeout)
            .await;
        if !outcome.live {
            warn!(task_id = %task.task_id, "Site not live yet, notifying anyway");
        }

        stage.advance(TaskStage::Notifying)?;
        let payload = NotificationPayload::new(&self.config.email, task, &published);
        outcome.notified = self
            .notifier
            .notify(&task.evaluation_url, &payload, self.config.notify_attempts)
            .await;

        stage.advance(TaskStage::Done)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use github::{GitHubError, Publisher};
    use llm::{CompletionModel, LlmError, LlmResult};
    use sitesmith_core::{GeneratedFileSet, PublishResult};

    pub const SITE_ANSWER: &str = "### index.html\n```html\n<!doctype html><h1>Demo</h1>\n```\n\n### README.md\n```markdown\n# Demo\n```\n";

    pub struct CannedModel(pub Option<String>);

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _prompt: &str) -> LlmResult<String> {
            self.0.clone().ok_or(LlmError::EmptyCompletion)
        }
    }

    /// Records calls and publishes nothing.
    pub struct FakePublisher {
        pub creates: AtomicU32,
        pub updates: AtomicU32,
        fail: bool,
        live: bool,
        delay: Duration,
        pub published_files: Mutex<Vec<GeneratedFileSet>>,
        active: AtomicU32,
        max_active: AtomicU32,
    }

    impl FakePublisher {
        pub fn new() -> Self {
            Self {
                creates: AtomicU32::new(0),
                updates: AtomicU32::new(0),
                fail: false,
                live: true,
                delay: Duration::ZERO,
                published_files: Mutex::new(Vec::new()),
                active: AtomicU32::new(0),
                max_active: AtomicU32::new(0),
            }
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        pub fn never_live(mut self) -> Self {
            self.live = false;
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Most publish calls that were ever in flight at once.
        pub fn max_active(&self) -> u32 {
            self.max_active.load(Ordering::SeqCst)
        }

        pub fn creates(&self) -> u32 {
            self.creates.load(Ordering::SeqCst)
        }

        pub fn updates(&self) -> u32 {
            self.updates.load(Ordering::SeqCst)
        }

        async fn publish(
            &self,
            name: &str,
            files: GeneratedFileSet,
        ) -> github::Result<PublishResult> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(GitHubError::Api("repository creation refused".to_string()));
            }
            self.published_files.lock().unwrap().push(files);
            Ok(PublishResult {
                project_url: format!("https://github.com/acct/{}", name),
                revision_id: "abc123".to_string(),
                public_url: format!("https://acct.github.io/{}/", name),
            })
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn create_project(
            &self,
            name: &str,
            files: GeneratedFileSet,
        ) -> github::Result<PublishResult> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.publish(name, files).await
        }

        async fn update_project(
            &self,
            name: &str,
            files: GeneratedFileSet,
        ) -> github::Result<PublishResult> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.publish(name, files).await
        }

        async fn wait_until_live(&self, _public_url: &str, _timeout: Duration) -> bool {
            self.live
        }
    }
}
