//! Background execution of accepted tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use sitesmith_core::Task;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::pipeline::{PipelineOutcome, TaskPipeline};

/// One async lock per task id, so rounds of the same task never publish
/// concurrently. Entries are dropped once nobody holds or waits on them.
#[derive(Clone, Default)]
pub struct TaskLocks {
    locks: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TaskLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, task_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(task_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Hands back a lock obtained from [`Self::acquire`].
    pub fn release(&self, task_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // The map holds one reference and `lock` another.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(task_id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spawns pipeline runs off the request path.
#[derive(Clone)]
pub struct TaskDispatcher {
    pipeline: Arc<TaskPipeline>,
    locks: TaskLocks,
}

impl TaskDispatcher {
    pub fn new(pipeline: Arc<TaskPipeline>) -> Self {
        Self {
            pipeline,
            locks: TaskLocks::new(),
        }
    }

    pub fn pipeline(&self) -> &Arc<TaskPipeline> {
        &self.pipeline
    }

    pub fn locks(&self) -> &TaskLocks {
        &self.locks
    }

    /// Runs `task` in the background. Tasks with different ids run
    /// concurrently; tasks sharing an id run one after another.
    pub fn submit(&self, task: Task) -> JoinHandle<PipelineOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        let locks = self.locks.clone();

        tokio::spawn(async move {
            let task_id = task.task_id.clone();
            let lock = locks.acquire(&task_id);

            let outcome = {
                let _guard = lock.lock().await;
                debug!(task_id = %task_id, "Acquired task lock");
                pipeline.run(task).await
            };

            locks.release(&task_id, lock);
            outcome
        })
    }
}
