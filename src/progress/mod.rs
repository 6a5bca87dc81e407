//! Ordered progress event publication.
//!
//! One bounded channel per task; the engine is the only writer for a task,
//! so events arrive at the subscriber in emission order. Emission never
//! blocks the state machine: a full or disconnected channel drops that event
//! for that subscriber (fire-and-forget) and the task proceeds regardless.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::{ProgressEvent, TaskStage};

pub struct ProgressEmitter {
    capacity: usize,
    channels: Mutex<HashMap<Uuid, mpsc::Sender<ProgressEvent>>>,
}

impl ProgressEmitter {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Open the subscriber side for a task. A second subscription replaces
    /// the first; events already queued on the old channel are lost.
    pub fn subscribe(&self, task_id: Uuid) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.channels.lock().insert(task_id, tx);
        rx
    }

    /// Publish one event. Non-blocking: without a subscriber, or with a full
    /// channel, the event is dropped and the task is unaffected.
    pub fn emit(&self, task_id: Uuid, stage: TaskStage, percent: u8, message: impl Into<String>) {
        let event = ProgressEvent {
            task_id,
            stage,
            percent,
            message: message.into(),
        };

        let mut channels = self.channels.lock();
        let Some(tx) = channels.get(&task_id) else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::debug!(%task_id, stage = %event.stage, "subscriber slow, dropping progress event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                channels.remove(&task_id);
            }
        }
    }

    /// Tear down a task's channel once it reaches a terminal stage.
    pub fn unsubscribe(&self, task_id: Uuid) {
        self.channels.lock().remove(&task_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.channels.lock().len()
    }
}
