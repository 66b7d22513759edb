// packages/engine/src/runtime/registry.rs
//! Registry of actor mailboxes owned by the coordinator
//!
//! The coordinator is the only holder of the sending half of every task and
//! instruction channel, so it alone decides when they close.
//!
//! ```text
//! ActorRegistry
//! ├─ 1 → ActorHandle { instructions, tasks }
//! ├─ 2 → ActorHandle { instructions, tasks }
//! └─ …
//! ```

use crate::runtime::messages::{ActorConfig, Instruction, Task};
use crate::runtime::process_actor::ActorMailbox;
use crate::utils::errors::{EngineError, Result};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half of one actor's mailboxes
pub struct ActorHandle {
    pub config: ActorConfig,
    pub instructions: mpsc::Sender<Instruction>,
    pub tasks: mpsc::Sender<Task>,
}

/// Actor id → mailbox handles, in registration order
pub struct ActorRegistry {
    handles: Vec<ActorHandle>,
    index: BTreeMap<u32, usize>,
    capacity: usize,
}

impl ActorRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            handles: Vec::new(),
            index: BTreeMap::new(),
            capacity,
        }
    }

    /// Create the mailboxes for `config`, keeping the senders and returning the receivers
    pub fn register(&mut self, config: ActorConfig) -> Result<ActorMailbox> {
        if self.index.contains_key(&config.id) {
            return Err(EngineError::InvalidRequest(format!(
                "duplicate actor id {}",
                config.id
            )));
        }

        let (instructions_tx, instructions_rx) = mpsc::channel(self.capacity);
        let (tasks_tx, tasks_rx) = mpsc::channel(self.capacity);

        debug!(actor_id = config.id, "Registering actor");
        self.index.insert(config.id, self.handles.len());
        self.handles.push(ActorHandle {
            config,
            instructions: instructions_tx,
            tasks: tasks_tx,
        });

        Ok(ActorMailbox {
            instructions: instructions_rx,
            tasks: tasks_rx,
        })
    }

    pub fn get(&self, actor_id: u32) -> Option<&ActorHandle> {
        self.index.get(&actor_id).map(|&i| &self.handles[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorHandle> {
        self.handles.iter()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.handles.iter().map(|h| h.config.id).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Enqueue a stop instruction for every actor
    ///
    /// Returns the ids of actors whose mailbox was already gone.
    pub async fn stop_all(&self) -> Vec<u32> {
        let mut gone = Vec::new();

        for handle in &self.handles {
            let id = handle.config.id;
            if handle.instructions.send(Instruction::stop(id)).await.is_err() {
                warn!(actor_id = id, "Actor exited before stop instruction");
                gone.push(id);
            }
        }

        gone
    }

    /// Close every instruction and task channel by dropping the senders
    pub fn close_all(self) {
        debug!(actors = self.handles.len(), "Closing actor mailboxes");
        drop(self.handles);
    }
}
