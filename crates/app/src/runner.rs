//! Macro runner — one sequential evaluation task per macro instance.
//!
//! The runner owns the macro logic, its bus subscription, and the last
//! applied output. Inbound control values, clock ticks, and management
//! requests are serialized through one `select` loop, so cycle `N + 1`
//! never starts before cycle `N` finished dispatching. Dispatch is
//! idempotent: an output equal to the previous applied one is not resent.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use macrohub_domain::control::ControlValue;
use macrohub_domain::error::{MacroHubError, NotFoundError};
use macrohub_domain::id::MacroId;
use macrohub_domain::macros::{MacroLogic, MacroOutput};
use macrohub_domain::time::{now, Timestamp};

use crate::event_bus::Subscription;
use crate::ports::{DeviceAdapter, MacroStore};

enum RunnerMessage {
    ApplyPublicState(Value, oneshot::Sender<bool>),
    PublicState(oneshot::Sender<Value>),
    Destroy(oneshot::Sender<()>),
}

/// Handle to a running macro instance.
///
/// All methods go through the runner's mailbox, keeping evaluation strictly
/// sequential. A handle whose runner is gone reports the macro as not found.
#[derive(Clone)]
pub struct MacroHandle {
    id: MacroId,
    sender: mpsc::Sender<RunnerMessage>,
}

impl MacroHandle {
    #[must_use]
    pub fn id(&self) -> MacroId {
        self.id
    }

    fn gone(&self) -> MacroHubError {
        NotFoundError {
            entity: "macro",
            id: self.id.to_string(),
        }
        .into()
    }

    /// Apply a user-initiated public-state change and run a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::NotFound`] when the runner has been
    /// destroyed.
    pub async fn apply_public_state(&self, update: Value) -> Result<bool, MacroHubError> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(RunnerMessage::ApplyPublicState(update, reply))
            .await
            .map_err(|_| self.gone())?;
        answer.await.map_err(|_| self.gone())
    }

    /// Read the public projection of the macro state.
    ///
    /// # Errors
    ///
    /// Returns [`MacroHubError::NotFound`] when the runner has been
    /// destroyed.
    pub async fn public_state(&self) -> Result<Value, MacroHubError> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(RunnerMessage::PublicState(reply))
            .await
            .map_err(|_| self.gone())?;
        answer.await.map_err(|_| self.gone())
    }

    /// Stop the runner and release its bus subscription. Destroying an
    /// already-destroyed macro is a no-op.
    pub async fn destroy(&self) {
        let (reply, answer) = oneshot::channel();
        if self
            .sender
            .send(RunnerMessage::Destroy(reply))
            .await
            .is_ok()
        {
            let _ = answer.await;
        }
    }
}

/// The evaluation loop for one macro instance.
pub struct MacroRunner<L: MacroLogic, A, S> {
    id: MacroId,
    logic: L,
    adapter: A,
    store: S,
    subscription: Subscription,
    last_output: Option<<L as MacroLogic>::Output>,
    dirty: bool,
}

impl<L, A, S> MacroRunner<L, A, S>
where
    L: MacroLogic,
    A: DeviceAdapter + 'static,
    S: MacroStore + 'static,
{
    pub fn new(id: MacroId, logic: L, adapter: A, store: S, subscription: Subscription) -> Self {
        Self {
            id,
            logic,
            adapter,
            store,
            subscription,
            last_output: None,
            dirty: false,
        }
    }

    /// Spawn the evaluation task and return its handle.
    #[must_use]
    pub fn spawn(self, tick: std::time::Duration) -> MacroHandle
    where
        L: Sync,
        L::Output: Sync,
    {
        let id = self.id;
        let (sender, receiver) = mpsc::channel(16);
        tokio::spawn(self.run(receiver, tick));
        MacroHandle { id, sender }
    }

    async fn run(mut self, mut messages: mpsc::Receiver<RunnerMessage>, tick: std::time::Duration) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Bus values are drained before management requests, so a
                // handle request observes every value published before it.
                biased;
                value = self.subscription.recv() => {
                    let Some(value) = value else { break };
                    self.note_feedback(&value);
                    if self.logic.apply_input(&value) {
                        self.dirty = true;
                    }
                    self.cycle(now()).await;
                }
                _ = interval.tick() => {
                    self.cycle(now()).await;
                }
                message = messages.recv() => {
                    match message {
                        Some(RunnerMessage::ApplyPublicState(update, reply)) => {
                            let accepted = self.logic.apply_public_state(&update, now());
                            if accepted {
                                self.dirty = true;
                                self.cycle(now()).await;
                            }
                            let _ = reply.send(accepted);
                        }
                        Some(RunnerMessage::PublicState(reply)) => {
                            let _ = reply.send(self.logic.public_state());
                        }
                        Some(RunnerMessage::Destroy(reply)) => {
                            self.subscription.release();
                            let _ = reply.send(());
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        self.subscription.release();
    }

    /// Device feedback contradicting the last applied output means the
    /// device is no longer where the dispatcher left it; forget that output
    /// so an identical later decision is sent again. Feedback confirming a
    /// command (the usual echo after a dispatch) keeps it.
    fn note_feedback(&mut self, value: &ControlValue) {
        let contradicted = self.last_output.as_ref().is_some_and(|last| {
            last.commands().iter().any(|command| {
                command.device_id == value.device_id
                    && command.control_id == value.control_id
                    && command.payload != value.payload
            })
        });
        if contradicted {
            self.last_output = None;
        }
    }

    /// One evaluation cycle: compute the next output, dispatch it when it
    /// differs from the previous applied one, persist when anything changed.
    async fn cycle(&mut self, now: Timestamp) {
        if let Some(output) = self.logic.compute_output(now) {
            if self.last_output.as_ref() != Some(&output) {
                for command in output.commands() {
                    if let Err(err) = self.adapter.dispatch(command).await {
                        tracing::warn!(%err, macro_id = %self.id, "command dispatch failed");
                    }
                }
                self.last_output = Some(output);
                self.dirty = true;
            }
        }
        if self.dirty {
            self.persist().await;
            self.dirty = false;
        }
    }

    async fn persist(&self) {
        match self.logic.state_snapshot() {
            Ok(snapshot) => {
                if let Err(err) = self.store.save_state(self.id, snapshot).await {
                    tracing::warn!(%err, macro_id = %self.id, "failed to persist state snapshot");
                }
            }
            Err(err) => {
                tracing::warn!(%err, macro_id = %self.id, "failed to serialize state snapshot");
            }
        }
    }
}
