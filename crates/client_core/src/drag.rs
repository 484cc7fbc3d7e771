//! Drag interaction lifecycle: start, drop, and the confirmation gate in
//! front of cross-step moves.
//!
//! Reorders within a step commit straight away. A cross-step drop is checked
//! against the [`TransitionPolicy`]; a legal one is parked as a
//! [`PendingTransition`] until the operator confirms or cancels it. The
//! pending transition has its own lifecycle: starting another drag leaves it
//! in place.

use std::sync::Arc;

use shared::{
    domain::{Scene, SceneId, Step},
    policy::{TransitionPolicy, TransitionResult},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    engine::OptimisticEngine,
    error::MutationError,
    notify::{NotificationKind, NotificationSink},
    repository::ReorderRequest,
};

const UNTITLED_SCENE: &str = "Untitled scene";
const CONFIRMATION_BUSY: &str = "Another move is being confirmed; wait for it to finish.";

/// The scene being dragged, as captured when the gesture starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragItem {
    pub scene_id: SceneId,
    pub step: Step,
    pub title: String,
}

impl DragItem {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            scene_id: scene.id.clone(),
            step: scene.step,
            title: scene.title.clone(),
        }
    }
}

/// Whatever the pointer was released over: another scene card or a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub id: String,
    pub step: Step,
}

impl DropTarget {
    pub fn scene(scene: &Scene) -> Self {
        Self {
            id: scene.id.to_string(),
            step: scene.step,
        }
    }

    pub fn column(step: Step) -> Self {
        Self {
            id: step.column_id(),
            step,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragStartEvent {
    pub active: DragItem,
}

#[derive(Debug, Clone)]
pub struct DragEndEvent {
    pub active: DragItem,
    pub over: Option<DropTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub scene_id: SceneId,
    pub from_step: Step,
    pub to_step: Step,
    pub scene_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    AwaitingConfirmation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped nowhere, onto itself, or onto its current position.
    Ignored,
    Reordered {
        scene_id: SceneId,
        from_index: usize,
        to_index: usize,
    },
    /// The reorder was rolled back; the message was shown to the operator.
    ReorderFailed {
        scene_id: SceneId,
        message: String,
    },
    Rejected(TransitionResult),
    PendingConfirmation(PendingTransition),
    /// A confirmation is in flight, so no new transition was parked.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    NothingPending,
    AlreadyConfirming,
    Moved(Scene),
    /// The operator cancelled while the write was in flight; the server's
    /// result was still reconciled into the store.
    LandedAfterCancel(Scene),
}

/// Observable controller state for the rendering layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSnapshot {
    pub active: Option<DragItem>,
    pub pending: Option<PendingTransition>,
    pub is_confirming: bool,
    pub last_error: Option<String>,
}

impl DragSnapshot {
    pub fn phase(&self) -> DragPhase {
        if self.active.is_some() {
            DragPhase::Dragging
        } else if self.pending.is_some() {
            DragPhase::AwaitingConfirmation
        } else {
            DragPhase::Idle
        }
    }
}

#[derive(Default)]
struct ControllerState {
    active: Option<DragItem>,
    pending: Option<PendingTransition>,
    is_confirming: bool,
    last_error: Option<String>,
    confirm_generation: u64,
}

pub struct DragController {
    engine: OptimisticEngine,
    policy: Arc<dyn TransitionPolicy>,
    notifications: Arc<dyn NotificationSink>,
    inner: Mutex<ControllerState>,
}

impl DragController {
    pub fn new(
        engine: OptimisticEngine,
        policy: Arc<dyn TransitionPolicy>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            policy,
            notifications,
            inner: Mutex::new(ControllerState::default()),
        })
    }

    pub async fn snapshot(&self) -> DragSnapshot {
        let guard = self.inner.lock().await;
        DragSnapshot {
            active: guard.active.clone(),
            pending: guard.pending.clone(),
            is_confirming: guard.is_confirming,
            last_error: guard.last_error.clone(),
        }
    }

    pub async fn pending_transition(&self) -> Option<PendingTransition> {
        self.inner.lock().await.pending.clone()
    }

    pub async fn on_drag_start(&self, event: DragStartEvent) {
        self.notifications.dismiss(NotificationKind::Error);
        debug!(scene_id = %event.active.scene_id, step = event.active.step.number(), "drag started");
        self.inner.lock().await.active = Some(event.active);
    }

    pub async fn on_drag_end(&self, event: DragEndEvent) -> DropOutcome {
        self.inner.lock().await.active = None;

        let DragEndEvent { active, over } = event;
        let Some(over) = over else {
            return DropOutcome::Ignored;
        };
        if over.id == active.scene_id.as_str() {
            return DropOutcome::Ignored;
        }

        if active.step == over.step {
            return self.reorder_within_step(active, over).await;
        }

        let from_step = active.step;
        let to_step = over.step;
        let result = self.policy.validate(from_step, to_step);
        if !result.is_valid {
            info!(
                scene_id = %active.scene_id,
                from_step = from_step.number(),
                to_step = to_step.number(),
                reason = %result.message,
                "transition rejected"
            );
            self.notifications
                .notify(NotificationKind::Error, result.message.clone());
            return DropOutcome::Rejected(result);
        }

        let title = if active.title.trim().is_empty() {
            UNTITLED_SCENE.to_string()
        } else {
            active.title
        };
        let pending = PendingTransition {
            scene_id: active.scene_id,
            from_step,
            to_step,
            scene_title: title,
        };

        let mut guard = self.inner.lock().await;
        if guard.is_confirming {
            drop(guard);
            self.notifications
                .notify(NotificationKind::Info, CONFIRMATION_BUSY.to_string());
            return DropOutcome::Busy;
        }
        if let Some(replaced) = guard.pending.replace(pending.clone()) {
            debug!(scene_id = %replaced.scene_id, "replaced unconfirmed transition");
        }
        guard.last_error = None;
        DropOutcome::PendingConfirmation(pending)
    }

    async fn reorder_within_step(&self, active: DragItem, over: DropTarget) -> DropOutcome {
        let step = active.step;
        let column = self.engine.store().scenes_in_step(step).await;
        let from_index = column.iter().position(|scene| scene.id == active.scene_id);
        let to_index = column.iter().position(|scene| scene.id.as_str() == over.id);
        let (Some(from_index), Some(to_index)) = (from_index, to_index) else {
            return DropOutcome::Ignored;
        };
        if from_index == to_index {
            return DropOutcome::Ignored;
        }

        let request = ReorderRequest {
            id: active.scene_id.clone(),
            to_step: step,
            to_index,
            from_step: Some(step),
            from_index: Some(from_index),
        };
        match self.engine.reorder_scene(request).await {
            Ok(_) => {
                self.notifications.notify(
                    NotificationKind::Success,
                    format!("Scene \"{}\" reordered.", active.title),
                );
                DropOutcome::Reordered {
                    scene_id: active.scene_id,
                    from_index,
                    to_index,
                }
            }
            Err(err) => {
                let message = err.friendly_message().to_string();
                self.notifications
                    .notify(NotificationKind::Error, message.clone());
                DropOutcome::ReorderFailed {
                    scene_id: active.scene_id,
                    message,
                }
            }
        }
    }

    /// Commits the pending transition. On failure the transition stays
    /// pending so the operator can retry or cancel.
    pub async fn on_confirm_transition(&self) -> Result<ConfirmOutcome, MutationError> {
        let (pending, generation) = {
            let mut guard = self.inner.lock().await;
            let Some(pending) = guard.pending.clone() else {
                return Ok(ConfirmOutcome::NothingPending);
            };
            if guard.is_confirming {
                return Ok(ConfirmOutcome::AlreadyConfirming);
            }
            guard.is_confirming = true;
            guard.last_error = None;
            guard.confirm_generation += 1;
            (pending, guard.confirm_generation)
        };

        let result = self
            .engine
            .move_scene(&pending.scene_id, pending.to_step)
            .await;

        let mut guard = self.inner.lock().await;
        let still_current = guard.confirm_generation == generation;
        if still_current {
            guard.is_confirming = false;
        }

        match result {
            Ok(scene) if still_current => {
                guard.pending = None;
                drop(guard);
                self.notifications.notify(
                    NotificationKind::Success,
                    format!(
                        "Scene \"{}\" moved to \"{}\".",
                        pending.scene_title,
                        pending.to_step.label()
                    ),
                );
                Ok(ConfirmOutcome::Moved(scene))
            }
            Ok(scene) => {
                info!(scene_id = %scene.id, "move confirmed after cancellation; keeping server result");
                Ok(ConfirmOutcome::LandedAfterCancel(scene))
            }
            Err(err) => {
                warn!(
                    scene_id = %pending.scene_id,
                    error = %err,
                    still_current,
                    "confirmed move failed"
                );
                if still_current {
                    let message = err.friendly_message().to_string();
                    guard.last_error = Some(message.clone());
                    drop(guard);
                    self.notifications.notify(NotificationKind::Error, message);
                }
                Err(err)
            }
        }
    }

    /// Clears the pending transition whether or not a confirmation is running.
    /// An in-flight request is not aborted.
    pub async fn on_cancel_transition(&self) -> Option<PendingTransition> {
        let mut guard = self.inner.lock().await;
        guard.confirm_generation += 1;
        guard.is_confirming = false;
        guard.last_error = None;
        guard.pending.take()
    }
}

#[cfg(test)]
#[path = "tests/drag_tests.rs"]
mod tests;
