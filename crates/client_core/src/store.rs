//! Canonical in-process scene collection.
//!
//! Every write goes through [`reduce`], a pure transition function over
//! [`SceneState`]. [`SceneStore`] is the single choke point that applies those
//! transitions for the rest of the session, so concurrent tasks never mutate
//! the collection outside of it.

use std::sync::Arc;

use shared::domain::{Scene, SceneId, Step};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneState {
    pub scenes: Vec<Scene>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SceneState {
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| &scene.id == id)
    }

    /// Scenes at `step`, in board order.
    pub fn scenes_in_step(&self, step: Step) -> Vec<&Scene> {
        self.scenes.iter().filter(|scene| scene.step == step).collect()
    }

    pub fn index_in_step(&self, id: &SceneId) -> Option<usize> {
        let step = self.scene(id)?.step;
        self.scenes
            .iter()
            .filter(|scene| scene.step == step)
            .position(|scene| &scene.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneAction {
    /// Replaces the whole collection after a refetch and clears the error.
    SetScenes(Vec<Scene>),
    MoveScene {
        id: SceneId,
        to_step: Step,
    },
    UpdateScene(Scene),
    SetLoading(bool),
    SetError(Option<String>),
    /// Moves a scene to `to_index` within its own step's ordered subset.
    ReorderScene {
        id: SceneId,
        to_index: usize,
    },
    InsertScene(Scene),
    /// Swaps the entry matching `id` for `scene` wholesale.
    ReplaceScene {
        id: SceneId,
        scene: Scene,
    },
    RemoveScene(SceneId),
    /// Rearranges the scenes at `step` to follow `order`. Scenes missing from
    /// `order` keep their relative order after the listed ones; other steps
    /// are untouched.
    RestoreStepOrder {
        step: Step,
        order: Vec<SceneId>,
    },
}

impl SceneAction {
    fn name(&self) -> &'static str {
        match self {
            SceneAction::SetScenes(_) => "set_scenes",
            SceneAction::MoveScene { .. } => "move_scene",
            SceneAction::UpdateScene(_) => "update_scene",
            SceneAction::SetLoading(_) => "set_loading",
            SceneAction::SetError(_) => "set_error",
            SceneAction::ReorderScene { .. } => "reorder_scene",
            SceneAction::InsertScene(_) => "insert_scene",
            SceneAction::ReplaceScene { .. } => "replace_scene",
            SceneAction::RemoveScene(_) => "remove_scene",
            SceneAction::RestoreStepOrder { .. } => "restore_step_order",
        }
    }
}

/// Applies `action` to `state` and reports whether anything changed.
///
/// Actions that reference a missing scene, or that would not alter any field,
/// leave `state` untouched and return `false`.
pub fn reduce(state: &mut SceneState, action: SceneAction) -> bool {
    match action {
        SceneAction::SetScenes(scenes) => {
            let changed = state.scenes != scenes || state.error.is_some();
            state.scenes = scenes;
            state.error = None;
            changed
        }
        SceneAction::MoveScene { id, to_step } => {
            match state.scenes.iter_mut().find(|scene| scene.id == id) {
                Some(scene) if scene.step != to_step => {
                    scene.step = to_step;
                    true
                }
                _ => false,
            }
        }
        SceneAction::UpdateScene(updated) => {
            match state.scenes.iter_mut().find(|scene| scene.id == updated.id) {
                Some(scene) if *scene != updated => {
                    *scene = updated;
                    true
                }
                _ => false,
            }
        }
        SceneAction::SetLoading(loading) => replace_if_changed(&mut state.loading, loading),
        SceneAction::SetError(error) => replace_if_changed(&mut state.error, error),
        SceneAction::ReorderScene { id, to_index } => reorder_within_step(state, &id, to_index),
        SceneAction::InsertScene(scene) => {
            if state.scene(&scene.id).is_some() {
                return false;
            }
            state.scenes.push(scene);
            true
        }
        SceneAction::ReplaceScene { id, scene } => {
            match state.scenes.iter_mut().find(|existing| existing.id == id) {
                Some(existing) if *existing != scene => {
                    *existing = scene;
                    true
                }
                _ => false,
            }
        }
        SceneAction::RemoveScene(id) => {
            let before = state.scenes.len();
            state.scenes.retain(|scene| scene.id != id);
            state.scenes.len() != before
        }
        SceneAction::RestoreStepOrder { step, order } => restore_step_order(state, step, &order),
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn reorder_within_step(state: &mut SceneState, id: &SceneId, to_index: usize) -> bool {
    let Some(step) = state.scene(id).map(|scene| scene.step) else {
        return false;
    };

    let slots: Vec<usize> = state
        .scenes
        .iter()
        .enumerate()
        .filter(|(_, scene)| scene.step == step)
        .map(|(slot, _)| slot)
        .collect();
    let Some(from_index) = slots.iter().position(|&slot| &state.scenes[slot].id == id) else {
        return false;
    };
    let to_index = to_index.min(slots.len() - 1);
    if from_index == to_index {
        return false;
    }

    let mut column: Vec<Scene> = slots.iter().map(|&slot| state.scenes[slot].clone()).collect();
    let moved = column.remove(from_index);
    column.insert(to_index, moved);

    // Write the reordered column back into the same slots so scenes of other
    // steps keep their positions.
    for (slot, scene) in slots.into_iter().zip(column) {
        state.scenes[slot] = scene;
    }
    true
}

fn restore_step_order(state: &mut SceneState, step: Step, order: &[SceneId]) -> bool {
    let slots: Vec<usize> = state
        .scenes
        .iter()
        .enumerate()
        .filter(|(_, scene)| scene.step == step)
        .map(|(slot, _)| slot)
        .collect();
    let mut column: Vec<Scene> = slots.iter().map(|&slot| state.scenes[slot].clone()).collect();
    column.sort_by_key(|scene| {
        order
            .iter()
            .position(|id| id == &scene.id)
            .unwrap_or(usize::MAX)
    });

    let mut changed = false;
    for (slot, scene) in slots.into_iter().zip(column) {
        if state.scenes[slot].id != scene.id {
            state.scenes[slot] = scene;
            changed = true;
        }
    }
    changed
}

/// Immutable copy of the collection taken right before an optimistic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<Scene>);

impl Snapshot {
    pub fn scenes(&self) -> &[Scene] {
        &self.0
    }

    pub fn into_scenes(self) -> Vec<Scene> {
        self.0
    }

    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.0.iter().find(|scene| &scene.id == id)
    }

    /// Ids at `step`, in the order they had when the snapshot was taken.
    pub fn step_order(&self, step: Step) -> Vec<SceneId> {
        self.0
            .iter()
            .filter(|scene| scene.step == step)
            .map(|scene| scene.id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefetchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Changed { revision: u64 },
    Reset { revision: u64 },
}

struct StoreInner {
    state: SceneState,
    revision: u64,
    next_ticket: u64,
    active_refetch: Option<u64>,
}

pub struct SceneStore {
    inner: RwLock<StoreInner>,
    events: broadcast::Sender<StoreEvent>,
}

impl SceneStore {
    pub fn new() -> Arc<Self> {
        Self::with_scenes(Vec::new())
    }

    pub fn with_scenes(scenes: Vec<Scene>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            inner: RwLock::new(StoreInner {
                state: SceneState {
                    scenes,
                    ..SceneState::default()
                },
                revision: 0,
                next_ticket: 0,
                active_refetch: None,
            }),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn dispatch(&self, action: SceneAction) -> bool {
        let name = action.name();
        let mut guard = self.inner.write().await;
        let changed = reduce(&mut guard.state, action);
        if changed {
            guard.revision += 1;
            let revision = guard.revision;
            // No subscribers is fine; the state itself is authoritative.
            let _ = self.events.send(StoreEvent::Changed { revision });
        }
        debug!(action = name, changed, revision = guard.revision, "scene store dispatch");
        changed
    }

    pub async fn state(&self) -> SceneState {
        self.inner.read().await.state.clone()
    }

    pub async fn scenes(&self) -> Vec<Scene> {
        self.inner.read().await.state.scenes.clone()
    }

    pub async fn scene(&self, id: &SceneId) -> Option<Scene> {
        self.inner.read().await.state.scene(id).cloned()
    }

    pub async fn scenes_in_step(&self, step: Step) -> Vec<Scene> {
        self.inner
            .read()
            .await
            .state
            .scenes_in_step(step)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }

    pub async fn snapshot(&self) -> Snapshot {
        Snapshot(self.scenes().await)
    }

    /// Starts a full refetch. Only the most recent uncancelled ticket may land.
    pub async fn begin_refetch(&self) -> RefetchTicket {
        let mut guard = self.inner.write().await;
        guard.next_ticket += 1;
        let ticket = guard.next_ticket;
        guard.active_refetch = Some(ticket);
        RefetchTicket(ticket)
    }

    /// Invalidates any outstanding refetch so its result is discarded.
    pub async fn cancel_refetch(&self) -> bool {
        let cancelled = self.inner.write().await.active_refetch.take();
        if let Some(ticket) = cancelled {
            debug!(ticket, "cancelled in-flight scene refetch");
        }
        cancelled.is_some()
    }

    pub async fn is_refetching(&self) -> bool {
        self.inner.read().await.active_refetch.is_some()
    }

    /// Lands a refetch result. Returns `false` when the ticket was cancelled or
    /// superseded, in which case the result is dropped.
    pub async fn complete_refetch(&self, ticket: RefetchTicket, scenes: Vec<Scene>) -> bool {
        {
            let mut guard = self.inner.write().await;
            if guard.active_refetch != Some(ticket.0) {
                debug!(ticket = ticket.0, "discarding stale scene refetch");
                return false;
            }
            guard.active_refetch = None;
        }
        self.dispatch(SceneAction::SetScenes(scenes)).await;
        true
    }

    /// Ends a refetch that failed, returning whether it was still current.
    pub async fn abandon_refetch(&self, ticket: RefetchTicket) -> bool {
        let mut guard = self.inner.write().await;
        if guard.active_refetch == Some(ticket.0) {
            guard.active_refetch = None;
            return true;
        }
        false
    }

    /// Clears everything at a session boundary.
    pub async fn reset(&self) {
        let mut guard = self.inner.write().await;
        guard.state = SceneState::default();
        guard.active_refetch = None;
        guard.revision += 1;
        let _ = self.events.send(StoreEvent::Reset {
            revision: guard.revision,
        });
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
