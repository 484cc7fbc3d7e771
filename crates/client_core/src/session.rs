//! One operator session over the scene board.
//!
//! [`StudioSession`] owns the store for its lifetime and wires the engine and
//! the drag controller to the same store, repository and notification sink.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use shared::{
    domain::{NewScene, Production, ProductionId, Scene, SceneId, ScenePatch, Step},
    policy::TransitionPolicy,
    validation::{validate_new_scene, validate_scene},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    drag::{DragController, DragItem, DragSnapshot},
    engine::OptimisticEngine,
    error::{friendly_message, SessionError},
    notify::{Notification, NotificationKind, NotificationSink},
    repository::SceneRepository,
    store::{SceneAction, SceneState, SceneStore},
};

#[derive(Default)]
struct ProductionState {
    productions: Vec<Production>,
    selected: Option<ProductionId>,
}

/// Everything a front end needs to render one frame.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub state: SceneState,
    pub drag: DragSnapshot,
    pub notifications: Vec<Notification>,
    pub selected_production: Option<Production>,
}

pub struct StudioSession {
    store: Arc<SceneStore>,
    repository: Arc<dyn SceneRepository>,
    engine: OptimisticEngine,
    drag: Arc<DragController>,
    notifications: Arc<dyn NotificationSink>,
    productions: RwLock<ProductionState>,
}

impl StudioSession {
    pub fn new(
        repository: Arc<dyn SceneRepository>,
        policy: Arc<dyn TransitionPolicy>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        let store = SceneStore::new();
        let engine = OptimisticEngine::new(Arc::clone(&store), Arc::clone(&repository));
        let drag = DragController::new(engine.clone(), policy, Arc::clone(&notifications));
        Arc::new(Self {
            store,
            repository,
            engine,
            drag,
            notifications,
            productions: RwLock::new(ProductionState::default()),
        })
    }

    pub fn store(&self) -> &Arc<SceneStore> {
        &self.store
    }

    pub fn engine(&self) -> &OptimisticEngine {
        &self.engine
    }

    pub fn drag(&self) -> &Arc<DragController> {
        &self.drag
    }

    /// Refetches the whole board. A refetch overtaken by an optimistic write
    /// is dropped and the current collection is returned instead.
    pub async fn load(&self) -> Result<Vec<Scene>, SessionError> {
        let ticket = self.store.begin_refetch().await;
        self.store.dispatch(SceneAction::SetLoading(true)).await;

        let result = self.repository.fetch_scenes().await;
        let outcome = match result {
            Ok(scenes) => {
                let count = scenes.len();
                if self.store.complete_refetch(ticket, scenes).await {
                    info!(count, "scene board loaded");
                } else {
                    debug!("scene refetch superseded by a local write");
                }
                Ok(self.store.scenes().await)
            }
            Err(err) => {
                warn!(error = %err, "scene board load failed");
                if self.store.abandon_refetch(ticket).await {
                    self.store
                        .dispatch(SceneAction::SetError(Some(
                            friendly_message(&err).to_string(),
                        )))
                        .await;
                }
                Err(err.into())
            }
        };
        self.store.dispatch(SceneAction::SetLoading(false)).await;
        outcome
    }

    pub async fn load_productions(&self) -> Result<Vec<Production>, SessionError> {
        let productions = self.repository.fetch_productions().await.map_err(|err| {
            warn!(error = %err, "production list load failed");
            SessionError::from(err)
        })?;
        let mut guard = self.productions.write().await;
        if let Some(selected) = &guard.selected {
            if !productions.iter().any(|production| &production.id == selected) {
                debug!(production_id = %selected, "selected production no longer listed");
                guard.selected = None;
            }
        }
        guard.productions = productions.clone();
        Ok(productions)
    }

    /// Loads scenes and productions concurrently.
    pub async fn load_board(&self) -> Result<(Vec<Scene>, Vec<Production>), SessionError> {
        futures::try_join!(self.load(), self.load_productions())
    }

    pub async fn productions(&self) -> Vec<Production> {
        self.productions.read().await.productions.clone()
    }

    pub async fn select_production(&self, id: &ProductionId) -> Result<Production, SessionError> {
        let production = {
            let mut guard = self.productions.write().await;
            let production = guard
                .productions
                .iter()
                .find(|production| &production.id == id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownProduction(id.clone()))?;
            guard.selected = Some(production.id.clone());
            production
        };
        self.store.dispatch(SceneAction::SetError(None)).await;
        Ok(production)
    }

    pub async fn deselect_production(&self) {
        self.productions.write().await.selected = None;
    }

    pub async fn selected_production(&self) -> Option<Production> {
        let guard = self.productions.read().await;
        let selected = guard.selected.as_ref()?;
        guard
            .productions
            .iter()
            .find(|production| &production.id == selected)
            .cloned()
    }

    pub async fn create_scene(&self, draft: NewScene) -> Result<Scene, SessionError> {
        validate_new_scene(&draft, today()).map_err(SessionError::Invalid)?;
        match self.engine.create_scene(draft).await {
            Ok(scene) => {
                self.notifications.notify(
                    NotificationKind::Success,
                    format!("Scene \"{}\" created.", scene.title),
                );
                Ok(scene)
            }
            Err(err) => {
                self.notifications
                    .notify(NotificationKind::Error, err.friendly_message().to_string());
                Err(err.into())
            }
        }
    }

    /// Merges `patch` into the current copy of the scene and saves it.
    pub async fn edit_scene(&self, id: &SceneId, patch: ScenePatch) -> Result<Scene, SessionError> {
        let current = self
            .store
            .scene(id)
            .await
            .ok_or_else(|| SessionError::UnknownScene(id.clone()))?;
        if patch.is_empty() {
            return Ok(current);
        }
        self.update_scene(patch.apply_to(&current)).await
    }

    pub async fn update_scene(&self, scene: Scene) -> Result<Scene, SessionError> {
        let current = self
            .store
            .scene(&scene.id)
            .await
            .ok_or_else(|| SessionError::UnknownScene(scene.id.clone()))?;

        // An unchanged date that has since passed is still accepted.
        let reference = match current.record_date {
            Some(date) if scene.record_date == Some(date) => today().min(date),
            _ => today(),
        };
        validate_scene(&scene, reference).map_err(SessionError::Invalid)?;

        match self.engine.update_scene(scene).await {
            Ok(saved) => {
                self.notifications.notify(
                    NotificationKind::Success,
                    format!("Scene \"{}\" updated.", saved.title),
                );
                Ok(saved)
            }
            Err(err) => {
                self.notifications
                    .notify(NotificationKind::Error, err.friendly_message().to_string());
                Err(err.into())
            }
        }
    }

    /// Board columns in workflow order, each in board order.
    pub async fn scenes_by_step(&self) -> Vec<(Step, Vec<Scene>)> {
        let state = self.store.state().await;
        Step::ALL
            .into_iter()
            .map(|step| {
                let column = state.scenes_in_step(step).into_iter().cloned().collect();
                (step, column)
            })
            .collect()
    }

    pub async fn drag_item(&self, id: &SceneId) -> Option<DragItem> {
        self.store.scene(id).await.map(|scene| DragItem::from_scene(&scene))
    }

    pub async fn view(&self) -> SessionView {
        SessionView {
            state: self.store.state().await,
            drag: self.drag.snapshot().await,
            notifications: self.notifications.active(),
            selected_production: self.selected_production().await,
        }
    }

    pub async fn clear_errors(&self) {
        self.store.dispatch(SceneAction::SetError(None)).await;
        self.notifications.dismiss(NotificationKind::Error);
    }

    /// Ends the session: drops the board, any pending transition and the
    /// production selection.
    pub async fn reset(&self) {
        self.drag.on_cancel_transition().await;
        self.store.reset().await;
        *self.productions.write().await = ProductionState::default();
        for kind in [
            NotificationKind::Error,
            NotificationKind::Success,
            NotificationKind::Info,
        ] {
            self.notifications.dismiss(kind);
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
