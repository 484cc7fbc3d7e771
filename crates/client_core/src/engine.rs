//! Optimistic writes against the remote scene repository.
//!
//! All four write kinds run through [`OptimisticEngine::with_optimistic_mutation`]:
//! cancel any refetch, snapshot, apply locally, call the remote, then either
//! reconcile with the authoritative response or roll back from the snapshot.
//! Rollback only touches what the mutation itself changed, so a failure never
//! undoes another write that is still in flight. Nothing is refetched on settle.

use std::{future::Future, sync::Arc};

use shared::domain::{NewScene, Scene, SceneId, Step};
use shared::protocol::ReorderAck;
use tracing::{info, warn};

use crate::{
    error::{MutationError, MutationKind},
    repository::{ReorderRequest, RepositoryError, SceneRepository},
    store::{SceneAction, SceneStore, Snapshot},
};

#[derive(Clone)]
pub struct OptimisticEngine {
    store: Arc<SceneStore>,
    repository: Arc<dyn SceneRepository>,
}

impl OptimisticEngine {
    pub fn new(store: Arc<SceneStore>, repository: Arc<dyn SceneRepository>) -> Self {
        Self { store, repository }
    }

    pub fn store(&self) -> &Arc<SceneStore> {
        &self.store
    }

    pub fn repository(&self) -> &Arc<dyn SceneRepository> {
        &self.repository
    }

    /// Runs one optimistic write.
    ///
    /// `apply` is visible to readers of the store before `remote` is polled.
    /// On failure `rollback` derives the undo action from the snapshot taken
    /// before `apply`; with no other write in between the collection ends up
    /// equal to that snapshot. The error is returned without retrying.
    pub async fn with_optimistic_mutation<T, R, Fut, C, B>(
        &self,
        kind: MutationKind,
        scene_id: &SceneId,
        apply: SceneAction,
        remote: R,
        reconcile: C,
        rollback: B,
    ) -> Result<T, MutationError>
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
        C: FnOnce(&T) -> Option<SceneAction>,
        B: FnOnce(&Snapshot) -> Option<SceneAction>,
    {
        self.store.cancel_refetch().await;
        let snapshot = self.store.snapshot().await;
        let applied = self.store.dispatch(apply).await;

        match remote().await {
            Ok(value) => {
                if let Some(action) = reconcile(&value) {
                    self.store.dispatch(action).await;
                }
                info!(kind = kind.as_str(), scene_id = %scene_id, applied, "scene mutation committed");
                Ok(value)
            }
            Err(source) => {
                let restored = match rollback(&snapshot) {
                    Some(action) => self.store.dispatch(action).await,
                    None => false,
                };
                warn!(
                    kind = kind.as_str(),
                    scene_id = %scene_id,
                    restored,
                    error = %source,
                    "scene mutation failed; rolled back"
                );
                Err(MutationError {
                    kind,
                    scene_id: scene_id.clone(),
                    source,
                })
            }
        }
    }

    pub async fn move_scene(&self, id: &SceneId, to_step: Step) -> Result<Scene, MutationError> {
        let repository = Arc::clone(&self.repository);
        let remote_id = id.clone();
        let reconcile_id = id.clone();
        let rollback_id = id.clone();
        self.with_optimistic_mutation(
            MutationKind::Move,
            id,
            SceneAction::MoveScene {
                id: id.clone(),
                to_step,
            },
            move || async move { repository.move_scene(&remote_id, to_step).await },
            move |server: &Scene| {
                Some(SceneAction::ReplaceScene {
                    id: reconcile_id,
                    scene: server.clone(),
                })
            },
            move |snapshot: &Snapshot| put_back(snapshot, rollback_id),
        )
        .await
    }

    pub async fn reorder_scene(&self, request: ReorderRequest) -> Result<ReorderAck, MutationError> {
        let repository = Arc::clone(&self.repository);
        let id = request.id.clone();
        let apply = SceneAction::ReorderScene {
            id: request.id.clone(),
            to_index: request.to_index,
        };
        let rollback_id = request.id.clone();
        self.with_optimistic_mutation(
            MutationKind::Reorder,
            &id,
            apply,
            move || async move { repository.reorder_scene(&request).await },
            |_: &ReorderAck| None,
            move |snapshot: &Snapshot| {
                let step = snapshot.scene(&rollback_id)?.step;
                Some(SceneAction::RestoreStepOrder {
                    step,
                    order: snapshot.step_order(step),
                })
            },
        )
        .await
    }

    pub async fn update_scene(&self, scene: Scene) -> Result<Scene, MutationError> {
        let repository = Arc::clone(&self.repository);
        let id = scene.id.clone();
        let reconcile_id = id.clone();
        let rollback_id = id.clone();
        let outgoing = scene.clone();
        self.with_optimistic_mutation(
            MutationKind::Update,
            &id,
            SceneAction::UpdateScene(scene),
            move || async move { repository.update_scene(&outgoing).await },
            move |server: &Scene| {
                Some(SceneAction::ReplaceScene {
                    id: reconcile_id,
                    scene: server.clone(),
                })
            },
            move |snapshot: &Snapshot| put_back(snapshot, rollback_id),
        )
        .await
    }

    /// Inserts the scene under a temporary id, then swaps in the server's copy
    /// by that id, wherever it sits in the collection by then.
    pub async fn create_scene(&self, scene: NewScene) -> Result<Scene, MutationError> {
        let repository = Arc::clone(&self.repository);
        let temp_id = SceneId::temporary();
        let reconcile_id = temp_id.clone();
        let rollback_id = temp_id.clone();
        let placeholder = Scene::from_new(temp_id.clone(), scene.clone());
        self.with_optimistic_mutation(
            MutationKind::Create,
            &temp_id,
            SceneAction::InsertScene(placeholder),
            move || async move { repository.create_scene(&scene).await },
            move |created: &Scene| {
                Some(SceneAction::ReplaceScene {
                    id: reconcile_id,
                    scene: created.clone(),
                })
            },
            move |_: &Snapshot| Some(SceneAction::RemoveScene(rollback_id)),
        )
        .await
    }
}

/// Swaps the snapshot's copy of `id` back in.
fn put_back(snapshot: &Snapshot, id: SceneId) -> Option<SceneAction> {
    let scene = snapshot.scene(&id)?.clone();
    Some(SceneAction::ReplaceScene { id, scene })
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
