//! In-memory doubles shared by the unit tests of this crate.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use shared::{
    domain::{NewScene, Production, Scene, SceneId, Step},
    error::ErrorCode,
    protocol::ReorderAck,
};
use tokio::sync::Semaphore;

use crate::{
    notify::{Notification, NotificationKind, NotificationSink},
    repository::{ReorderRequest, RepositoryError, SceneRepository},
};

pub fn scene(id: &str, step: Step) -> Scene {
    Scene {
        id: SceneId::from(id),
        title: format!("Scene {id}"),
        description: "Opening shot".into(),
        episode: "E01".into(),
        record_location: "Stage 4".into(),
        record_date: None,
        step,
    }
}

pub fn draft(title: &str) -> NewScene {
    NewScene {
        title: title.into(),
        description: "Night exterior".into(),
        episode: "E02".into(),
        record_location: "Backlot".into(),
        ..NewScene::default()
    }
}

#[derive(Default)]
struct Behaviour {
    failure: Option<(u16, Option<ErrorCode>)>,
    gate: Option<Arc<Semaphore>>,
}

/// Scripted [`SceneRepository`] holding its own copy of the board.
#[derive(Default)]
pub struct FakeRepository {
    scenes: Mutex<Vec<Scene>>,
    productions: Mutex<Vec<Production>>,
    behaviour: Mutex<Behaviour>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl FakeRepository {
    pub fn with_scenes(scenes: Vec<Scene>) -> Arc<Self> {
        let repo = Self::default();
        *repo.scenes.lock().unwrap() = scenes;
        Arc::new(repo)
    }

    pub fn set_productions(&self, productions: Vec<Production>) {
        *self.productions.lock().unwrap() = productions;
    }

    /// Every following call fails with this status until [`Self::recover`].
    pub fn fail_with(&self, status: u16, code: Option<ErrorCode>) {
        self.behaviour.lock().unwrap().failure = Some((status, code));
    }

    pub fn recover(&self) {
        self.behaviour.lock().unwrap().failure = None;
    }

    /// Holds every following call until the returned semaphore gets permits.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.behaviour.lock().unwrap().gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remote_scenes(&self) -> Vec<Scene> {
        self.scenes.lock().unwrap().clone()
    }

    async fn enter(&self, call: String) -> Result<(), RepositoryError> {
        self.calls.lock().unwrap().push(call);
        let gate = self.behaviour.lock().unwrap().gate.clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.behaviour.lock().unwrap().failure {
            Some((status, code)) => Err(RepositoryError::Status {
                status,
                code,
                message: format!("scripted failure {status}"),
            }),
            None => Ok(()),
        }
    }

    fn not_found(id: &SceneId) -> RepositoryError {
        RepositoryError::Status {
            status: 404,
            code: Some(ErrorCode::NotFound),
            message: format!("scene {id} not found"),
        }
    }
}

#[async_trait]
impl SceneRepository for FakeRepository {
    async fn fetch_scenes(&self) -> Result<Vec<Scene>, RepositoryError> {
        self.enter("fetch_scenes".into()).await?;
        Ok(self.remote_scenes())
    }

    async fn fetch_productions(&self) -> Result<Vec<Production>, RepositoryError> {
        self.enter("fetch_productions".into()).await?;
        Ok(self.productions.lock().unwrap().clone())
    }

    async fn move_scene(&self, id: &SceneId, to_step: Step) -> Result<Scene, RepositoryError> {
        self.enter(format!("move {id} {}", to_step.number())).await?;
        let mut scenes = self.scenes.lock().unwrap();
        let scene = scenes
            .iter_mut()
            .find(|scene| &scene.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        scene.step = to_step;
        Ok(scene.clone())
    }

    async fn reorder_scene(&self, request: &ReorderRequest) -> Result<ReorderAck, RepositoryError> {
        self.enter(format!("reorder {} {}", request.id, request.to_index))
            .await?;
        Ok(ReorderAck {
            id: request.id.clone(),
            step: request.to_step,
        })
    }

    async fn update_scene(&self, scene: &Scene) -> Result<Scene, RepositoryError> {
        self.enter(format!("update {}", scene.id)).await?;
        let mut scenes = self.scenes.lock().unwrap();
        let stored = scenes
            .iter_mut()
            .find(|existing| existing.id == scene.id)
            .ok_or_else(|| Self::not_found(&scene.id))?;
        *stored = scene.clone();
        Ok(scene.clone())
    }

    async fn create_scene(&self, scene: &NewScene) -> Result<Scene, RepositoryError> {
        self.enter(format!("create {}", scene.title)).await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Scene::from_new(SceneId::from(format!("scene-{n}")), scene.clone());
        self.scenes.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

/// Records every notification instead of timing it out.
#[derive(Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<Notification>>,
    dismissed: Mutex<Vec<NotificationKind>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn messages(&self, kind: NotificationKind) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter(|notification| notification.kind == kind)
            .map(|notification| notification.message)
            .collect()
    }

    pub fn dismissed(&self) -> Vec<NotificationKind> {
        self.dismissed.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, kind: NotificationKind, message: String) {
        self.shown.lock().unwrap().push(Notification {
            kind,
            message,
            visible: true,
        });
    }

    fn dismiss(&self, kind: NotificationKind) {
        self.dismissed.lock().unwrap().push(kind);
    }
}
