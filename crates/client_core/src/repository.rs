use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{NewScene, Production, Scene, SceneId, Step},
    error::{ApiError, ErrorCode},
    protocol::{MoveSceneRequest, ReorderAck, ReorderSceneRequest, UpdateSceneRequest},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid scene api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("scene api url cannot carry a path: {0}")]
    NotABase(String),
    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scene api returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },
    #[error("scene repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RepositoryError::Status { status, .. } => Some(*status),
            RepositoryError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RepositoryError::Transport(err) if err.is_timeout())
    }
}

/// Arguments of a reorder write. The origin is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest {
    pub id: SceneId,
    pub to_step: Step,
    pub to_index: usize,
    pub from_step: Option<Step>,
    pub from_index: Option<usize>,
}

/// Remote system of record for scenes.
#[async_trait]
pub trait SceneRepository: Send + Sync {
    async fn fetch_scenes(&self) -> Result<Vec<Scene>, RepositoryError>;
    async fn fetch_productions(&self) -> Result<Vec<Production>, RepositoryError>;
    async fn move_scene(&self, id: &SceneId, to_step: Step) -> Result<Scene, RepositoryError>;
    async fn reorder_scene(&self, request: &ReorderRequest)
        -> Result<ReorderAck, RepositoryError>;
    async fn update_scene(&self, scene: &Scene) -> Result<Scene, RepositoryError>;
    async fn create_scene(&self, scene: &NewScene) -> Result<Scene, RepositoryError>;
}

pub struct HttpSceneRepository {
    http: Client,
    base_url: Url,
}

impl HttpSceneRepository {
    pub fn new(base_url: &str) -> Result<Self, RepositoryError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RepositoryError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, RepositoryError> {
        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(RepositoryError::NotABase(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RepositoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RepositoryError::NotABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => (Some(api_error.code), api_error.message),
        Err(_) if body.trim().is_empty() => (
            None,
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        ),
        Err(_) => (None, body),
    };
    Err(RepositoryError::Status {
        status: status.as_u16(),
        code,
        message,
    })
}

#[async_trait]
impl SceneRepository for HttpSceneRepository {
    async fn fetch_scenes(&self) -> Result<Vec<Scene>, RepositoryError> {
        let res = self.http.get(self.endpoint(&["scenes"])?).send().await?;
        read_json(res).await
    }

    async fn fetch_productions(&self) -> Result<Vec<Production>, RepositoryError> {
        let res = self.http.get(self.endpoint(&["productions"])?).send().await?;
        read_json(res).await
    }

    async fn move_scene(&self, id: &SceneId, to_step: Step) -> Result<Scene, RepositoryError> {
        debug!(scene_id = %id, to_step = to_step.number(), "PATCH scene step");
        let res = self
            .http
            .patch(self.endpoint(&["scenes", id.as_str()])?)
            .json(&MoveSceneRequest {
                step: to_step,
                updated_at: Utc::now(),
            })
            .send()
            .await?;
        read_json(res).await
    }

    async fn reorder_scene(
        &self,
        request: &ReorderRequest,
    ) -> Result<ReorderAck, RepositoryError> {
        debug!(scene_id = %request.id, to_index = request.to_index, "POST scene reorder");
        let res = self
            .http
            .post(self.endpoint(&["scenes", request.id.as_str(), "reorder"])?)
            .json(&ReorderSceneRequest {
                to_step: request.to_step,
                to_index: request.to_index,
                from_step: request.from_step,
                from_index: request.from_index,
            })
            .send()
            .await?;
        read_json(res).await
    }

    async fn update_scene(&self, scene: &Scene) -> Result<Scene, RepositoryError> {
        let res = self
            .http
            .post(self.endpoint(&["scenes", scene.id.as_str()])?)
            .json(&UpdateSceneRequest {
                scene: scene.clone(),
                updated_at: Utc::now(),
            })
            .send()
            .await?;
        read_json(res).await
    }

    async fn create_scene(&self, scene: &NewScene) -> Result<Scene, RepositoryError> {
        let res = self
            .http
            .post(self.endpoint(&["scenes"])?)
            .json(scene)
            .send()
            .await?;
        read_json(res).await
    }
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
