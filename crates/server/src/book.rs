use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::domain::{NewScene, Production, ProductionId, Scene, SceneId, Step};
use tokio::sync::RwLock;

/// Initial contents of the scene book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub productions: Vec<Production>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Seed {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn demo() -> Self {
        let scene = |id: &str, title: &str, episode: &str, location: &str, step: Step| Scene {
            id: SceneId::from(id),
            title: title.into(),
            description: format!("{title} for episode {episode}"),
            episode: episode.into(),
            record_location: location.into(),
            record_date: NaiveDate::from_ymd_opt(2031, 3, 14),
            step,
        };
        Self {
            productions: vec![
                Production {
                    id: ProductionId::from("prod-harbour"),
                    name: "Harbour Lights".into(),
                    description: Some("Coastal drama, season one".into()),
                },
                Production {
                    id: ProductionId::from("prod-dry-season"),
                    name: "Dry Season".into(),
                    description: None,
                },
            ],
            scenes: vec![
                scene("scene-1", "Cold open", "E01", "Pier 7", Step::Scripted),
                scene("scene-2", "Lighthouse argument", "E01", "Stage 2", Step::Scripted),
                scene("scene-3", "Market chase", "E01", "Old town", Step::PreProduction),
                scene("scene-4", "Storm night", "E02", "Water tank", Step::Recording),
                scene("scene-5", "Funeral", "E02", "Chapel", Step::PostProduction),
                scene("scene-6", "Pilot teaser", "E00", "Pier 7", Step::Finished),
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct StoredScene {
    scene: Scene,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct BookInner {
    productions: Vec<Production>,
    scenes: Vec<StoredScene>,
}

impl BookInner {
    fn find_mut(&mut self, id: &SceneId) -> Option<&mut StoredScene> {
        self.scenes.iter_mut().find(|stored| &stored.scene.id == id)
    }
}

/// In-memory system of record. Scene list order is board order.
#[derive(Clone, Default)]
pub struct SceneBook {
    inner: Arc<RwLock<BookInner>>,
}

impl SceneBook {
    pub fn new(seed: Seed) -> Self {
        let scenes = seed
            .scenes
            .into_iter()
            .map(|scene| StoredScene {
                scene,
                updated_at: None,
            })
            .collect();
        Self {
            inner: Arc::new(RwLock::new(BookInner {
                productions: seed.productions,
                scenes,
            })),
        }
    }

    pub async fn list_productions(&self) -> Vec<Production> {
        self.inner.read().await.productions.clone()
    }

    pub async fn list_scenes(&self) -> Vec<Scene> {
        self.inner
            .read()
            .await
            .scenes
            .iter()
            .map(|stored| stored.scene.clone())
            .collect()
    }

    pub async fn scene(&self, id: &SceneId) -> Option<Scene> {
        self.inner
            .read()
            .await
            .scenes
            .iter()
            .find(|stored| &stored.scene.id == id)
            .map(|stored| stored.scene.clone())
    }

    pub async fn updated_at(&self, id: &SceneId) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .await
            .scenes
            .iter()
            .find(|stored| &stored.scene.id == id)
            .and_then(|stored| stored.updated_at)
    }

    pub async fn insert(&self, new: NewScene) -> Scene {
        let scene = Scene::from_new(
            SceneId::from(format!("scene-{}", uuid::Uuid::new_v4())),
            new,
        );
        self.inner.write().await.scenes.push(StoredScene {
            scene: scene.clone(),
            updated_at: Some(Utc::now()),
        });
        scene
    }

    pub async fn set_step(
        &self,
        id: &SceneId,
        step: Step,
        updated_at: DateTime<Utc>,
    ) -> Option<Scene> {
        let mut guard = self.inner.write().await;
        let stored = guard.find_mut(id)?;
        stored.scene.step = step;
        stored.updated_at = Some(updated_at);
        Some(stored.scene.clone())
    }

    pub async fn replace(&self, scene: Scene, updated_at: DateTime<Utc>) -> Option<Scene> {
        let mut guard = self.inner.write().await;
        let stored = guard.find_mut(&scene.id)?;
        stored.scene = scene;
        stored.updated_at = Some(updated_at);
        Some(stored.scene.clone())
    }

    /// Puts the scene at `to_step` and then at `to_index` among that step's
    /// scenes, clamped to the end. Other steps keep their relative order.
    pub async fn reorder(&self, id: &SceneId, to_step: Step, to_index: usize) -> Option<Scene> {
        let mut guard = self.inner.write().await;
        let from_slot = guard
            .scenes
            .iter()
            .position(|stored| &stored.scene.id == id)?;
        let mut moving = guard.scenes.remove(from_slot);
        moving.scene.step = to_step;
        moving.updated_at = Some(Utc::now());

        let column: Vec<usize> = guard
            .scenes
            .iter()
            .enumerate()
            .filter(|(_, stored)| stored.scene.step == to_step)
            .map(|(slot, _)| slot)
            .collect();
        let insert_at = match column.get(to_index) {
            Some(&slot) => slot,
            None => column
                .last()
                .map(|&slot| slot + 1)
                .unwrap_or_else(|| from_slot.min(guard.scenes.len())),
        };
        let scene = moving.scene.clone();
        guard.scenes.insert(insert_at, moving);
        Some(scene)
    }
}

#[cfg(test)]
#[path = "tests/book_tests.rs"]
mod tests;
