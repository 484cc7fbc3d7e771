use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Scene, SceneId, Step};

/// Wire shape of a scene. `columnId` is emitted for readers that group by it
/// and ignored on input, where it is always rederived from `step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    pub id: SceneId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub episode: String,
    #[serde(default)]
    pub record_location: String,
    #[serde(default, with = "optional_date")]
    pub record_date: Option<NaiveDate>,
    pub step: Step,
    #[serde(default, skip_deserializing)]
    pub column_id: String,
}

impl From<SceneRecord> for Scene {
    fn from(record: SceneRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            episode: record.episode,
            record_location: record.record_location,
            record_date: record.record_date,
            step: record.step,
        }
    }
}

impl From<Scene> for SceneRecord {
    fn from(scene: Scene) -> Self {
        let column_id = scene.column_id();
        Self {
            id: scene.id,
            title: scene.title,
            description: scene.description,
            episode: scene.episode,
            record_location: scene.record_location,
            record_date: scene.record_date,
            step: scene.step,
            column_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSceneRequest {
    pub step: Step,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSceneRequest {
    #[serde(flatten)]
    pub scene: Scene,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSceneRequest {
    pub to_step: Step,
    pub to_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_step: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderAck {
    pub id: SceneId,
    pub step: Step,
}

/// `YYYY-MM-DD`, with the empty string standing for "no date".
pub mod optional_date {
    use chrono::NaiveDate;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        // Accept full timestamps as well; only the calendar date is kept.
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, FORMAT)
            .map(Some)
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
