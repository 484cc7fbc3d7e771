use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(SceneId);
id_newtype!(ProductionId);

const TEMP_ID_PREFIX: &str = "temp-";

impl SceneId {
    /// Client-side placeholder used while a create is in flight.
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("step {0} is outside the production workflow (1..=5)")]
pub struct InvalidStep(pub u8);

/// One of the five ordered stages of the production workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Step {
    Scripted = 1,
    PreProduction = 2,
    Recording = 3,
    PostProduction = 4,
    Finished = 5,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Scripted,
        Step::PreProduction,
        Step::Recording,
        Step::PostProduction,
        Step::Finished,
    ];
    pub const FIRST: Step = Step::Scripted;
    pub const LAST: Step = Step::Finished;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Scripted => "Scripted",
            Step::PreProduction => "In pre-production",
            Step::Recording => "Recording",
            Step::PostProduction => "In post-production",
            Step::Finished => "Finished",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    /// Grouping key of the board column holding scenes at this step.
    pub fn column_id(self) -> String {
        format!("column-{}", self.number())
    }
}

impl TryFrom<u8> for Step {
    type Error = InvalidStep;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or(InvalidStep(value))
    }
}

impl From<Step> for u8 {
    fn from(value: Step) -> Self {
        value.number()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub id: ProductionId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A scene tracked through the production workflow.
///
/// The column grouping key is derived from `step`; see [`Scene::column_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "crate::protocol::SceneRecord", into = "crate::protocol::SceneRecord")]
pub struct Scene {
    pub id: SceneId,
    pub title: String,
    pub description: String,
    pub episode: String,
    pub record_location: String,
    pub record_date: Option<NaiveDate>,
    pub step: Step,
}

impl Scene {
    pub fn from_new(id: SceneId, new: NewScene) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            episode: new.episode,
            record_location: new.record_location,
            record_date: new.record_date,
            step: new.step,
        }
    }

    pub fn column_id(&self) -> String {
        self.step.column_id()
    }

    pub fn without_id(&self) -> NewScene {
        NewScene {
            title: self.title.clone(),
            description: self.description.clone(),
            episode: self.episode.clone(),
            record_location: self.record_location.clone(),
            record_date: self.record_date,
            step: self.step,
        }
    }
}

/// Scene payload before the system of record assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScene {
    pub title: String,
    pub description: String,
    pub episode: String,
    pub record_location: String,
    #[serde(default, with = "crate::protocol::optional_date")]
    pub record_date: Option<NaiveDate>,
    pub step: Step,
}

impl Default for NewScene {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            episode: String::new(),
            record_location: String::new(),
            record_date: None,
            step: Step::FIRST,
        }
    }
}

/// Field edits for an existing scene. `None` leaves the field untouched;
/// `record_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub episode: Option<String>,
    pub record_location: Option<String>,
    pub record_date: Option<Option<NaiveDate>>,
}

impl ScenePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, scene: &Scene) -> Scene {
        let mut edited = scene.clone();
        if let Some(title) = &self.title {
            edited.title = title.clone();
        }
        if let Some(description) = &self.description {
            edited.description = description.clone();
        }
        if let Some(episode) = &self.episode {
            edited.episode = episode.clone();
        }
        if let Some(location) = &self.record_location {
            edited.record_location = location.clone();
        }
        if let Some(date) = self.record_date {
            edited.record_date = date;
        }
        edited
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
