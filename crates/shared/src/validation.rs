use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{NewScene, Scene};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const DESCRIPTION_REQUIRED: &str = "Description is required";
pub const EPISODE_REQUIRED: &str = "Episode is required";
pub const LOCATION_REQUIRED: &str = "Recording location is required";
pub const DATE_IN_PAST: &str = "The recording date must be today or a future date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SceneField {
    Title,
    Description,
    Episode,
    RecordLocation,
    RecordDate,
}

impl SceneField {
    pub fn name(self) -> &'static str {
        match self {
            SceneField::Title => "title",
            SceneField::Description => "description",
            SceneField::Episode => "episode",
            SceneField::RecordLocation => "recordLocation",
            SceneField::RecordDate => "recordDate",
        }
    }
}

/// Per-field messages for a scene draft that cannot be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<SceneField, &'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: SceneField) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SceneField, &'static str)> + '_ {
        self.fields.iter().map(|(field, message)| (*field, *message))
    }

    fn insert(&mut self, field: SceneField, message: &'static str) {
        self.fields.insert(field, message);
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {message}", field.name()))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// A missing date is allowed; a present one must not be before `today`.
pub fn record_date_error(date: Option<NaiveDate>, today: NaiveDate) -> Option<&'static str> {
    match date {
        Some(date) if date < today => Some(DATE_IN_PAST),
        _ => None,
    }
}

pub fn validate_new_scene(scene: &NewScene, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    require(&mut errors, SceneField::Title, &scene.title, TITLE_REQUIRED);
    require(
        &mut errors,
        SceneField::Description,
        &scene.description,
        DESCRIPTION_REQUIRED,
    );
    require(&mut errors, SceneField::Episode, &scene.episode, EPISODE_REQUIRED);
    require(
        &mut errors,
        SceneField::RecordLocation,
        &scene.record_location,
        LOCATION_REQUIRED,
    );
    if let Some(message) = record_date_error(scene.record_date, today) {
        errors.insert(SceneField::RecordDate, message);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_scene(scene: &Scene, today: NaiveDate) -> Result<(), ValidationErrors> {
    validate_new_scene(&scene.without_id(), today)
}

fn require(
    errors: &mut ValidationErrors,
    field: SceneField,
    value: &str,
    message: &'static str,
) {
    if value.trim().is_empty() {
        errors.insert(field, message);
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
