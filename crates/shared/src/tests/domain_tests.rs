use super::*;

fn sample_scene() -> Scene {
    Scene {
        id: SceneId::from("scene-1"),
        title: "Opening".to_string(),
        description: "Cold open on the pier".to_string(),
        episode: "E01".to_string(),
        record_location: "Pier 7".to_string(),
        record_date: NaiveDate::from_ymd_opt(2030, 5, 1),
        step: Step::PreProduction,
    }
}

#[test]
fn steps_round_trip_through_numbers() {
    for step in Step::ALL {
        assert_eq!(Step::try_from(step.number()), Ok(step));
    }
    assert_eq!(Step::try_from(0), Err(InvalidStep(0)));
    assert_eq!(Step::try_from(6), Err(InvalidStep(6)));
}

#[test]
fn step_neighbours_stop_at_domain_edges() {
    assert_eq!(Step::Scripted.previous(), None);
    assert_eq!(Step::Scripted.next(), Some(Step::PreProduction));
    assert_eq!(Step::Finished.next(), None);
    assert_eq!(Step::Finished.previous(), Some(Step::PostProduction));
}

#[test]
fn column_id_follows_step() {
    let mut scene = sample_scene();
    assert_eq!(scene.column_id(), "column-2");
    scene.step = Step::Finished;
    assert_eq!(scene.column_id(), "column-5");
}

#[test]
fn temporary_ids_are_unique_and_recognisable() {
    let a = SceneId::temporary();
    let b = SceneId::temporary();
    assert_ne!(a, b);
    assert!(a.is_temporary());
    assert!(!SceneId::from("scene-1").is_temporary());
}

#[test]
fn patch_only_touches_given_fields() {
    let scene = sample_scene();
    let patch = ScenePatch {
        title: Some("Cold open".to_string()),
        record_date: Some(None),
        ..ScenePatch::default()
    };

    let edited = patch.apply_to(&scene);
    assert_eq!(edited.title, "Cold open");
    assert_eq!(edited.record_date, None);
    assert_eq!(edited.description, scene.description);
    assert_eq!(edited.step, scene.step);
    assert_eq!(edited.id, scene.id);
}

#[test]
fn empty_patch_is_identity() {
    let scene = sample_scene();
    let patch = ScenePatch::default();
    assert!(patch.is_empty());
    assert_eq!(patch.apply_to(&scene), scene);
}

#[test]
fn from_new_keeps_every_field() {
    let scene = sample_scene();
    let rebuilt = Scene::from_new(scene.id.clone(), scene.without_id());
    assert_eq!(rebuilt, scene);
}
