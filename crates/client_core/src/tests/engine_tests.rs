use super::*;
use crate::testing::{draft, scene, FakeRepository};
use shared::error::ErrorCode;

fn board() -> Vec<Scene> {
    vec![
        scene("a", Step::Scripted),
        scene("b", Step::Scripted),
        scene("c", Step::Recording),
    ]
}

fn engine_with(repo: &Arc<FakeRepository>) -> OptimisticEngine {
    let store = SceneStore::with_scenes(repo.remote_scenes());
    OptimisticEngine::new(store, Arc::clone(repo) as Arc<dyn SceneRepository>)
}

async fn wait_for_calls(repo: &FakeRepository, count: usize) {
    while repo.calls().len() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn move_is_visible_before_remote_answers() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let gate = repo.hold();

    let task = tokio::spawn({
        let engine = engine.clone();
        async move { engine.move_scene(&SceneId::from("a"), Step::PreProduction).await }
    });
    wait_for_calls(&repo, 1).await;

    let pending = engine.store().scene(&SceneId::from("a")).await.unwrap();
    assert_eq!(pending.step, Step::PreProduction);

    gate.add_permits(1);
    let moved = task.await.unwrap().expect("move");
    assert_eq!(moved.step, Step::PreProduction);
    assert_eq!(repo.calls(), ["move a 2"]);
}

#[tokio::test]
async fn failed_move_restores_the_snapshot_exactly() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let before = engine.store().scenes().await;
    repo.fail_with(500, Some(ErrorCode::Internal));

    let err = engine
        .move_scene(&SceneId::from("b"), Step::PreProduction)
        .await
        .expect_err("scripted failure");

    assert_eq!(err.kind, MutationKind::Move);
    assert_eq!(err.scene_id, SceneId::from("b"));
    assert_eq!(engine.store().scenes().await, before);
}

#[tokio::test]
async fn failed_reorder_is_rolled_back_too() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let before = engine.store().scenes().await;
    repo.fail_with(503, None);

    let err = engine
        .reorder_scene(ReorderRequest {
            id: SceneId::from("b"),
            to_step: Step::Scripted,
            to_index: 0,
            from_step: Some(Step::Scripted),
            from_index: Some(1),
        })
        .await
        .expect_err("scripted failure");

    assert_eq!(err.kind, MutationKind::Reorder);
    assert_eq!(engine.store().scenes().await, before);
}

#[tokio::test]
async fn successful_reorder_keeps_local_order() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);

    let ack = engine
        .reorder_scene(ReorderRequest {
            id: SceneId::from("b"),
            to_step: Step::Scripted,
            to_index: 0,
            from_step: None,
            from_index: None,
        })
        .await
        .expect("reorder");

    assert_eq!(ack.id, SceneId::from("b"));
    let column: Vec<_> = engine
        .store()
        .scenes_in_step(Step::Scripted)
        .await
        .into_iter()
        .map(|scene| scene.id)
        .collect();
    assert_eq!(column, [SceneId::from("b"), SceneId::from("a")]);
}

#[tokio::test]
async fn create_swaps_temporary_id_for_server_id() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let gate = repo.hold();

    let task = tokio::spawn({
        let engine = engine.clone();
        async move { engine.create_scene(draft("Night shoot")).await }
    });
    wait_for_calls(&repo, 1).await;

    let placeholder = engine.store().scenes().await.pop().unwrap();
    assert!(placeholder.id.is_temporary());
    assert_eq!(placeholder.title, "Night shoot");

    // Something else lands first and shifts the collection.
    engine
        .store()
        .dispatch(SceneAction::ReorderScene {
            id: SceneId::from("b"),
            to_index: 0,
        })
        .await;

    gate.add_permits(1);
    let created = task.await.unwrap().expect("create");

    let scenes = engine.store().scenes().await;
    assert_eq!(created.id, SceneId::from("scene-1"));
    assert!(scenes.iter().all(|scene| !scene.id.is_temporary()));
    assert_eq!(scenes.last().unwrap(), &created);
    assert_eq!(scenes.len(), 4);
}

#[tokio::test]
async fn failed_create_removes_placeholder() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    repo.fail_with(400, Some(ErrorCode::Validation));

    let err = engine
        .create_scene(draft("Rejected"))
        .await
        .expect_err("scripted failure");

    assert_eq!(err.kind, MutationKind::Create);
    assert!(err.scene_id.is_temporary());
    assert_eq!(engine.store().scenes().await, board());
}

#[tokio::test]
async fn update_reconciles_with_server_copy() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let mut edited = scene("c", Step::Recording);
    edited.record_location = "Rooftop".into();

    let saved = engine.update_scene(edited.clone()).await.expect("update");

    assert_eq!(saved, edited);
    assert_eq!(engine.store().scene(&SceneId::from("c")).await, Some(edited));
}

#[tokio::test]
async fn mutation_cancels_outstanding_refetch() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let ticket = engine.store().begin_refetch().await;

    engine
        .move_scene(&SceneId::from("a"), Step::PreProduction)
        .await
        .expect("move");

    // The stale read started before the move must not overwrite it.
    assert!(!engine.store().complete_refetch(ticket, board()).await);
    let moved = engine.store().scene(&SceneId::from("a")).await.unwrap();
    assert_eq!(moved.step, Step::PreProduction);
}

#[tokio::test]
async fn concurrent_moves_on_different_scenes_both_land() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);

    let (a, c) = (SceneId::from("a"), SceneId::from("c"));
    let (first, second) = tokio::join!(
        engine.move_scene(&a, Step::PreProduction),
        engine.move_scene(&c, Step::PostProduction),
    );
    first.expect("first move");
    second.expect("second move");

    let scenes = engine.store().scenes().await;
    assert_eq!(scenes[0].step, Step::PreProduction);
    assert_eq!(scenes[2].step, Step::PostProduction);
}

#[tokio::test]
async fn failed_move_keeps_a_create_still_in_flight() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let gate = repo.hold();

    let moving = tokio::spawn({
        let engine = engine.clone();
        async move { engine.move_scene(&SceneId::from("a"), Step::PreProduction).await }
    });
    wait_for_calls(&repo, 1).await;
    let creating = tokio::spawn({
        let engine = engine.clone();
        async move { engine.create_scene(draft("Night shoot")).await }
    });
    wait_for_calls(&repo, 2).await;

    repo.fail_with(500, Some(ErrorCode::Internal));
    gate.add_permits(1);
    moving.await.unwrap().expect_err("scripted failure");

    let scenes = engine.store().scenes().await;
    assert_eq!(scenes[0].step, Step::Scripted);
    assert!(scenes.iter().any(|scene| scene.id.is_temporary()));

    repo.recover();
    gate.add_permits(1);
    let created = creating.await.unwrap().expect("create");

    let mut expected = board();
    expected.push(created);
    assert_eq!(engine.store().scenes().await, expected);
}

#[tokio::test]
async fn failed_reorder_only_restores_its_own_step() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    let gate = repo.hold();

    let reordering = tokio::spawn({
        let engine = engine.clone();
        async move {
            engine
                .reorder_scene(ReorderRequest {
                    id: SceneId::from("b"),
                    to_step: Step::Scripted,
                    to_index: 0,
                    from_step: Some(Step::Scripted),
                    from_index: Some(1),
                })
                .await
        }
    });
    wait_for_calls(&repo, 1).await;
    let moving = tokio::spawn({
        let engine = engine.clone();
        async move { engine.move_scene(&SceneId::from("c"), Step::PostProduction).await }
    });
    wait_for_calls(&repo, 2).await;

    repo.fail_with(503, None);
    gate.add_permits(1);
    reordering.await.unwrap().expect_err("scripted failure");
    repo.recover();
    gate.add_permits(1);
    moving.await.unwrap().expect("move");

    let scenes = engine.store().scenes().await;
    let ids: Vec<_> = scenes.iter().map(|scene| scene.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(scenes[2].step, Step::PostProduction);
}

#[tokio::test]
async fn failed_update_puts_back_only_that_scene() {
    let repo = FakeRepository::with_scenes(board());
    let engine = engine_with(&repo);
    engine
        .store()
        .dispatch(SceneAction::MoveScene {
            id: SceneId::from("c"),
            to_step: Step::PostProduction,
        })
        .await;
    let before = engine.store().scenes().await;
    repo.fail_with(500, None);

    let mut edited = scene("a", Step::Scripted);
    edited.title = "Dawn patrol".into();
    engine.update_scene(edited).await.expect_err("scripted failure");

    assert_eq!(engine.store().scenes().await, before);
}
