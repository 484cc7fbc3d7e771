use chrono::NaiveDate;
use shared::{
    domain::{NewScene, Production, Scene, SceneId, Step},
    error::{ApiError, ErrorCode},
    policy::validate_transition,
    protocol::{MoveSceneRequest, ReorderAck, ReorderSceneRequest, UpdateSceneRequest},
    validation::validate_new_scene,
};
use tracing::{debug, info};

use crate::book::SceneBook;

#[derive(Clone)]
pub struct ApiContext {
    pub book: SceneBook,
}

pub async fn list_productions(ctx: &ApiContext) -> Result<Vec<Production>, ApiError> {
    Ok(ctx.book.list_productions().await)
}

pub async fn list_scenes(ctx: &ApiContext) -> Result<Vec<Scene>, ApiError> {
    Ok(ctx.book.list_scenes().await)
}

pub async fn create_scene(ctx: &ApiContext, new: NewScene) -> Result<Scene, ApiError> {
    ensure_required_fields(&new)?;
    let scene = ctx.book.insert(new).await;
    info!(scene_id = %scene.id, step = scene.step.number(), "scene created");
    Ok(scene)
}

pub async fn move_scene(
    ctx: &ApiContext,
    id: &SceneId,
    req: MoveSceneRequest,
) -> Result<Scene, ApiError> {
    let current = existing(ctx, id).await?;
    ensure_transition(current.step, req.step)?;
    let scene = ctx
        .book
        .set_step(id, req.step, req.updated_at)
        .await
        .ok_or_else(|| not_found(id))?;
    info!(
        scene_id = %id,
        from_step = current.step.number(),
        to_step = req.step.number(),
        "scene moved"
    );
    Ok(scene)
}

/// Replaces the stored scene, last writer wins. A step change in the body
/// obeys the same workflow rules as a move.
pub async fn update_scene(
    ctx: &ApiContext,
    id: &SceneId,
    req: UpdateSceneRequest,
) -> Result<Scene, ApiError> {
    if &req.scene.id != id {
        return Err(ApiError::validation(format!(
            "body id {} does not match path id {id}",
            req.scene.id
        )));
    }
    let current = existing(ctx, id).await?;
    if req.scene.step != current.step {
        ensure_transition(current.step, req.scene.step)?;
    }
    ensure_required_fields(&req.scene.without_id())?;
    if let Some(previous) = ctx.book.updated_at(id).await {
        if previous > req.updated_at {
            debug!(scene_id = %id, %previous, incoming = %req.updated_at, "older edit overwrites newer one");
        }
    }

    let scene = ctx
        .book
        .replace(req.scene, req.updated_at)
        .await
        .ok_or_else(|| not_found(id))?;
    info!(scene_id = %id, "scene updated");
    Ok(scene)
}

pub async fn reorder_scene(
    ctx: &ApiContext,
    id: &SceneId,
    req: ReorderSceneRequest,
) -> Result<ReorderAck, ApiError> {
    let current = existing(ctx, id).await?;
    if let Some(from_step) = req.from_step {
        if from_step != current.step {
            return Err(ApiError::validation(format!(
                "scene {id} is at step {}, not {}",
                current.step.number(),
                from_step.number()
            )));
        }
    }
    if req.to_step != current.step {
        ensure_transition(current.step, req.to_step)?;
    }

    let scene = ctx
        .book
        .reorder(id, req.to_step, req.to_index)
        .await
        .ok_or_else(|| not_found(id))?;
    info!(scene_id = %id, to_index = req.to_index, "scene reordered");
    Ok(ReorderAck {
        id: scene.id,
        step: scene.step,
    })
}

async fn existing(ctx: &ApiContext, id: &SceneId) -> Result<Scene, ApiError> {
    ctx.book.scene(id).await.ok_or_else(|| not_found(id))
}

fn ensure_transition(from: Step, to: Step) -> Result<(), ApiError> {
    let result = validate_transition(from, to);
    if result.is_valid {
        Ok(())
    } else {
        Err(ApiError::new(ErrorCode::Validation, result.message))
    }
}

fn ensure_required_fields(scene: &NewScene) -> Result<(), ApiError> {
    // Recording dates in the past are checked by the client form only.
    validate_new_scene(scene, NaiveDate::MIN)
        .map_err(|errors| ApiError::validation(errors.to_string()))
}

fn not_found(id: &SceneId) -> ApiError {
    ApiError::not_found(format!("scene {id} not found"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
