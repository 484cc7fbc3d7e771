pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod notify;
pub mod repository;
pub mod session;
pub mod store;

pub use config::{load_settings, ClientSettings};
pub use drag::{
    ConfirmOutcome, DragController, DragEndEvent, DragItem, DragPhase, DragSnapshot,
    DragStartEvent, DropOutcome, DropTarget, PendingTransition,
};
pub use engine::OptimisticEngine;
pub use error::{MutationError, MutationKind, SessionError};
pub use notify::{
    FeedbackDurations, Notification, NotificationKind, NotificationSink, TransientNotifier,
};
pub use repository::{HttpSceneRepository, ReorderRequest, RepositoryError, SceneRepository};
pub use session::{SessionView, StudioSession};
pub use store::{SceneAction, SceneState, SceneStore, Snapshot, StoreEvent};

#[cfg(test)]
mod testing;
