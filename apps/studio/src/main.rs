use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ConfirmOutcome, DragEndEvent, DragItem, DragStartEvent, DropOutcome,
    DropTarget, HttpSceneRepository, StudioSession,
};
use shared::{
    domain::{NewScene, SceneId, ScenePatch, Step},
    policy::ForwardOnlyPolicy,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod console;

use console::ConsoleSink;

#[derive(Parser, Debug)]
#[command(name = "studio", about = "Scene production board")]
struct Cli {
    /// Overrides `server_url` from studio.toml and STUDIO_SERVER_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board column by column.
    List {
        #[arg(long)]
        json: bool,
    },
    Productions,
    /// Drag a scene onto another step's column and confirm the move.
    Move {
        id: String,
        #[arg(value_parser = parse_step)]
        step: Step,
        /// Confirm without prompting.
        #[arg(long)]
        yes: bool,
    },
    /// Drop a scene onto the card at `index` within its own step.
    Reorder { id: String, index: usize },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        episode: String,
        #[arg(long)]
        location: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_step, default_value = "1")]
        step: Step,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        episode: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = parse_date, conflicts_with = "clear_date")]
        date: Option<NaiveDate>,
        #[arg(long)]
        clear_date: bool,
    },
}

fn parse_step(raw: &str) -> Result<Step, String> {
    let number: u8 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a step number"))?;
    Step::try_from(number).map_err(|err| err.to_string())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("`{raw}` is not YYYY-MM-DD"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(url) = cli.server_url {
        settings.server_url = url;
    }
    info!(server_url = %settings.server_url, "studio starting");

    let repository =
        HttpSceneRepository::with_timeout(&settings.server_url, settings.request_timeout)
            .with_context(|| format!("invalid server url {}", settings.server_url))?;
    let session = StudioSession::new(
        Arc::new(repository),
        Arc::new(ForwardOnlyPolicy),
        ConsoleSink::new(settings.feedback),
    );

    match cli.command {
        Command::List { json } => list(&session, json).await?,
        Command::Productions => {
            for production in session.load_productions().await? {
                match production.description {
                    Some(description) => {
                        println!("{}  {}  {}", production.id, production.name, description)
                    }
                    None => println!("{}  {}", production.id, production.name),
                }
            }
        }
        Command::Move { id, step, yes } => {
            move_scene(&session, SceneId::from(id), step, yes).await?
        }
        Command::Reorder { id, index } => reorder(&session, SceneId::from(id), index).await?,
        Command::Create {
            title,
            description,
            episode,
            location,
            date,
            step,
        } => {
            let created = session
                .create_scene(NewScene {
                    title,
                    description,
                    episode,
                    record_location: location,
                    record_date: date,
                    step,
                })
                .await?;
            println!("created scene_id={}", created.id);
        }
        Command::Edit {
            id,
            title,
            description,
            episode,
            location,
            date,
            clear_date,
        } => {
            session.load().await?;
            let patch = ScenePatch {
                title,
                description,
                episode,
                record_location: location,
                record_date: if clear_date { Some(None) } else { date.map(Some) },
            };
            let saved = session.edit_scene(&SceneId::from(id), patch).await?;
            println!("saved scene_id={}", saved.id);
        }
    }

    Ok(())
}

async fn list(session: &StudioSession, json: bool) -> Result<()> {
    session.load().await?;
    let columns = session.scenes_by_step().await;
    if json {
        let scenes: Vec<_> = columns.into_iter().flat_map(|(_, scenes)| scenes).collect();
        println!("{}", serde_json::to_string_pretty(&scenes)?);
        return Ok(());
    }

    for (step, scenes) in columns {
        println!("{step}");
        for (index, scene) in scenes.iter().enumerate() {
            let date = scene
                .record_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "no date".into());
            println!(
                "  [{index}] {}  {}  ({} @ {}, {date})",
                scene.id, scene.title, scene.episode, scene.record_location
            );
        }
    }
    Ok(())
}

async fn move_scene(session: &StudioSession, id: SceneId, step: Step, yes: bool) -> Result<()> {
    session.load().await?;
    let item = session
        .drag_item(&id)
        .await
        .ok_or_else(|| anyhow!("no scene with id {id}"))?;

    let drag = session.drag();
    drag.on_drag_start(DragStartEvent {
        active: item.clone(),
    })
    .await;
    let outcome = drag
        .on_drag_end(DragEndEvent {
            active: item,
            over: Some(DropTarget::column(step)),
        })
        .await;

    let pending = match outcome {
        DropOutcome::PendingConfirmation(pending) => pending,
        DropOutcome::Rejected(result) => bail!("move rejected: {}", result.message),
        DropOutcome::Ignored | DropOutcome::Reordered { .. } => {
            println!("scene {id} is already in {step}");
            return Ok(());
        }
        other => bail!("unexpected drop outcome: {other:?}"),
    };

    let question = format!(
        "Move \"{}\" from {} to {}? [y/N] ",
        pending.scene_title, pending.from_step, pending.to_step
    );
    if !yes && !ask(&question).await? {
        drag.on_cancel_transition().await;
        println!("move cancelled");
        return Ok(());
    }

    match drag.on_confirm_transition().await? {
        ConfirmOutcome::Moved(scene) | ConfirmOutcome::LandedAfterCancel(scene) => {
            info!(scene_id = %scene.id, step = scene.step.number(), "scene moved");
        }
        ConfirmOutcome::NothingPending | ConfirmOutcome::AlreadyConfirming => {}
    }
    Ok(())
}

async fn reorder(session: &StudioSession, id: SceneId, index: usize) -> Result<()> {
    session.load().await?;
    let scene = session
        .store()
        .scene(&id)
        .await
        .ok_or_else(|| anyhow!("no scene with id {id}"))?;
    let column = session.store().scenes_in_step(scene.step).await;
    let target = column
        .get(index)
        .or_else(|| column.last())
        .ok_or_else(|| anyhow!("step {} is empty", scene.step))?;

    let item = DragItem::from_scene(&scene);
    let drag = session.drag();
    drag.on_drag_start(DragStartEvent {
        active: item.clone(),
    })
    .await;
    match drag
        .on_drag_end(DragEndEvent {
            active: item,
            over: Some(DropTarget::scene(target)),
        })
        .await
    {
        DropOutcome::Reordered { to_index, .. } => {
            info!(scene_id = %id, to_index, "scene reordered");
            Ok(())
        }
        DropOutcome::Ignored => {
            println!("scene {id} is already at position {index}");
            Ok(())
        }
        DropOutcome::ReorderFailed { message, .. } => bail!("reorder failed: {message}"),
        other => bail!("unexpected drop outcome: {other:?}"),
    }
}

async fn ask(question: &str) -> Result<bool> {
    print!("{question}");
    std::io::Write::flush(&mut std::io::stdout())?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
