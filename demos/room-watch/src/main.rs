//! Joins a room and prints what happens in it until Ctrl-C.
//!
//! ```text
//! room-watch <ROOM> <USER_ID> <NAME> [LANGUAGE]
//! ```
//!
//! The relay URL and timings come from the `POLYROOM_*` environment
//! variables; log verbosity from `RUST_LOG`.

use polyroom::prelude::*;
use tokio::sync::broadcast::error::RecvError;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

const USAGE: &str = "usage: room-watch <ROOM> <USER_ID> <NAME> [LANGUAGE]";

fn parse_args(args: &[String]) -> Result<JoinRequest, String> {
    match args {
        [room, user, name] => Ok(JoinRequest::new(
            room.as_str(),
            user.as_str(),
            name.as_str(),
            "English",
        )),
        [room, user, name, language] => Ok(JoinRequest::new(
            room.as_str(),
            user.as_str(),
            name.as_str(),
            language.as_str(),
        )),
        _ => Err(USAGE.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_roster(snapshot: &RoomSnapshot) {
    println!("room {} ({} present)", snapshot.room_code, snapshot.participants.len());
    for p in &snapshot.participants {
        let you = if p.id == snapshot.local_user { " (you)" } else { "" };
        let streaming = if p.is_streaming(StreamKind::Primary) { " [live]" } else { "" };
        println!("  {} {}{you} speaks {}{streaming}", p.id, p.name, p.language);
    }
}

async fn describe(session: &RoomSession, delta: StateDelta) {
    match delta {
        StateDelta::Unchanged => {}
        StateDelta::LanguageChanged { user_id, language } => {
            println!("{user_id} now speaks {language}");
        }
        StateDelta::SecondaryStreamStopped { user_id, .. } => {
            println!("{user_id} stopped sharing");
        }
        StateDelta::SnapshotUpdated { .. } => {}
        StateDelta::Rejected { message } => println!("relay: {message}"),
        StateDelta::TranslationUpdated => {
            let latest = session.snapshot().await.ok().and_then(|s| s.latest_translation);
            if let Some(t) = latest {
                println!("{}: {} => {}", t.user_id, t.original, t.translated);
            }
        }
        StateDelta::RecordingsUpdated => {
            if let Ok(snapshot) = session.snapshot().await {
                println!("{} saved recording(s)", snapshot.recordings.len());
            }
        }
        membership => {
            tracing::debug!(?membership, "membership changed");
            if let Ok(snapshot) = session.snapshot().await {
                print_roster(&snapshot);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    polyroom::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = parse_args(&args)?;

    let client = RoomClient::from_env()?;
    eprintln!("joining {} via {}", request.room_code, client.config().relay_url);
    let session = client.join(request).await?;
    print_roster(&session.snapshot().await?);

    let mut updates = session.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("leaving");
                session.close().await;
                break;
            }
            update = updates.recv() => match update {
                Ok(SessionUpdate::Delta(delta)) => describe(&session, delta).await,
                Ok(SessionUpdate::Disconnected { reason }) => {
                    eprintln!("disconnected: {reason}");
                    break;
                }
                Ok(SessionUpdate::Closed) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "fell behind, re-reading room");
                    if let Ok(snapshot) = session.snapshot().await {
                        print_roster(&snapshot);
                    }
                }
            },
        }
    }

    Ok(())
}
