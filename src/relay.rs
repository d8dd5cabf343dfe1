//! Unix-socket relay carrying agent-chosen actions into the game process.
//!
//! The AI agent's tool calls run in a separate process. When the agent picks
//! an action, that process connects to a well-known socket, writes one
//! newline-terminated JSON message and disconnects. The relay applies the
//! action to the named session and never replies; a sender cannot tell a
//! dropped message from an applied one, and does not need to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocket::serde::{Deserialize, Serialize};
use rocket::tokio;
use rocket::tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use rocket::tokio::net::{UnixListener, UnixStream};

use crate::action::ActionKind;
use crate::store::{GameState, SharedGameState};

const SOCKET_FILE: &str = "ork-arena.socket";

/// The per-host socket path the external tool process connects to.
pub fn socket_path() -> PathBuf {
    std::env::temp_dir().join(SOCKET_FILE)
}

/// One action-application request. The field names are the wire contract
/// with the external tool process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RelayMessage {
    pub session_name: String,
    pub action: ActionKind,
    pub player_turn: bool,
}

/// Why a single relay connection was dropped. Every variant is contained at
/// the connection boundary: it is logged and the listener keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to read relay message: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed relay message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no session named {0:?}")]
    UnknownSession(String),
}

/// Bind the relay socket. Binding is synchronous so callers hold a live
/// listener before any sender can race the first connect.
pub fn listen(path: &Path) -> std::io::Result<UnixListener> {
    // A socket file left behind by a previous run would make bind fail.
    let _ = std::fs::remove_file(path);
    UnixListener::bind(path)
}

/// Accept loop. Each connection is handled in its own task; a failed message
/// is logged and dropped without disturbing the listener.
pub async fn run(listener: UnixListener, state: SharedGameState) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, state).await {
                        log::warn!("relay message dropped: {}", e);
                    }
                });
            }
            Err(e) => log::warn!("relay accept failed: {}", e),
        }
    }
}

/// Bind and serve until the hosting process shuts down.
pub async fn serve(path: PathBuf, state: SharedGameState) -> std::io::Result<()> {
    let listener = listen(&path)?;
    log::info!("relay listening on {}", path.display());
    run(listener, state).await;
    Ok(())
}

async fn handle_client(stream: UnixStream, state: SharedGameState) -> Result<(), RelayError> {
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).await?;
    if line.trim().is_empty() {
        // Peer connected and went away without sending anything.
        return Ok(());
    }
    let message: RelayMessage = serde_json::from_str(&line)?;

    let mut state = state.lock().await;
    let GameState { sessions, rng } = &mut *state;
    // Session creation is owned by the HTTP layer; the relay only mutates
    // sessions that already exist.
    let session = sessions
        .get_mut(&message.session_name)
        .ok_or_else(|| RelayError::UnknownSession(message.session_name.clone()))?;
    let _ = session.act(message.action, message.player_turn, rng);
    Ok(())
}

/// Client half of the protocol: write one framed message and disconnect.
/// This is what the external tool process calls when the agent has chosen an
/// action.
pub async fn send_message(path: &Path, message: &RelayMessage) -> Result<(), RelayError> {
    let mut stream = UnixStream::connect(path).await?;
    let mut payload = serde_json::to_vec(message)?;
    payload.push(b'\n');
    stream.write_all(&payload).await?;
    stream.shutdown().await?;
    Ok(())
}

/// [`send_message`] against the well-known socket path.
pub async fn send_default(message: &RelayMessage) -> Result<(), RelayError> {
    send_message(&socket_path(), message).await
}

/// Remove the socket file; called once at process shutdown.
pub fn delete_socket() {
    let _ = std::fs::remove_file(socket_path());
}
