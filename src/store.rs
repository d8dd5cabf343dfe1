use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Lcg64Xsh32;
use rocket::futures::lock::Mutex;

use crate::session::GameSession;

/// Every live session, keyed by session name.
pub type SessionTable = HashMap<String, GameSession>;

/// The one instance of [`GameState`] shared by the HTTP layer and the relay.
/// Both take the lock around a whole turn, so turns never interleave
/// mid-resolution.
pub type SharedGameState = Arc<Mutex<GameState>>;

/// Process-wide mutable game state: the session table plus the dice all
/// sessions roll against.
#[derive(Debug)]
pub struct GameState {
    pub sessions: SessionTable,
    pub rng: Lcg64Xsh32,
}

impl GameState {
    pub fn new() -> GameState {
        GameState::with_sessions(SessionTable::new())
    }

    pub fn with_sessions(sessions: SessionTable) -> GameState {
        GameState {
            sessions,
            rng: Lcg64Xsh32::from_rng(&mut rand::rng()),
        }
    }

    /// Look up a session, default-initializing it on first reference.
    pub fn get_or_create(&mut self, name: &str) -> &mut GameSession {
        self.sessions
            .entry(name.to_string())
            .or_insert_with(|| GameSession::new_session(name))
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

/// Directory holding the snapshot file, from the `STATE_FOLDER` environment
/// variable; defaults to the working directory.
pub fn state_folder() -> PathBuf {
    std::env::var("STATE_FOLDER")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn state_file() -> PathBuf {
    state_folder().join("state.json")
}

/// Restore the session table from the snapshot file. A missing or unreadable
/// file and malformed content all yield an empty table; a fresh game is a
/// valid start state.
pub fn read_state() -> SessionTable {
    read_state_from(&state_file())
}

pub fn read_state_from(path: &Path) -> SessionTable {
    match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
        Err(_) => SessionTable::new(),
    }
}

/// Overwrite the snapshot file with the whole table. There is no atomic
/// rename; a crash mid-write can corrupt the file, which `read_state` then
/// treats as empty.
pub fn write_state(sessions: &SessionTable) -> std::io::Result<()> {
    write_state_to(&state_file(), sessions)
}

pub fn write_state_to(path: &Path, sessions: &SessionTable) -> std::io::Result<()> {
    let data = serde_json::to_vec(sessions)?;
    std::fs::write(path, data)
}
