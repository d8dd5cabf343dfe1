use rocket::response::status::{BadRequest, Created, NotFound};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::action::ActionKind;
use crate::session::{ActionRecord, GameSession};
use crate::status_messages::{new_status, Status};
use crate::store::{GameState, SharedGameState};

/// One turn submitted over HTTP. `player_turn` is false when the frontend
/// relays an enemy move it was told about; player-originated actions send
/// true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TurnRequest {
    pub action: ActionKind,
    pub player_turn: bool,
}

/// Names of every session in the table.
#[openapi]
#[get("/sessions")]
pub async fn list_sessions(game_state: &State<SharedGameState>) -> Json<Vec<String>> {
    let gs = game_state.lock().await;
    let mut names: Vec<String> = gs.sessions.keys().cloned().collect();
    names.sort();
    Json(names)
}

/// Current state of a session, default-initialized on first reference.
#[openapi]
#[get("/session/<name>")]
pub async fn get_session_state(
    name: String,
    game_state: &State<SharedGameState>,
) -> Json<GameSession> {
    let mut gs = game_state.lock().await;
    Json(gs.get_or_create(&name).clone())
}

/// Apply one turn to a session and return the log record it produced.
/// A finished session rejects further turns.
#[openapi]
#[post("/session/<name>/action", format = "json", data = "<turn>")]
pub async fn post_session_action(
    name: String,
    turn: Json<TurnRequest>,
    game_state: &State<SharedGameState>,
) -> Result<Created<Json<ActionRecord>>, BadRequest<Json<Status>>> {
    let mut gs = game_state.lock().await;
    let GameState { sessions, rng } = &mut *gs;
    let session = sessions
        .entry(name.clone())
        .or_insert_with(|| GameSession::new_session(&name));
    match session.act(turn.action, turn.player_turn, rng) {
        Some(record) => {
            let record = record.clone();
            Ok(Created::new(format!("/session/{}/actions", name)).body(Json(record)))
        }
        None => Err(BadRequest(new_status(format!(
            "Session {:?} is already over",
            name
        )))),
    }
}

/// Full action log of a session.
#[openapi]
#[get("/session/<name>/actions")]
pub async fn list_session_actions(
    name: String,
    game_state: &State<SharedGameState>,
) -> Result<Json<Vec<ActionRecord>>, NotFound<Json<Status>>> {
    let gs = game_state.lock().await;
    match gs.sessions.get(&name) {
        Some(session) => Ok(Json(session.actions.clone())),
        None => Err(NotFound(new_status(format!("No session named {:?}", name)))),
    }
}
