//! # Ork Arena
//!
//! Backend for a browser-playable turn-based battle game. The player shouts
//! an Orkish battle cry, an external language-model agent translates it into
//! one of six combat actions, and this process resolves the turn.
//!
//! ## Architecture
//!
//! The agent's tool calls run in a separate process and report the chosen
//! action over a unix-socket relay ([`relay`]); browsers read and mutate
//! sessions over HTTP ([`endpoints`]). Both paths funnel into the same
//! [`store::GameState`] behind one async mutex, so no two turns ever
//! interleave mid-resolution. The session table is snapshotted to disk after
//! every handled request and restored at startup ([`store`]).

#[macro_use]
extern crate rocket;

use rocket::fairing::AdHoc;
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod action;
pub mod endpoints;
#[cfg(unix)]
pub mod relay;
pub mod session;
pub mod status_messages;
pub mod store;

use crate::store::SharedGameState;

/// Initializes and configures the Rocket instance: restores the session
/// table, mounts the API and Swagger UI, and wires up the relay listener and
/// the persistence fairings.
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    use crate::endpoints::okapi_add_operation_for_get_session_state_;
    use crate::endpoints::okapi_add_operation_for_list_session_actions_;
    use crate::endpoints::okapi_add_operation_for_list_sessions_;
    use crate::endpoints::okapi_add_operation_for_post_session_action_;
    use crate::endpoints::{
        get_session_state, list_session_actions, list_sessions, post_session_action,
    };

    let _ = env_logger::try_init();

    let sessions = store::read_state();
    log::info!("restored {} session(s) from snapshot", sessions.len());
    let gs: SharedGameState = std::sync::Arc::new(rocket::futures::lock::Mutex::new(
        store::GameState::with_sessions(sessions),
    ));

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                list_sessions,
                get_session_state,
                post_session_action,
                list_session_actions
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .manage(gs)
        .attach(AdHoc::on_liftoff("relay-and-shutdown", |rocket| {
            Box::pin(async move {
                if let Some(gs_state) = rocket.state::<SharedGameState>().cloned() {
                    #[cfg(unix)]
                    {
                        let relay_state = gs_state.clone();
                        rocket::tokio::spawn(async move {
                            if let Err(e) = relay::serve(relay::socket_path(), relay_state).await {
                                log::error!("relay server failed to start: {}", e);
                            }
                        });
                    }
                    // When the process receives SIGINT/SIGTERM (or ctrl-c),
                    // write a final snapshot and remove the relay socket.
                    rocket::tokio::spawn(async move {
                        #[cfg(unix)]
                        {
                            use rocket::tokio::signal::unix::{signal, SignalKind};
                            let mut sigterm = signal(SignalKind::terminate())
                                .expect("failed to set SIGTERM handler");
                            let mut sigint = signal(SignalKind::interrupt())
                                .expect("failed to set SIGINT handler");
                            rocket::tokio::select! {
                                _ = sigterm.recv() => {},
                                _ = sigint.recv() => {},
                            }
                        }
                        #[cfg(not(unix))]
                        {
                            let _ = rocket::tokio::signal::ctrl_c().await;
                        }

                        let gs = gs_state.lock().await;
                        if let Err(e) = store::write_state(&gs.sessions) {
                            log::warn!("failed to write final snapshot: {}", e);
                        }
                        #[cfg(unix)]
                        relay::delete_socket();
                    });
                }
            })
        }))
        .attach(AdHoc::on_response("snapshot-session-table", |req, _res| {
            Box::pin(async move {
                if let Some(gs_state) = req.rocket().state::<SharedGameState>() {
                    let gs = gs_state.lock().await;
                    if let Err(e) = store::write_state(&gs.sessions) {
                        log::warn!("failed to snapshot session table: {}", e);
                    }
                }
            })
        }))
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
