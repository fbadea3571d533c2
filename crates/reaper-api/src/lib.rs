//! reaper-api — notification dispatch and HTTP intake for reaper.
//!
//! Provides the dispatcher that routes classified envelopes to the
//! registry and the sweeper, plus axum route handlers for the daemon's
//! intake surface.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/v1/notifications` | Handle one raw notification envelope |
//! | POST | `/v1/instances/{id}/sweep` | Sweep an instance's resources now |
//! | GET | `/v1/instances/{id}/resources` | List an instance's tracked records |

pub mod dispatch;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

use reaper_state::RegistryStore;
use reaper_sweep::Sweeper;

pub use dispatch::{ApiError, Dispatcher, Disposition};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: RegistryStore,
    pub dispatcher: Dispatcher,
    pub sweeper: Sweeper,
}

/// Build the intake router.
pub fn build_router(store: RegistryStore, sweeper: Sweeper) -> Router {
    let state = ApiState {
        dispatcher: Dispatcher::new(store.clone(), sweeper.clone()),
        store,
        sweeper,
    };

    Router::new()
        .route("/v1/notifications", post(handlers::intake_notification))
        .route("/v1/instances/{id}/sweep", post(handlers::sweep_instance))
        .route(
            "/v1/instances/{id}/resources",
            get(handlers::list_resources),
        )
        .with_state(state)
}
