pub mod dev;
pub mod public;
pub mod webhooks;

use axum::Router;

use crate::db::AppState;

/// The full application router. Dev routes are only mounted when `dev_mode` is set.
pub fn router(state: AppState, dev_mode: bool) -> Router {
    let mut app = Router::new()
        .merge(public::router(state.clone()))
        .merge(webhooks::router());

    if dev_mode {
        app = app.merge(dev::router());
    }

    app.with_state(state)
}
