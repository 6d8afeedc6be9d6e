use std::{
    net::SocketAddr,
    sync::{Arc, RwLock, RwLockReadGuard, mpsc::Receiver},
    thread,
};

use axum::{
    Router,
    extract::{RawQuery, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use url::Url;

use crate::{
    cache::Cache,
    controller::{self, Outcome, Params},
    loader, render,
    session::Session,
    tags::TagUpdate,
};

#[derive(Clone)]
struct AppState {
    session: Arc<RwLock<Session>>,
    site_root: Arc<Url>,
}

impl AppState {
    fn session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Apply tag updates as they arrive, then persist the finished dataset.
pub fn follow_tags(
    session: Arc<RwLock<Session>>,
    updates: Receiver<TagUpdate>,
    cache: Cache,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for update in updates {
            let mut session = session.write().unwrap_or_else(|p| p.into_inner());
            session.apply(update);
        }
        let mut session = session.write().unwrap_or_else(|p| p.into_inner());
        if !session.take_render_due() {
            log::info!("no tags arrived");
        }
        loader::seal(&session, &cache);
    })
}

fn router(session: Arc<RwLock<Session>>, site_root: Url) -> Router {
    let state = AppState {
        session,
        site_root: Arc::new(site_root),
    };
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run(
    session: Arc<RwLock<Session>>,
    site_root: Url,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let app = router(session, site_root);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("serving on http://{addr}/");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn index(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let params = Params::parse(query.as_deref());
    let session = state.session();
    match controller::resolve(&session, &params, &state.site_root) {
        Outcome::Redirect(url) => Redirect::temporary(&url).into_response(),
        Outcome::Page(view) => Html(render::page(&view)).into_response(),
    }
}

async fn health() -> &'static str {
    "OK"
}
