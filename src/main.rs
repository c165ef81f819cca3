//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use timetable_console::adapters::http::open_session;
use timetable_console::adapters::persistence::StateJson;
use timetable_console::adapters::ui::tui::{TerminalNotices, TerminalPrompt, TuiInputPort};
use timetable_console::domain::SuggestKind;
use timetable_console::ports::{InputPort, NoticePort, PromptPort, SessionStorePort};
use timetable_console::shared::config::AppConfig;
use timetable_console::usecases::Typeahead;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable, using defaults");
        AppConfig::default()
    });
    let base_url = cfg.base_url_or_default();

    timetable_console::adapters::ui::init_ui(&base_url);

    // --- API session (live client; demo data only when TIMETABLE_DEMO is set) ---
    let (api, mode) = open_session(
        &base_url,
        Duration::from_secs(cfg.request_timeout_secs_or_default()),
        cfg.is_demo(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!(?mode, "API session");

    // --- Client state (last selected group) ---
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let state_path = data_path.join("state.json");
    info!(path = %state_path.display(), "state file");
    let state_impl = StateJson::new(&state_path);
    state_impl
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let store: Arc<dyn SessionStorePort> = Arc::new(state_impl);

    let prompt: Arc<dyn PromptPort> = Arc::new(TerminalPrompt);
    let notices: Arc<dyn NoticePort> = Arc::new(TerminalNotices);

    // --- Typeahead (debounce and limit fixed for the process lifetime) ---
    let debounce_ms = cfg.debounce_ms_or_default();
    let kind = cfg.suggest_type.as_deref().and_then(|t| match t.trim() {
        "group" => Some(SuggestKind::Group),
        "teacher" => Some(SuggestKind::Teacher),
        "subject" => Some(SuggestKind::Subject),
        other => {
            warn!(suggest_type = other, "unknown suggest type ignored");
            None
        }
    });
    info!(debounce_ms, limit = cfg.suggest_limit_or_default(), "typeahead");
    let typeahead = Typeahead::new(
        Arc::clone(&api),
        Arc::clone(&store),
        Duration::from_millis(debounce_ms),
    )
    .with_limit(cfg.suggest_limit_or_default() as u32)
    .with_kind(kind)
    .with_notices(Arc::clone(&notices));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        Arc::clone(&api),
        Arc::clone(&store),
        typeahead,
        prompt,
        notices,
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
