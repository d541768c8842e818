//! clearpath-daemon: the Clearpath clearance-tracking daemon.
//!
//! Single OS process running a Tokio async runtime. The UI communicates
//! with the daemon via JSON-RPC over Unix socket; the daemon talks to the
//! hosted Identity Store over REST. The resolved role profile lives here
//! as process-wide state: only the resolver path writes it, every other
//! consumer reads snapshots.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info, warn};

use clearpath_core::controller::SessionController;
use clearpath_core::notify::{LogNotifier, ReminderNotifier};
use clearpath_store::local::LocalState;
use clearpath_store::rest::RestStore;
use clearpath_store::IdentityStore;
use clearpath_types::profile::{Role, RoleProfile};
use clearpath_types::session::Session;

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// The process-wide auth state: the single source of truth for the
/// current session and its resolved profile.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    /// The current session, if signed in.
    pub session: Option<Session>,
    /// True while profile resolution is in flight.
    pub loading: bool,
    /// The resolved profile; `None` after a completed resolution means
    /// the session matched no role table.
    pub profile: Option<RoleProfile>,
}

impl AuthState {
    /// The resolved role, if any.
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(RoleProfile::role)
    }
}

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Identity Store client. `None` when the backend is unconfigured;
    /// store-touching commands then short-circuit with NOT_CONFIGURED.
    pub store: Option<Arc<dyn IdentityStore>>,
    /// Local on-disk state (login hint, persisted session).
    pub local: Mutex<LocalState>,
    /// Auth state. Written only by the resolver/sign-in/sign-out paths.
    pub auth: RwLock<AuthState>,
    /// Redirect controller (one-shot retry state lives here).
    pub controller: Mutex<SessionController>,
    /// Event bus for pushing events to subscribers.
    pub events: EventBus,
    /// Configuration.
    pub config: DaemonConfig,
    /// Reminder delivery seam.
    pub notifier: Arc<dyn ReminderNotifier>,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing at the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("clearpath={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Clearpath daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Open local state
    let local = LocalState::open(&data_dir.join("state.db"))?;

    // 4. Construct the store client (or run unconfigured)
    let store: Option<Arc<dyn IdentityStore>> = if config.backend.is_configured() {
        Some(Arc::new(RestStore::new(
            &config.backend.url,
            &config.backend.anon_key,
        )?))
    } else {
        warn!("backend not configured; store operations will be rejected");
        None
    };

    // 5. Restore a persisted session, if any
    let restored = match local.load_session() {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "could not load persisted session");
            None
        }
    };
    if let (Some(store), Some(session)) = (&store, &restored) {
        store.restore_session(session.clone()).await?;
    }
    let has_session = restored.is_some();

    // 6. Build daemon state
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let state = Arc::new(DaemonState {
        store,
        local: Mutex::new(local),
        auth: RwLock::new(AuthState {
            session: restored,
            loading: has_session,
            profile: None,
        }),
        controller: Mutex::new(SessionController::new()),
        events: EventBus::new(1000),
        config,
        notifier: Arc::new(LogNotifier),
        shutdown_tx: shutdown_tx.clone(),
    });

    // 7. Resolve the restored session in the background. Sign-in requests
    // converge on the same resolver, so a race between the two is
    // harmless.
    if has_session {
        let state = state.clone();
        tokio::spawn(async move {
            commands::auth::refresh_profile(&state).await;
        });
    }

    // 8. Start IPC server
    let socket_path = state.config.data_dir().join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.events.emit(events::Event::now(
        "DaemonStarted",
        serde_json::json!({"version": env!("CARGO_PKG_VERSION")}),
    ));

    // 9. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
