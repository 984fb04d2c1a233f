use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::entities::FormKind;
use crate::session::SessionContext;
use crate::store::{MemoryStore, SqliteStore, TransientStore};
use crate::views::{DatasetKind, Datasets};
use crate::wizard::{WizardKind, WizardOps};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Result of an HTTP request spawned off the event loop, carried back so the
/// state change happens on the loop.
#[derive(Debug)]
pub enum Completion {
    Wizard {
        kind: WizardKind,
        id: Uuid,
        result: Result<Value, ApiError>,
    },
    Form {
        kind: FormKind,
        id: Uuid,
        result: Result<Value, ApiError>,
    },
    Fetch {
        kind: DatasetKind,
        id: Uuid,
        result: Result<Value, ApiError>,
    },
    Auth {
        id: Uuid,
        result: Result<Value, ApiError>,
    },
}

pub struct AppState {
    pub config: Config,
    pub session: SessionContext,
    /// `None` when the HTTP client could not be built for the current session.
    pub api: Option<ApiClient>,
    pub workspace: Option<PathBuf>,
    pub store: Box<dyn TransientStore>,
    pub wizards: HashMap<WizardKind, Box<dyn WizardOps>>,
    pub datasets: Datasets,
    pub pending_forms: HashMap<FormKind, Uuid>,
    pub pending_fetches: HashMap<DatasetKind, Uuid>,
    pub pending_auth: Option<Uuid>,
    completions: UnboundedSender<Completion>,
}

impl AppState {
    pub fn new(config: Config, completions: UnboundedSender<Completion>) -> Self {
        let session = SessionContext::new(config.api_url.clone());
        let store = initial_store(&config);
        let mut state = AppState {
            workspace: config.session_dir.clone(),
            config,
            session,
            api: None,
            store,
            wizards: HashMap::new(),
            datasets: Datasets::default(),
            pending_forms: HashMap::new(),
            pending_fetches: HashMap::new(),
            pending_auth: None,
            completions,
        };
        state.rebuild_client();
        state
    }

    /// Rebuilds the API client from the current session.
    pub fn rebuild_client(&mut self) {
        self.api = match ApiClient::new(&self.session, self.config.request_timeout) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, "could not build API client");
                None
            }
        };
    }

    /// Runs `call` against the API on the runtime and feeds its result back
    /// through the completion channel.
    pub fn spawn_call<F, Fut, W>(&self, call: F, wrap: W) -> bool
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
        W: FnOnce(Result<Value, ApiError>) -> Completion + Send + 'static,
    {
        let Some(api) = self.api.clone() else {
            return false;
        };
        let fut = call(api);
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let result = fut.await;
            // The receiver only goes away at shutdown.
            let _ = tx.send(wrap(result));
        });
        true
    }

    pub fn any_submitting(&self) -> bool {
        !self.pending_forms.is_empty() || self.wizards.values().any(|w| w.is_submitting())
    }

    pub fn next_autosave(&self) -> Option<Instant> {
        self.wizards.values().filter_map(|w| w.autosave_deadline()).min()
    }

    pub fn flush_due(&mut self, now: Instant) {
        let store = self.store.as_mut();
        for w in self.wizards.values_mut() {
            w.flush_due(store, now);
        }
    }

    pub fn flush_all(&mut self) -> usize {
        let store = self.store.as_mut();
        let mut saved = 0;
        for w in self.wizards.values_mut() {
            if w.flush(store) {
                saved += 1;
            }
        }
        saved
    }
}

fn initial_store(config: &Config) -> Box<dyn TransientStore> {
    if let Some(dir) = &config.session_dir {
        match SqliteStore::open(dir) {
            Ok(s) => {
                info!(dir = %dir.display(), "session store opened");
                return Box::new(s);
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "falling back to in-memory session store"),
        }
    }
    match SqliteStore::in_memory() {
        Ok(s) => Box::new(s),
        Err(e) => {
            warn!(error = %e, "sqlite unavailable, keeping session in process memory");
            Box::new(MemoryStore::default())
        }
    }
}
