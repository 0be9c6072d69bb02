//! Page-session controller.
//!
//! `FilterController` owns everything that lives for one page route: the
//! repository catalog, the filter engine, the panel and suggestion state and
//! the row subscription. The host adapter turns DOM events into
//! [`FilterMsg`]s and feeds them to [`FilterController::update`]; delayed
//! work comes back as a [`Cmd`] the host schedules (or hands to
//! [`crate::scheduler::Scheduler`]).
//!
//! Lifecycle per route:
//!
//! 1. `start` / `Navigated` bumps the generation and schedules `InitDue` and
//!    `AttachObserverDue` tagged with it.
//! 2. `InitDue` seeds the catalog, mounts the controls, restores the saved
//!    terms and evaluates every row. A missing toolbar leaves no session.
//! 3. `AttachObserverDue` subscribes to row additions.
//! 4. `Navigated` to a different route tears the session down and starts
//!    over. The same route restarts only when no session is running.
//!    Messages carrying an older generation are dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::RepoCatalog;
use crate::config::FilterConfig;
use crate::filter::{Evaluation, FilterEngine, TermChange};
use crate::host::{HostPage, Subscription, TaskRow};
use crate::model::RepositoryListing;
use crate::storage::FilterStorage;

/// Everything that can happen to the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMsg {
    // -- Lifecycle --------------------------------------------------------
    /// Initial delay elapsed; build the session.
    InitDue { generation: u64 },
    /// Observer delay elapsed; subscribe to row additions.
    AttachObserverDue { generation: u64 },
    /// Rows were added to the task list.
    RowsChanged,
    /// The host route changed.
    Navigated(String),
    /// An environment listing payload was intercepted (raw JSON body).
    RepositoriesFetched(String),

    // -- Input ------------------------------------------------------------
    InputFocused,
    InputChanged(String),
    /// A suggestion item was clicked.
    SuggestionChosen(String),
    /// Enter pressed in the input.
    TermSubmitted(String),
    /// A term chip's remove button was clicked.
    TermRemoved(String),
    /// The reset button was clicked.
    ClearRequested,

    // -- Panel ------------------------------------------------------------
    PanelToggled,
    OutsideClicked,
    EscapePressed,
}

/// Side effect requested by [`FilterController::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cmd {
    #[default]
    None,
    /// Deliver `msg` back to `update` after the delay.
    After(Duration, FilterMsg),
    Batch(Vec<Cmd>),
}

impl Cmd {
    pub fn none() -> Self {
        Self::None
    }

    pub fn after(delay: Duration, msg: FilterMsg) -> Self {
        Self::After(delay, msg)
    }

    /// Combine commands, dropping no-ops and unwrapping single entries.
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        let mut cmds: Vec<Cmd> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    #[default]
    Collapsed,
    Expanded,
}

/// State for one mounted page route.
pub struct FilterSession {
    catalog: RepoCatalog,
    engine: FilterEngine,
    panel: PanelState,
    query: String,
    suggestions: Vec<String>,
    suggestions_open: bool,
    rows: Option<Box<dyn Subscription>>,
    last_evaluation: Evaluation,
}

impl std::fmt::Debug for FilterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSession")
            .field("catalog_len", &self.catalog.len())
            .field("engine", &self.engine)
            .field("panel", &self.panel)
            .field("query", &self.query)
            .field("suggestions_open", &self.suggestions_open)
            .field("observing", &self.rows.is_some())
            .field("last_evaluation", &self.last_evaluation)
            .finish_non_exhaustive()
    }
}

impl FilterSession {
    fn new(catalog: RepoCatalog, engine: FilterEngine) -> Self {
        Self {
            catalog,
            engine,
            panel: PanelState::default(),
            query: String::new(),
            suggestions: Vec::new(),
            suggestions_open: false,
            rows: None,
            last_evaluation: Evaluation::default(),
        }
    }

    pub fn catalog(&self) -> &RepoCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestions_open(&self) -> bool {
        self.suggestions_open
    }

    pub fn is_observing(&self) -> bool {
        self.rows.is_some()
    }

    pub fn last_evaluation(&self) -> Evaluation {
        self.last_evaluation
    }

    /// Recompute suggestions for the current query and show them if any.
    fn open_suggestions(&mut self) {
        self.suggestions = self.catalog.suggestions(&self.query, self.engine.active());
        self.suggestions_open = !self.suggestions.is_empty();
    }

    fn close_suggestions(&mut self) {
        self.suggestions.clear();
        self.suggestions_open = false;
    }

    fn refresh_open_suggestions(&mut self) {
        if self.suggestions_open {
            self.open_suggestions();
        }
    }

    fn collapse(&mut self) {
        self.panel = PanelState::Collapsed;
        self.close_suggestions();
    }

    fn teardown(&mut self) {
        if let Some(mut rows) = self.rows.take() {
            rows.unsubscribe();
        }
    }
}

/// Snapshot the host renders the controls from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterView {
    /// False until the controls are mounted for the current route.
    pub ready: bool,
    /// Active terms joined for the toggle button; `None` means all rows.
    pub summary: Option<String>,
    pub terms: Vec<String>,
    pub query: String,
    pub suggestions: Vec<String>,
    pub suggestions_open: bool,
    pub panel: PanelState,
    pub known_repositories: usize,
    pub last_evaluation: Evaluation,
}

pub struct FilterController<H: HostPage> {
    config: FilterConfig,
    host: H,
    storage: Arc<dyn FilterStorage>,
    session: Option<FilterSession>,
    generation: u64,
    route: Option<String>,
    /// Payload identifiers that arrived before the session existed.
    pending_repositories: Vec<String>,
    navigation: Option<Box<dyn Subscription>>,
}

impl<H: HostPage> FilterController<H> {
    pub fn new(config: FilterConfig, host: H, storage: Arc<dyn FilterStorage>) -> Self {
        Self {
            config,
            host,
            storage,
            session: None,
            generation: 0,
            route: None,
            pending_repositories: Vec::new(),
            navigation: None,
        }
    }

    /// Begin the lifecycle for the page at `route`.
    pub fn start(&mut self, route: &str) -> Cmd {
        if self.navigation.is_none() {
            self.navigation = self.host.observe_navigation();
        }
        self.begin_route(route)
    }

    /// Drop the session and every host subscription.
    pub fn shutdown(&mut self) {
        self.teardown_session();
        if let Some(mut navigation) = self.navigation.take() {
            navigation.unsubscribe();
        }
        self.generation += 1;
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&FilterSession> {
        self.session.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn update(&mut self, msg: FilterMsg) -> Cmd {
        match msg {
            FilterMsg::InitDue { generation } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "ignoring stale init");
                    return Cmd::none();
                }
                if self.session.is_none() {
                    self.init_session();
                }
                Cmd::none()
            }
            FilterMsg::AttachObserverDue { generation } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "ignoring stale observer attach");
                    return Cmd::none();
                }
                self.attach_observer();
                Cmd::none()
            }
            FilterMsg::RowsChanged => {
                self.rows_changed();
                Cmd::none()
            }
            FilterMsg::Navigated(route) => {
                if self.route.as_deref() == Some(route.as_str()) {
                    if self.session.is_some() {
                        return Cmd::none();
                    }
                    debug!(route = %route, "filter not running on this route, retrying init");
                    return self.begin_route(&route);
                }
                info!(route = %route, "route changed, reinitializing filter");
                self.teardown_session();
                self.begin_route(&route)
            }
            FilterMsg::RepositoriesFetched(payload) => {
                self.repositories_fetched(&payload);
                Cmd::none()
            }
            FilterMsg::InputFocused => {
                if let Some(session) = self.session.as_mut() {
                    session.open_suggestions();
                }
                Cmd::none()
            }
            FilterMsg::InputChanged(text) => {
                if let Some(session) = self.session.as_mut() {
                    session.query = text;
                    if session.query.trim().is_empty() {
                        session.close_suggestions();
                    } else {
                        session.open_suggestions();
                    }
                }
                Cmd::none()
            }
            FilterMsg::SuggestionChosen(term) | FilterMsg::TermSubmitted(term) => {
                self.add_term(&term);
                Cmd::none()
            }
            FilterMsg::TermRemoved(term) => {
                let Some(session) = self.session.as_mut() else {
                    return Cmd::none();
                };
                if session.engine.remove_term(&term).changed() {
                    session.refresh_open_suggestions();
                    self.reapply();
                }
                Cmd::none()
            }
            FilterMsg::ClearRequested => {
                let Some(session) = self.session.as_mut() else {
                    return Cmd::none();
                };
                session.query.clear();
                session.close_suggestions();
                if session.engine.clear() {
                    self.reapply();
                }
                Cmd::none()
            }
            FilterMsg::PanelToggled => {
                if let Some(session) = self.session.as_mut() {
                    match session.panel {
                        PanelState::Collapsed => {
                            session.panel = PanelState::Expanded;
                            session.open_suggestions();
                        }
                        PanelState::Expanded => session.collapse(),
                    }
                }
                Cmd::none()
            }
            FilterMsg::OutsideClicked | FilterMsg::EscapePressed => {
                if let Some(session) = self.session.as_mut() {
                    session.collapse();
                }
                Cmd::none()
            }
        }
    }

    pub fn view(&self) -> FilterView {
        let Some(session) = self.session.as_ref() else {
            return FilterView {
                ready: false,
                summary: None,
                terms: Vec::new(),
                query: String::new(),
                suggestions: Vec::new(),
                suggestions_open: false,
                panel: PanelState::Collapsed,
                known_repositories: 0,
                last_evaluation: Evaluation::default(),
            };
        };
        FilterView {
            ready: true,
            summary: session.engine.summary(),
            terms: session.engine.terms().to_vec(),
            query: session.query.clone(),
            suggestions: session.suggestions.clone(),
            suggestions_open: session.suggestions_open,
            panel: session.panel,
            known_repositories: session.catalog.len(),
            last_evaluation: session.last_evaluation,
        }
    }

    fn begin_route(&mut self, route: &str) -> Cmd {
        self.route = Some(route.to_string());
        self.generation += 1;
        let generation = self.generation;
        debug!(route, generation, "scheduling filter init");
        Cmd::batch(vec![
            Cmd::after(self.config.init_delay(), FilterMsg::InitDue { generation }),
            Cmd::after(
                self.config.observer_delay(),
                FilterMsg::AttachObserverDue { generation },
            ),
        ])
    }

    fn teardown_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }

    fn init_session(&mut self) {
        info!("starting filter");
        let mut catalog = RepoCatalog::new(&self.config);
        catalog.bulk_seed(self.host.selector_labels());
        catalog.extend_discovered(&self.pending_repositories);
        info!(count = catalog.len(), "repositories found");

        if let Err(e) = self.host.mount_controls() {
            warn!(error = %e, "filter controls not mounted");
            return;
        }
        self.pending_repositories.clear();

        let mut engine = FilterEngine::new(self.storage.clone(), self.config.storage_key.as_str());
        engine.restore(&catalog);

        let mut session = FilterSession::new(catalog, engine);
        session.last_evaluation = Self::evaluate_rows(&mut self.host, &mut session);
        self.session = Some(session);
        info!("filter ready");
    }

    fn attach_observer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            debug!("no filter session, not observing rows");
            return;
        };
        if session.rows.is_some() {
            return;
        }
        match self.host.observe_rows() {
            Ok(subscription) => {
                session.rows = Some(subscription);
                info!("watching task list");
            }
            Err(e) => warn!(error = %e, "task list not observable"),
        }
    }

    fn rows_changed(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.engine.is_empty() {
            let catalog = &mut session.catalog;
            let mut discovered = 0;
            self.host.for_each_row(&mut |row: &mut dyn TaskRow| {
                if FilterEngine::discover_row(&*row, catalog) {
                    discovered += 1;
                }
            });
            if discovered > 0 {
                debug!(discovered, "repositories discovered on new rows");
                session.refresh_open_suggestions();
            }
        } else {
            let before = session.catalog.len();
            session.last_evaluation = Self::evaluate_rows(&mut self.host, session);
            if session.catalog.len() > before {
                session.refresh_open_suggestions();
            }
        }
    }

    fn repositories_fetched(&mut self, payload: &str) {
        if let Some(session) = self.session.as_mut() {
            match session.catalog.seed_from_api(payload) {
                Ok(added) if added > 0 => session.refresh_open_suggestions(),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "ignoring repository payload"),
            }
            return;
        }
        match RepositoryListing::from_json(payload) {
            Err(e) => warn!(error = %e, "ignoring repository payload"),
            Ok(listing) => {
                self.pending_repositories
                    .extend(listing.identifiers().map(str::to_string));
                debug!(
                    pending = self.pending_repositories.len(),
                    "repository payload queued until init"
                );
            }
        }
    }

    fn add_term(&mut self, raw: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let change = session.engine.add_term(raw, &session.catalog);
        session.query.clear();
        session.close_suggestions();
        match change {
            TermChange::Added(_) => self.reapply(),
            TermChange::Duplicate(existing) => debug!(term = %existing, "filter term already active"),
            _ => {}
        }
    }

    /// Re-evaluate every row after the active terms changed.
    fn reapply(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.last_evaluation = Self::evaluate_rows(&mut self.host, session);
            let summary = session.engine.summary();
            info!(
                filter = summary.as_deref().unwrap_or("all"),
                shown = session.last_evaluation.shown,
                hidden = session.last_evaluation.hidden,
                "filter applied"
            );
        }
    }

    fn evaluate_rows(host: &mut H, session: &mut FilterSession) -> Evaluation {
        let FilterSession {
            engine, catalog, ..
        } = session;
        let mut tally = Evaluation::default();
        host.for_each_row(&mut |row: &mut dyn TaskRow| {
            engine.apply_to_row(row, catalog, &mut tally);
        });
        debug!(
            shown = tally.shown,
            hidden = tally.hidden,
            unlabeled = tally.unlabeled,
            discovered = tally.discovered,
            "rows evaluated"
        );
        tally
    }
}

impl<H: HostPage> Drop for FilterController<H> {
    fn drop(&mut self) {
        self.teardown_session();
        if let Some(mut navigation) = self.navigation.take() {
            navigation.unsubscribe();
        }
    }
}
