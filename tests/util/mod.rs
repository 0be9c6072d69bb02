use bettercodex::{FilterError, HostPage, Subscription, TaskRow};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collects formatted log lines emitted while installed.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || capture.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn assert_logged(&self, needle: &str) {
        let out = String::from_utf8_lossy(&self.0.lock()).into_owned();
        assert!(out.contains(needle), "no log line with `{needle}` in:\n{out}");
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A rendered task row.
#[derive(Debug, Clone)]
pub struct FakeRow {
    pub labels: Vec<String>,
    pub visible: bool,
}

#[allow(dead_code)]
impl FakeRow {
    /// Row whose label spans are a timestamp and `repository`.
    pub fn repo(repository: &str) -> Self {
        Self {
            labels: vec!["2h ago".into(), repository.into()],
            visible: true,
        }
    }

    /// Row without any repository label (e.g. an ask-mode task).
    pub fn unlabeled() -> Self {
        Self {
            labels: vec!["2h ago".into()],
            visible: true,
        }
    }
}

impl TaskRow for FakeRow {
    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Subscription that tracks how many of its kind are live.
pub struct FakeSubscription {
    live: Arc<AtomicUsize>,
    active: bool,
}

impl FakeSubscription {
    fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            live: live.clone(),
            active: true,
        }
    }
}

impl Subscription for FakeSubscription {
    fn unsubscribe(&mut self) {
        if self.active {
            self.active = false;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// In-memory stand-in for the Codex task page.
#[derive(Debug, Default)]
pub struct FakePage {
    pub selector: Vec<String>,
    pub rows: Vec<FakeRow>,
    pub toolbar_present: bool,
    pub list_present: bool,
    pub mounts: usize,
    pub row_observers: Arc<AtomicUsize>,
    pub navigation_observers: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakePage {
    /// Page with a rendered toolbar and task list. The selector lists the
    /// given repositories behind the usual section header and action entry.
    pub fn with_repositories(repositories: &[&str]) -> Self {
        let mut selector = vec!["Repositories".to_string()];
        selector.extend(repositories.iter().map(|repo| repo.to_string()));
        selector.push("Manage repositories".to_string());
        Self {
            selector,
            toolbar_present: true,
            list_present: true,
            ..Self::default()
        }
    }

    pub fn push_rows(&mut self, repositories: &[&str]) {
        self.rows
            .extend(repositories.iter().map(|repo| FakeRow::repo(repo)));
    }

    pub fn visibility(&self) -> Vec<bool> {
        self.rows.iter().map(|row| row.visible).collect()
    }

    pub fn visible_repositories(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| row.visible)
            .filter_map(|row| row.repository())
            .collect()
    }

    pub fn live_row_observers(&self) -> usize {
        self.row_observers.load(Ordering::SeqCst)
    }

    pub fn live_navigation_observers(&self) -> usize {
        self.navigation_observers.load(Ordering::SeqCst)
    }
}

impl HostPage for FakePage {
    fn selector_labels(&self) -> Vec<String> {
        self.selector.clone()
    }

    fn mount_controls(&mut self) -> Result<(), FilterError> {
        if !self.toolbar_present {
            return Err(FilterError::NotFound("tab bar"));
        }
        self.mounts += 1;
        Ok(())
    }

    fn for_each_row(&mut self, visit: &mut dyn FnMut(&mut dyn TaskRow)) {
        for row in &mut self.rows {
            visit(row);
        }
    }

    fn observe_rows(&mut self) -> Result<Box<dyn Subscription>, FilterError> {
        if !self.list_present {
            return Err(FilterError::NotFound("task list"));
        }
        Ok(Box::new(FakeSubscription::new(&self.row_observers)))
    }

    fn observe_navigation(&mut self) -> Option<Box<dyn Subscription>> {
        Some(Box::new(FakeSubscription::new(&self.navigation_observers)))
    }
}
