//! Host page adapter seams.
//!
//! The controller never touches the DOM. A host adapter (browser content
//! script glue, a test fake, a headless replay) implements these traits and
//! forwards page events to [`crate::controller::FilterController::update`].

use crate::error::FilterError;

/// One rendered task in the host's task list.
pub trait TaskRow {
    /// Text of the row's secondary label spans, in document order.
    fn labels(&self) -> Vec<String>;

    /// Show or hide the row.
    fn set_visible(&mut self, visible: bool);

    /// Repository identifier shown on the row, if any.
    fn repository(&self) -> Option<String> {
        extract_repository(self.labels().iter().map(String::as_str))
    }
}

/// Handle for a live host subscription (row observer, route observer).
pub trait Subscription {
    fn unsubscribe(&mut self);
}

/// Capabilities the host page offers to the controller.
pub trait HostPage {
    /// Labels of the repository selector's options, in display order. Empty
    /// when the selector has not rendered.
    fn selector_labels(&self) -> Vec<String>;

    /// Insert the filter controls into the toolbar.
    ///
    /// Returns [`FilterError::NotFound`] when the toolbar is not rendered yet.
    fn mount_controls(&mut self) -> Result<(), FilterError>;

    /// Visit every task row currently rendered.
    fn for_each_row(&mut self, visit: &mut dyn FnMut(&mut dyn TaskRow));

    /// Start delivering `RowsChanged` when rows are added to the task list.
    ///
    /// Returns [`FilterError::NotFound`] when the list container is absent.
    fn observe_rows(&mut self) -> Result<Box<dyn Subscription>, FilterError>;

    /// Start delivering `Navigated` on route changes. Hosts without a route
    /// notification return `None`.
    fn observe_navigation(&mut self) -> Option<Box<dyn Subscription>> {
        None
    }
}

/// Pick the repository identifier out of a row's labels: the last non-empty
/// label containing `/`.
pub fn extract_repository<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<String> {
    labels
        .into_iter()
        .map(str::trim)
        .filter(|label| !label.is_empty() && label.contains('/'))
        .last()
        .map(str::to_string)
}
