//! An observer that keeps every change event it hears.
//!
//! Clones share one log, so a test can install one clone on an attribute set
//! and inspect the other.
//!
//! # Examples
//!
//! ```
//! use node_attrs::{Attributes, KeyPath, Precedence};
//! use node_attrs_test_helpers::RecordingObserver;
//!
//! let recorder = RecordingObserver::default();
//! let mut attrs = Attributes::new();
//! attrs.set_observer(recorder.clone());
//! attrs.write(Precedence::Normal, &KeyPath::from(["a"]), 1)?;
//! assert_eq!(recorder.paths(), ["a"]);
//! # Ok::<_, node_attrs::AttributeError>(())
//! ```

use std::sync::Arc;

use node_attrs::{AttributeObserver, ChangeEvent, Precedence};
use parking_lot::Mutex;

/// Records change events in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingObserver {
    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    /// Dotted paths of the recorded events.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| event.path.to_string())
            .collect()
    }

    /// Layers the recorded events were written to.
    #[must_use]
    pub fn layers(&self) -> Vec<Precedence> {
        self.events.lock().iter().map(|event| event.precedence).collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain the log, returning what it held.
    pub fn take(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl AttributeObserver for RecordingObserver {
    fn attribute_changed(&self, event: &ChangeEvent) {
        self.events.lock().push(event.clone());
    }
}
