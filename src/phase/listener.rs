//! Phase listeners and their registry
//!
//! Listeners are notified synchronously, in registration order, each time
//! the scheduler enters a new phase. A failing listener is reported to a
//! [`DiagnosticSink`] and does not prevent the remaining listeners from
//! running.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::error::ListenerError;
use crate::observability::metrics;

use super::definition::Phase;

/// Observer of phase transitions.
///
/// Any `Fn(&Phase) -> Result<(), ListenerError>` closure is a listener.
pub trait PhaseListener: Send + Sync {
    /// Called when a new phase has been entered.
    ///
    /// # Errors
    ///
    /// Returning an error reports it to the scheduler's diagnostic sink; it is
    /// never propagated to the poller.
    fn on_phase_entered(&self, phase: &Phase) -> Result<(), ListenerError>;
}

impl<F> PhaseListener for F
where
    F: Fn(&Phase) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_phase_entered(&self, phase: &Phase) -> Result<(), ListenerError> {
        self(phase)
    }
}

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Destination for best-effort diagnostic text.
pub trait DiagnosticSink: Send + Sync {
    /// Records a diagnostic message.
    fn report(&self, message: &str);
}

/// `tracing` target used by [`TracingSink`].
pub const DIAGNOSTIC_TARGET: &str = "phaseclock::listener";

/// Sink forwarding diagnostics to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, message: &str) {
        warn!(target: DIAGNOSTIC_TARGET, "{message}");
    }
}

/// Sink writing one `[ERROR]: ...` line per diagnostic to a writer.
///
/// Write failures are dropped.
pub struct WriterSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    /// Creates a sink over the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Creates a sink over stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }
}

impl std::fmt::Debug for WriterSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

impl DiagnosticSink for WriterSink {
    fn report(&self, message: &str) {
        let mut w = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(w, "[ERROR]: {message}");
        let _ = w.flush();
    }
}

type Entry = (ListenerId, Arc<dyn PhaseListener>);

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Ordered, thread-safe collection of phase listeners.
///
/// Clones share the same registry, so a listener may capture a clone and
/// add or remove listeners (itself included) while being notified. Dispatch
/// runs against a snapshot taken before the first callback and the lock is
/// never held while a listener runs.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a closure at the end of the dispatch order.
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Phase) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add_shared(Arc::new(listener))
    }

    /// Registers a [`PhaseListener`] implementation.
    pub fn add_listener<L: PhaseListener + 'static>(&self, listener: L) -> ListenerId {
        self.add_shared(Arc::new(listener))
    }

    /// Registers an already shared listener.
    pub fn add_shared(&self, listener: Arc<dyn PhaseListener>) -> ListenerId {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push((id, listener));
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|(entry_id, _)| *entry_id != id);
        inner.entries.len() != before
    }

    /// Removes all listeners.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.lock().entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    fn snapshot(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    /// Notifies every listener registered at call time that `phase` was
    /// entered.
    ///
    /// Returns the number of listeners that failed.
    pub fn dispatch(&self, phase: &Phase, sink: &dyn DiagnosticSink) -> usize {
        let mut failures = 0;
        for (id, listener) in self.snapshot() {
            if let Err(err) = listener.on_phase_entered(phase) {
                failures += 1;
                metrics::record_listener_failure(phase.name());
                sink.report(&format!(
                    "Failed to call listener {id} for phase '{phase}': {err}"
                ));
            }
        }
        failures
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
