//! Deprecation signals for legacy read paths.
//!
//! A [`Deprecations`] port remembers which tags it has already reported and
//! forwards only the first use of each tag to its [`DeprecationSink`]. The set
//! of warned tags only grows. Emission is advisory: it never fails and never
//! blocks the caller beyond a set insert.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use dashmap::DashSet;

/// A deprecated code path, identified by a stable tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deprecation {
    pub tag: &'static str,
    pub message: &'static str,
}

/// camelCase aliases on auto moderation trigger/action metadata.
pub const AUTOMOD_CAMEL_CASE_META: Deprecation = Deprecation {
    tag: "AUTOMOD_CAMEL_CASE_META",
    message: "camelCase auto moderation metadata accessors are deprecated; \
              read the snake_case keys instead",
};

/// Receiver of deprecation signals.
pub trait DeprecationSink: Send + Sync {
    fn emit(&self, deprecation: &Deprecation);
}

/// Default sink: one `warn` event under the `wsbridge::deprecation` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DeprecationSink for TracingSink {
    fn emit(&self, deprecation: &Deprecation) {
        tracing::warn!(
            target: "wsbridge::deprecation",
            tag = deprecation.tag,
            "{}",
            deprecation.message
        );
    }
}

/// Deprecation port: warned-tag set plus the sink it reports to.
pub struct Deprecations {
    warned: DashSet<&'static str>,
    sink: RwLock<Arc<dyn DeprecationSink>>,
    enabled: AtomicBool,
}

impl Default for Deprecations {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Deprecations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deprecations")
            .field("warned", &self.warned.len())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

static GLOBAL: OnceLock<Arc<Deprecations>> = OnceLock::new();

impl Deprecations {
    /// New port reporting through [`TracingSink`].
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn DeprecationSink>) -> Self {
        Self {
            warned: DashSet::new(),
            sink: RwLock::new(sink),
            enabled: AtomicBool::new(true),
        }
    }

    /// Process-wide port used when no port is injected.
    pub fn global() -> Arc<Deprecations> {
        GLOBAL.get_or_init(|| Arc::new(Deprecations::new())).clone()
    }

    /// Replace the sink of the process-wide port.
    pub fn set_global_sink(sink: Arc<dyn DeprecationSink>) {
        Self::global().set_sink(sink);
    }

    pub fn set_sink(&self, sink: Arc<dyn DeprecationSink>) {
        match self.sink.write() {
            Ok(mut g) => *g = sink,
            Err(poisoned) => *poisoned.into_inner() = sink,
        }
    }

    /// Disabled ports drop every signal without recording it.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Report a deprecated path. Returns `true` when the sink was invoked,
    /// i.e. this is the first report of the tag on this port.
    pub fn emit(&self, deprecation: &Deprecation) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if !self.warned.insert(deprecation.tag) {
            return false;
        }
        let sink = match self.sink.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        sink.emit(deprecation);
        true
    }

    pub fn has_warned(&self, tag: &str) -> bool {
        self.warned.contains(tag)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl DeprecationSink for Recorder {
        fn emit(&self, deprecation: &Deprecation) {
            if let Ok(mut v) = self.0.lock() {
                v.push(deprecation.tag);
            }
        }
    }

    const OTHER: Deprecation = Deprecation {
        tag: "OTHER",
        message: "other",
    };

    #[test]
    fn emits_once_per_tag() {
        let rec = Arc::new(Recorder::default());
        let port = Deprecations::with_sink(rec.clone());

        assert!(port.emit(&AUTOMOD_CAMEL_CASE_META));
        assert!(!port.emit(&AUTOMOD_CAMEL_CASE_META));
        assert!(port.emit(&OTHER));
        assert!(!port.emit(&OTHER));

        assert_eq!(
            *rec.0.lock().unwrap(),
            vec!["AUTOMOD_CAMEL_CASE_META", "OTHER"]
        );
        assert!(port.has_warned("OTHER"));
    }

    #[test]
    fn disabled_port_records_nothing() {
        let rec = Arc::new(Recorder::default());
        let port = Deprecations::with_sink(rec.clone());
        port.set_enabled(false);

        assert!(!port.emit(&AUTOMOD_CAMEL_CASE_META));
        assert!(!port.has_warned(AUTOMOD_CAMEL_CASE_META.tag));

        port.set_enabled(true);
        assert!(port.emit(&AUTOMOD_CAMEL_CASE_META));
        assert_eq!(rec.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn replaced_sink_receives_later_signals() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let port = Deprecations::with_sink(first.clone());

        port.emit(&OTHER);
        port.set_sink(second.clone());
        port.emit(&AUTOMOD_CAMEL_CASE_META);

        assert_eq!(*first.0.lock().unwrap(), vec!["OTHER"]);
        assert_eq!(*second.0.lock().unwrap(), vec!["AUTOMOD_CAMEL_CASE_META"]);
    }
}
