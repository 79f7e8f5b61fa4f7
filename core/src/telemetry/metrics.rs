use std::sync::Mutex;

/// Counts submissions over the lifetime of a session.
#[derive(Debug)]
pub struct SessionMetrics {
    inner: Mutex<Counters>,
}

#[derive(Debug)]
struct Counters {
    uploads: usize,
    failures: usize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counters {
                uploads: 0,
                failures: 0,
            }),
        }
    }

    pub fn record_upload(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.uploads += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.failures += 1;
        }
    }

    /// `(uploads, failures)` so far.
    pub fn snapshot(&self) -> (usize, usize) {
        if let Ok(counters) = self.inner.lock() {
            (counters.uploads, counters.failures)
        } else {
            (0, 0)
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
