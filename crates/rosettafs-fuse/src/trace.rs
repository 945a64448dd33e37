//! Entry/exit tracing around every filesystem call.

use std::fmt::Debug;

use rosettafs_config::logging::Component;
use tracing::Span;

/// Longest argument or result representation written to the log
pub const DEFAULT_REPR_LIMIT: usize = 256;

/// Logging handle injected into the driver.
///
/// Events are emitted inside `span`, so the subscriber installed at startup
/// decides verbosity; the tracer itself holds no global state.
#[derive(Debug, Clone)]
pub struct CallTracer {
    span: Span,
    limit: usize,
}

impl CallTracer {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            limit: DEFAULT_REPR_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// A tracer whose events go nowhere
    pub fn disabled() -> Self {
        Self::new(Span::none())
    }

    /// Run `f` on `args`, logging `op` and `args` on entry and the outcome
    /// on exit.
    ///
    /// The result of `f` is returned untouched, errors included.
    pub fn call<A, T, E, F>(&self, op: &str, args: A, f: F) -> Result<T, E>
    where
        A: Debug,
        T: Debug,
        E: Debug,
        F: FnOnce(A) -> Result<T, E>,
    {
        let _enter = self.span.enter();
        tracing::debug!(component = Component::FS, "-> {} {}", op, self.repr(&args));

        let ret = f(args);
        match &ret {
            Ok(v) => tracing::debug!(component = Component::FS, "<- {} {}", op, self.repr(v)),
            Err(e) => tracing::debug!(component = Component::FS, "<- {} [error] {}", op, self.repr(e)),
        }
        ret
    }

    /// Debug representation clipped to `limit` characters plus `...`
    pub fn repr(&self, value: &dyn Debug) -> String {
        truncate(format!("{value:?}"), self.limit)
    }
}

pub(crate) fn truncate(mut s: String, limit: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(limit) {
        s.truncate(idx);
        s.push_str("...");
    }
    s
}

/// Debug adapter printing a byte buffer as its length only
pub struct ByteLen<'a>(pub &'a [u8]);

impl Debug for ByteLen<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} bytes>", self.0.len())
    }
}
