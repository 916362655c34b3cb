//! Logging hooks for the suppression passes.
//!
//! Each pass opens one span and reports its counts in a closing event.
//! Rejected inputs are logged at warn level next to the returned error.
//! Without the `tracing` feature every macro expands to a no-op; event
//! fields are still evaluated once.

/// Span around one pass, e.g. `trace_span!("commit_peaks", candidates = n)`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::PassSpan
    };
}

/// Counts reported when a pass or a build step finishes.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        $crate::trace::discard(($($value,)+))
    };
}

/// Input rejected before any pass ran.
#[cfg(feature = "tracing")]
macro_rules! trace_reject {
    ($error:expr) => {
        tracing::warn!(name: "inputs_rejected", error = %$error)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_reject {
    ($error:expr) => {
        $crate::trace::discard(&$error)
    };
}

pub(crate) use trace_event;
pub(crate) use trace_reject;
pub(crate) use trace_span;

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn discard<T>(_fields: T) {}

/// Span guard used when the `tracing` feature is off.
#[cfg(not(feature = "tracing"))]
pub struct PassSpan;

#[cfg(not(feature = "tracing"))]
impl PassSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
