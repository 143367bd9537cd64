use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Identity of the virtual user driving a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VuState {
    /// Virtual-user id, unique within the run.
    pub vu: u64,

    /// Iteration of the virtual user's script.
    pub iteration: u64,

    /// Name of the scenario the virtual user belongs to.
    pub scenario: String,
}

/// Per-call context supplied by the host.
///
/// The default context carries no call-scoped state (the host's init phase)
/// and cannot be used to publish.
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
    state: Option<VuState>,
}

impl ExecutionContext {
    /// A context with no call-scoped state.
    #[must_use]
    pub fn init() -> Self {
        Self::default()
    }

    /// A context for one iteration of a virtual user.
    #[must_use]
    pub fn new(state: VuState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Ties the context to a host-owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The call-scoped state, if any.
    #[must_use]
    pub const fn state(&self) -> Option<&VuState> {
        self.state.as_ref()
    }

    /// The cancellation token observed by calls made with this context.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn interruption(&self) -> Option<Interrupt> {
        if self.cancellation.is_cancelled() {
            Some(Interrupt::Cancelled)
        } else if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            Some(Interrupt::TimedOut)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub(crate) async fn interrupted(&self) -> Interrupt {
        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Interrupt::Cancelled,
            () = deadline => Interrupt::TimedOut,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Cancelled,
    TimedOut,
}
