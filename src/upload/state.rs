use crate::types::RequestId;

use std::fmt::{self, Display, Formatter};

/// The phase an upload request is in.
///
/// ```text
/// Decoding -> Uploading -> Persisting -> Done
///    |            |            |
///    |            +------------+--> Compensating -> Failed
///    +--> Failed
/// ```
///
/// A request ends in `Done` or `Failed`; there are no transitions out of
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Splitting and classifying the body.
    Decoding,
    /// Storing every file of the form, concurrently.
    Uploading,
    /// Writing the metadata record.
    Persisting,
    /// Removing the files that were stored before a failure.
    Compensating,
    /// The record was written.
    Done,
    /// Nothing of the request remains, except assets whose removal failed.
    Failed,
}

impl Phase {
    /// Whether the request can move from this phase to `next`.
    pub fn can_advance(self, next: Phase) -> bool {
        use Phase::*;

        matches!(
            (self, next),
            (Decoding, Uploading)
                | (Decoding, Failed)
                | (Uploading, Persisting)
                | (Uploading, Compensating)
                | (Persisting, Done)
                | (Persisting, Compensating)
                | (Compensating, Failed)
        )
    }

    /// Whether the request has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoding => write!(f, "decoding"),
            Self::Uploading => write!(f, "uploading"),
            Self::Persisting => write!(f, "persisting"),
            Self::Compensating => write!(f, "compensating"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Tracks the phase of one request and logs each transition.
#[derive(Debug)]
pub(crate) struct Progress {
    request: RequestId,
    phase: Phase,
}

impl Progress {
    pub(crate) fn new(request: RequestId) -> Self {
        trace!(%request, phase = %Phase::Decoding, "new upload request");
        Self {
            request,
            phase: Phase::Decoding,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance(next),
            "invalid transition {} -> {next}",
            self.phase
        );
        debug!(request = %self.request, from = %self.phase, to = %next, "upload phase");
        self.phase = next;
    }
}
