//! Caller-supplied gate for destructive operations

use bridge_traits::remote::RemoteObject;

/// Verdict for one deletion candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
    /// Stop the whole operation; nothing further is deleted
    Abort,
}

/// Decides whether a candidate may be deleted.
///
/// Interactive front ends implement this with a prompt; the core never
/// blocks on user input itself.
pub trait ConfirmationPolicy: Send + Sync {
    fn decide(&self, candidate: &RemoteObject) -> Decision;
}

/// Approves every candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysProceed;

impl ConfirmationPolicy for AlwaysProceed {
    fn decide(&self, _candidate: &RemoteObject) -> Decision {
        Decision::Proceed
    }
}

/// Approves candidates matching a predicate, skips the rest
pub struct ProceedIf<F>(pub F);

impl<F> ConfirmationPolicy for ProceedIf<F>
where
    F: Fn(&RemoteObject) -> bool + Send + Sync,
{
    fn decide(&self, candidate: &RemoteObject) -> Decision {
        if (self.0)(candidate) {
            Decision::Proceed
        } else {
            Decision::Skip
        }
    }
}
