use crate::host::Context;
use crate::size::RequestedCapacity;

/// Outcome of the lifecycle gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
}

/// Decide whether a hook should touch the RAM disk at all.
///
/// Only the compute-node context acts, and only when a size was requested.
pub fn evaluate(context: Context, requested: RequestedCapacity) -> Decision {
    if context != Context::Remote || !requested.is_requested() {
        return Decision::Skip;
    }
    Decision::Proceed
}
