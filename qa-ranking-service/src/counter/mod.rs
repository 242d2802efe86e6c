//! The aggregate counter maintainer: the vote transition table and the
//! retrying unit of work that commits a transition.
mod maintainer;
mod transition;

pub use maintainer::CounterMaintainer;
pub use transition::plan_transition;
