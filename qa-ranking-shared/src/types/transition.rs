use serde::{Deserialize, Serialize};

use crate::types::{VoteState, VotesDelta};

/// Mutation applied to the vote ledger row of one `(subject, voter)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    Insert { is_upvote: bool },
    Flip { is_upvote: bool },
    Delete,
}

/// A decided vote transition.
///
/// Bundles the ledger mutation, the matching counter delta and the resulting
/// state so that a repository can commit all of them as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTransition {
    pub ledger_op: LedgerOp,
    pub delta: VotesDelta,
    pub next_state: VoteState,
}
