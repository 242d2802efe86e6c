use qa_ranking_shared::types::{
    LedgerOp, VoteIntent, VoteRejection, VoteState, VoteTransition, VotesDelta,
};

/// Decides the ledger mutation, counter delta and resulting state for a voter
/// holding `current` who asks for `intent`.
///
/// Asking for the state already held is a `DuplicateVote`; removing a vote
/// that does not exist is a `NoExistingVote`. Neither changes anything.
pub fn plan_transition(
    current: VoteState,
    intent: VoteIntent,
) -> Result<VoteTransition, VoteRejection> {
    let (ledger_op, (upvotes, downvotes), next_state) = match (current, intent) {
        (VoteState::NoVote, VoteIntent::Upvote) => {
            (LedgerOp::Insert { is_upvote: true }, (1, 0), VoteState::Upvoted)
        }
        (VoteState::NoVote, VoteIntent::Downvote) => {
            (LedgerOp::Insert { is_upvote: false }, (0, 1), VoteState::Downvoted)
        }
        (VoteState::Upvoted, VoteIntent::Downvote) => {
            (LedgerOp::Flip { is_upvote: false }, (-1, 1), VoteState::Downvoted)
        }
        (VoteState::Downvoted, VoteIntent::Upvote) => {
            (LedgerOp::Flip { is_upvote: true }, (1, -1), VoteState::Upvoted)
        }
        (VoteState::Upvoted, VoteIntent::RemoveVote) => {
            (LedgerOp::Delete, (-1, 0), VoteState::NoVote)
        }
        (VoteState::Downvoted, VoteIntent::RemoveVote) => {
            (LedgerOp::Delete, (0, -1), VoteState::NoVote)
        }
        (VoteState::NoVote, VoteIntent::RemoveVote) => {
            return Err(VoteRejection::NoExistingVote);
        }
        (VoteState::Upvoted, VoteIntent::Upvote) | (VoteState::Downvoted, VoteIntent::Downvote) => {
            return Err(VoteRejection::DuplicateVote);
        }
    };

    Ok(VoteTransition {
        ledger_op,
        delta: VotesDelta::new(upvotes, downvotes),
        next_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(current: VoteState, intent: VoteIntent) -> (i32, i32) {
        let transition = plan_transition(current, intent).unwrap();
        (transition.delta.upvotes, transition.delta.downvotes)
    }

    #[test]
    fn test_first_votes_insert() {
        let up = plan_transition(VoteState::NoVote, VoteIntent::Upvote).unwrap();
        assert_eq!(up.ledger_op, LedgerOp::Insert { is_upvote: true });
        assert_eq!(up.next_state, VoteState::Upvoted);
        assert_eq!(delta(VoteState::NoVote, VoteIntent::Upvote), (1, 0));

        let down = plan_transition(VoteState::NoVote, VoteIntent::Downvote).unwrap();
        assert_eq!(down.ledger_op, LedgerOp::Insert { is_upvote: false });
        assert_eq!(delta(VoteState::NoVote, VoteIntent::Downvote), (0, 1));
    }

    #[test]
    fn test_switches_flip_in_place() {
        let to_down = plan_transition(VoteState::Upvoted, VoteIntent::Downvote).unwrap();
        assert_eq!(to_down.ledger_op, LedgerOp::Flip { is_upvote: false });
        assert_eq!(to_down.next_state, VoteState::Downvoted);
        assert_eq!(delta(VoteState::Upvoted, VoteIntent::Downvote), (-1, 1));

        let to_up = plan_transition(VoteState::Downvoted, VoteIntent::Upvote).unwrap();
        assert_eq!(to_up.ledger_op, LedgerOp::Flip { is_upvote: true });
        assert_eq!(delta(VoteState::Downvoted, VoteIntent::Upvote), (1, -1));
    }

    #[test]
    fn test_removals_delete() {
        let removed = plan_transition(VoteState::Upvoted, VoteIntent::RemoveVote).unwrap();
        assert_eq!(removed.ledger_op, LedgerOp::Delete);
        assert_eq!(removed.next_state, VoteState::NoVote);
        assert_eq!(delta(VoteState::Upvoted, VoteIntent::RemoveVote), (-1, 0));
        assert_eq!(delta(VoteState::Downvoted, VoteIntent::RemoveVote), (0, -1));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            plan_transition(VoteState::Upvoted, VoteIntent::Upvote),
            Err(VoteRejection::DuplicateVote)
        );
        assert_eq!(
            plan_transition(VoteState::Downvoted, VoteIntent::Downvote),
            Err(VoteRejection::DuplicateVote)
        );
        assert_eq!(
            plan_transition(VoteState::NoVote, VoteIntent::RemoveVote),
            Err(VoteRejection::NoExistingVote)
        );
    }

    #[test]
    fn test_every_transition_keeps_counts_consistent_with_states() {
        let states = [VoteState::NoVote, VoteState::Upvoted, VoteState::Downvoted];
        let intents = [VoteIntent::Upvote, VoteIntent::Downvote, VoteIntent::RemoveVote];
        let weight = |state: VoteState| match state {
            VoteState::NoVote => (0, 0),
            VoteState::Upvoted => (1, 0),
            VoteState::Downvoted => (0, 1),
        };

        for current in states {
            for intent in intents {
                if let Ok(transition) = plan_transition(current, intent) {
                    let (up_before, down_before) = weight(current);
                    let (up_after, down_after) = weight(transition.next_state);
                    assert_eq!(transition.delta.upvotes, up_after - up_before);
                    assert_eq!(transition.delta.downvotes, down_after - down_before);
                }
            }
        }
    }
}
