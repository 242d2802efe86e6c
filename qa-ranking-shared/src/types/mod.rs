mod aggregates;
mod subject;
mod transition;
mod trending;
mod vote;
mod votes_count;

pub use aggregates::{AnswerAggregates, QuestionAggregates};
pub use subject::{AnswerId, QuestionId, SubjectKind, SubjectRef, UserId};
pub use transition::{LedgerOp, VoteTransition};
pub use trending::{TrendingEntry, TrendingPage, TrendingSignals};
pub use vote::{Vote, VoteIntent, VoteRejection, VoteState};
pub use votes_count::{CounterRepair, VoteOutcome, VotesCount, VotesDelta};
