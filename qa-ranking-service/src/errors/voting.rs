//! Error types returned by the ranking service.
use qa_ranking_repository::VotesRepositoryError;
use qa_ranking_shared::types::{SubjectRef, VoteRejection, VotesDelta};
use thiserror::Error;

/// Represents errors that can occur while voting, accepting answers or ranking.
#[derive(Debug, Error)]
pub enum VotingError {
    #[error("Duplicate vote: the voter already holds this vote")]
    DuplicateVote,

    #[error("No existing vote to remove")]
    NoExistingVote,

    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectRef),

    #[error("Counter underflow on {subject}: delta {delta:?}")]
    CounterUnderflow { subject: SubjectRef, delta: VotesDelta },

    #[error("Storage contention persisted after {attempts} attempts")]
    Transient { attempts: u32 },

    #[error("Repository error: {0}")]
    Repository(VotesRepositoryError),
}

impl VotingError {
    /// Rejections caused by the voter's current state, reported as HTTP 409 upstream.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateVote | Self::NoExistingVote)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SubjectNotFound(_))
    }
}

impl From<VoteRejection> for VotingError {
    fn from(rejection: VoteRejection) -> Self {
        match rejection {
            VoteRejection::DuplicateVote => Self::DuplicateVote,
            VoteRejection::NoExistingVote => Self::NoExistingVote,
        }
    }
}

impl From<VotesRepositoryError> for VotingError {
    fn from(err: VotesRepositoryError) -> Self {
        match err {
            VotesRepositoryError::Rejected(rejection) => rejection.into(),
            VotesRepositoryError::SubjectNotFound(subject) => Self::SubjectNotFound(subject),
            VotesRepositoryError::CounterUnderflow { subject, delta } => {
                Self::CounterUnderflow { subject, delta }
            }
            other => Self::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_rejections_map_to_conflicts() {
        let err: VotingError = VotesRepositoryError::Rejected(VoteRejection::DuplicateVote).into();
        assert!(matches!(err, VotingError::DuplicateVote));
        assert!(err.is_conflict());

        let err: VotingError = VotesRepositoryError::Rejected(VoteRejection::NoExistingVote).into();
        assert!(matches!(err, VotingError::NoExistingVote));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_missing_subject_maps_to_not_found() {
        let subject = SubjectRef::Answer(Uuid::new_v4());
        let err: VotingError = VotesRepositoryError::SubjectNotFound(subject).into();
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_storage_errors_are_wrapped() {
        let err: VotingError = VotesRepositoryError::Conflict("busy".to_string()).into();
        assert!(matches!(err, VotingError::Repository(_)));
    }
}
