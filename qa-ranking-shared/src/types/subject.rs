use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type QuestionId = Uuid;
pub type AnswerId = Uuid;
pub type UserId = Uuid;

/// The kind of item that can receive votes. Each kind has its own subject and
/// ledger tables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectKind {
    Question,
    Answer,
}

/// Reference to a votable subject: a question or an answer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectRef {
    Question(QuestionId),
    Answer(AnswerId),
}

impl SubjectRef {
    pub fn kind(&self) -> SubjectKind {
        match self {
            SubjectRef::Question(_) => SubjectKind::Question,
            SubjectRef::Answer(_) => SubjectKind::Answer,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            SubjectRef::Question(id) | SubjectRef::Answer(id) => *id,
        }
    }

    /// Rebuilds a reference from its stored kind and id.
    pub fn from_parts(kind: SubjectKind, id: Uuid) -> Self {
        match kind {
            SubjectKind::Question => SubjectRef::Question(id),
            SubjectKind::Answer => SubjectRef::Answer(id),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectRef::Question(id) => write!(f, "question:{id}"),
            SubjectRef::Answer(id) => write!(f, "answer:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_subject_ref_display() {
        let id = uuid!("a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5");
        assert_eq!(
            SubjectRef::Question(id).to_string(),
            "question:a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5"
        );
        assert_eq!(SubjectRef::from_parts(SubjectKind::Answer, id), SubjectRef::Answer(id));
    }
}
