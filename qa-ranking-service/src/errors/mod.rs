mod voting;

pub use voting::VotingError;
