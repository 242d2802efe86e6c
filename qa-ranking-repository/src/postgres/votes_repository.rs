//! PostgreSQL implementation of the votes repository.
//!
//! Provides a PostgreSQL backend for the `VotesRepository` trait with connection
//! pooling and one transaction per unit of work.
//!
//! ## Key Features
//!
//! - Per-pair critical sections with `pg_advisory_xact_lock`
//! - Counter changes as signed deltas in a single guarded `UPDATE ... RETURNING`
//! - Row locks always taken question first, then answer
//! - Trending score, ordering and paging computed in SQL
//! - Embedded migrations with `sqlx::migrate!`
//!
//! ## Database Tables
//!
//! - `questions`, `answers`: subjects and their denormalized aggregates
//! - `question_votes`, `answer_votes`: the vote ledger, one row per (subject, voter)
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qa_ranking_shared::ranking::{
    AGE_OFFSET_HOURS, ANSWER_WEIGHT, BOOKMARK_WEIGHT, BOUNTY_WEIGHT, COMMENT_WEIGHT,
    FOLLOW_WEIGHT, GRAVITY, SHARE_WEIGHT, UNANSWERED_BONUS, UPVOTE_WEIGHT, VIEW_WEIGHT,
    display_score,
};
use qa_ranking_shared::types::{
    AnswerAggregates, AnswerId, CounterRepair, LedgerOp, QuestionAggregates, QuestionId,
    SubjectKind, SubjectRef, TrendingEntry, TrendingPage, UserId, Vote, VoteOutcome, VotesCount,
    VotesDelta,
};
use tracing::debug;
use uuid::Uuid;

use crate::{TransitionPlanner, VotesRepository, VotesRepositoryError};

/// Answers per question, joined as `ac` on `ac.question_id = q.id`.
const ANSWER_COUNTS_JOIN: &str = r#"
    LEFT JOIN (
        SELECT question_id, COUNT(*) AS answer_count
        FROM answers
        GROUP BY question_id
    ) ac ON ac.question_id = q.id
"#;

/// Table layout backing one subject kind.
struct SubjectTables {
    subjects: &'static str,
    votes: &'static str,
    vote_key: &'static str,
    parent_expr: &'static str,
}

impl SubjectTables {
    fn of(kind: SubjectKind) -> Self {
        match kind {
            SubjectKind::Question => Self {
                subjects: "questions",
                votes: "question_votes",
                vote_key: "question_id",
                parent_expr: "NULL::uuid",
            },
            SubjectKind::Answer => Self {
                subjects: "answers",
                votes: "answer_votes",
                vote_key: "answer_id",
                parent_expr: "question_id",
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    upvote_count: i64,
    downvote_count: i64,
    comment_count: i64,
    answer_count: i64,
    view_count: i64,
    follow_count: i64,
    bookmark_count: i64,
    share_count: i64,
    bounty_amount: i64,
    has_accepted_answer: bool,
    is_closed: bool,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl From<QuestionRow> for QuestionAggregates {
    fn from(row: QuestionRow) -> Self {
        QuestionAggregates {
            id: row.id,
            upvote_count: row.upvote_count,
            downvote_count: row.downvote_count,
            comment_count: row.comment_count,
            answer_count: row.answer_count,
            view_count: row.view_count,
            follow_count: row.follow_count,
            bookmark_count: row.bookmark_count,
            share_count: row.share_count,
            bounty_amount: row.bounty_amount,
            has_accepted_answer: row.has_accepted_answer,
            is_closed: row.is_closed,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    id: Uuid,
    question_id: Uuid,
    upvote_count: i64,
    downvote_count: i64,
    comment_count: i64,
    is_accepted: bool,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl From<AnswerRow> for AnswerAggregates {
    fn from(row: AnswerRow) -> Self {
        AnswerAggregates {
            id: row.id,
            question_id: row.question_id,
            upvote_count: row.upvote_count,
            downvote_count: row.downvote_count,
            comment_count: row.comment_count,
            is_accepted: row.is_accepted,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DriftRow {
    id: Uuid,
    question_id: Uuid,
}

/// PostgreSQL implementation of the votes repository.
pub struct PostgresVotesRepository {
    pool: sqlx::PgPool,
}

impl PostgresVotesRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, VotesRepositoryError> {
        Ok(Self { pool })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), VotesRepositoryError> {
        sqlx::migrate!("src/postgres/migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Takes the transaction-scoped advisory lock of a `(subject, voter)` pair.
    ///
    /// Held until commit or rollback; writers of other pairs are not blocked.
    async fn lock_vote_pair_tx(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), VotesRepositoryError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("vote:{subject}:{voter_id}"))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Locks a question row against other writers until the transaction ends.
    ///
    /// Every unit of work that writes a question or any of its answers takes
    /// this lock before touching an answer row, so row locks are always
    /// acquired question first.
    async fn lock_question_tx(
        &self,
        question_id: QuestionId,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), VotesRepositoryError> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM questions WHERE id = $1 FOR NO KEY UPDATE")
            .bind(question_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )))?;
        Ok(())
    }

    /// Reads the question an answer belongs to, without locking the answer.
    async fn parent_question_tx(
        &self,
        answer_id: AnswerId,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<QuestionId, VotesRepositoryError> {
        sqlx::query_scalar::<_, Uuid>("SELECT question_id FROM answers WHERE id = $1")
            .bind(answer_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(
                answer_id,
            )))
    }

    /// Locks the question that owns `subject`: the subject itself, or the
    /// parent of an answer.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(question_id))` - The locked parent when the subject is an answer
    /// * `Ok(None)` - The subject is a question and is now locked
    async fn lock_owning_question_tx(
        &self,
        subject: SubjectRef,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<QuestionId>, VotesRepositoryError> {
        match subject {
            SubjectRef::Question(question_id) => {
                self.lock_question_tx(question_id, tx).await?;
                Ok(None)
            }
            SubjectRef::Answer(answer_id) => {
                let question_id = self.parent_question_tx(answer_id, tx).await?;
                self.lock_question_tx(question_id, tx).await?;
                Ok(Some(question_id))
            }
        }
    }

    /// Checks that the subject exists and pins it against deletion for the rest
    /// of the transaction.
    ///
    /// `FOR KEY SHARE` does not conflict with the counter `UPDATE`s of other voters.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(question_id))` - The parent question when the subject is an answer
    /// * `Ok(None)` - The subject is a question
    async fn pin_subject_tx(
        &self,
        subject: SubjectRef,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<QuestionId>, VotesRepositoryError> {
        let tables = SubjectTables::of(subject.kind());
        let sql = format!(
            "SELECT {parent} FROM {subjects} WHERE id = $1 FOR KEY SHARE",
            parent = tables.parent_expr,
            subjects = tables.subjects,
        );
        sqlx::query_scalar::<_, Option<Uuid>>(&sql)
            .bind(subject.id())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(subject))
    }

    async fn get_vote_tx(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<Vote>, VotesRepositoryError> {
        let tables = SubjectTables::of(subject.kind());
        let sql = format!(
            "SELECT is_upvote, created_at FROM {votes} WHERE {key} = $1 AND user_id = $2",
            votes = tables.votes,
            key = tables.vote_key,
        );
        let row = sqlx::query_as::<_, (bool, DateTime<Utc>)>(&sql)
            .bind(subject.id())
            .bind(voter_id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|(is_upvote, created_at)| Vote {
            subject,
            voter_id,
            is_upvote,
            created_at,
        }))
    }

    /// Applies a ledger mutation within an active transaction.
    async fn apply_ledger_op_tx(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        op: LedgerOp,
        now: DateTime<Utc>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), VotesRepositoryError> {
        let tables = SubjectTables::of(subject.kind());
        let result = match op {
            LedgerOp::Insert { is_upvote } => {
                let sql = format!(
                    "INSERT INTO {votes} ({key}, user_id, is_upvote, created_at) VALUES ($1, $2, $3, $4)",
                    votes = tables.votes,
                    key = tables.vote_key,
                );
                sqlx::query(&sql)
                    .bind(subject.id())
                    .bind(voter_id)
                    .bind(is_upvote)
                    .bind(now)
                    .execute(&mut **tx)
                    .await?
            }
            LedgerOp::Flip { is_upvote } => {
                let sql = format!(
                    "UPDATE {votes} SET is_upvote = $3, created_at = $4 WHERE {key} = $1 AND user_id = $2",
                    votes = tables.votes,
                    key = tables.vote_key,
                );
                sqlx::query(&sql)
                    .bind(subject.id())
                    .bind(voter_id)
                    .bind(is_upvote)
                    .bind(now)
                    .execute(&mut **tx)
                    .await?
            }
            LedgerOp::Delete => {
                let sql = format!(
                    "DELETE FROM {votes} WHERE {key} = $1 AND user_id = $2",
                    votes = tables.votes,
                    key = tables.vote_key,
                );
                sqlx::query(&sql)
                    .bind(subject.id())
                    .bind(voter_id)
                    .execute(&mut **tx)
                    .await?
            }
        };

        if result.rows_affected() != 1 {
            return Err(VotesRepositoryError::Conflict(format!(
                "ledger row for {subject} and voter {voter_id} changed underneath {op:?}"
            )));
        }
        Ok(())
    }

    /// Adds a signed delta to the subject's counters and stamps its activity.
    ///
    /// The guard in the `WHERE` clause refuses any delta that would take a
    /// counter below zero; the subject was pinned earlier in the transaction, so
    /// an empty result means underflow.
    async fn apply_votes_delta_tx(
        &self,
        subject: SubjectRef,
        delta: VotesDelta,
        now: DateTime<Utc>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<VotesCount, VotesRepositoryError> {
        let tables = SubjectTables::of(subject.kind());
        let sql = format!(
            r#"
            UPDATE {subjects}
            SET upvote_count = upvote_count + $2,
                downvote_count = downvote_count + $3,
                last_activity_at = GREATEST(last_activity_at, $4)
            WHERE id = $1
              AND upvote_count + $2 >= 0
              AND downvote_count + $3 >= 0
            RETURNING upvote_count, downvote_count
            "#,
            subjects = tables.subjects,
        );
        let (upvotes, downvotes) = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(subject.id())
            .bind(i64::from(delta.upvotes))
            .bind(i64::from(delta.downvotes))
            .bind(now)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(VotesRepositoryError::CounterUnderflow { subject, delta })?;

        Ok(VotesCount {
            subject,
            upvotes,
            downvotes,
        })
    }

    /// Stamps activity on a question within an active transaction.
    async fn touch_question_tx(
        &self,
        question_id: QuestionId,
        now: DateTime<Utc>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), VotesRepositoryError> {
        let result = sqlx::query(
            "UPDATE questions SET last_activity_at = GREATEST(last_activity_at, $2) WHERE id = $1",
        )
        .bind(question_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )));
        }
        Ok(())
    }

    /// Lists subjects of one kind whose counters disagree with the ledger,
    /// with the question that owns each of them. Takes no locks.
    async fn drifted_subjects(
        &self,
        kind: SubjectKind,
    ) -> Result<Vec<DriftRow>, VotesRepositoryError> {
        let tables = SubjectTables::of(kind);
        let sql = format!(
            r#"
            SELECT s.id, {owner} AS question_id
            FROM {subjects} s
            LEFT JOIN {votes} v ON v.{key} = s.id
            GROUP BY s.id
            HAVING s.upvote_count <> COUNT(v.user_id) FILTER (WHERE v.is_upvote)
                OR s.downvote_count <> COUNT(v.user_id) FILTER (WHERE NOT v.is_upvote)
            "#,
            owner = match kind {
                SubjectKind::Question => "s.id",
                SubjectKind::Answer => "s.question_id",
            },
            subjects = tables.subjects,
            votes = tables.votes,
            key = tables.vote_key,
        );
        Ok(sqlx::query_as::<_, DriftRow>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Recounts one subject's ledger and rewrites its counters if they still
    /// disagree.
    ///
    /// Holding the owning question's lock keeps every writer of the subject out,
    /// so the recount cannot race an in-flight vote.
    async fn repair_subject(
        &self,
        subject: SubjectRef,
        question_id: QuestionId,
    ) -> Result<Option<CounterRepair>, VotesRepositoryError> {
        let tables = SubjectTables::of(subject.kind());
        let mut tx = self.pool.begin().await?;
        match self.lock_question_tx(question_id, &mut tx).await {
            Err(VotesRepositoryError::SubjectNotFound(_)) => return Ok(None),
            other => other?,
        }

        let sql = format!(
            r#"
            SELECT s.upvote_count, s.downvote_count,
                   COUNT(v.user_id) FILTER (WHERE v.is_upvote) AS ledger_upvotes,
                   COUNT(v.user_id) FILTER (WHERE NOT v.is_upvote) AS ledger_downvotes
            FROM {subjects} s
            LEFT JOIN {votes} v ON v.{key} = s.id
            WHERE s.id = $1
            GROUP BY s.id
            "#,
            subjects = tables.subjects,
            votes = tables.votes,
            key = tables.vote_key,
        );
        let Some((upvotes, downvotes, ledger_upvotes, ledger_downvotes)) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(&sql)
                .bind(subject.id())
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        if (upvotes, downvotes) == (ledger_upvotes, ledger_downvotes) {
            return Ok(None);
        }

        let update = format!(
            "UPDATE {subjects} SET upvote_count = $2, downvote_count = $3 WHERE id = $1",
            subjects = tables.subjects,
        );
        sqlx::query(&update)
            .bind(subject.id())
            .bind(ledger_upvotes)
            .bind(ledger_downvotes)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(CounterRepair {
            subject,
            stored: VotesCount {
                subject,
                upvotes,
                downvotes,
            },
            ledger: VotesCount {
                subject,
                upvotes: ledger_upvotes,
                downvotes: ledger_downvotes,
            },
        }))
    }
}

#[async_trait]
impl VotesRepository for PostgresVotesRepository {
    async fn get_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
    ) -> Result<Option<Vote>, VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;
        let vote = self.get_vote_tx(subject, voter_id, &mut tx).await?;
        tx.commit().await?;
        Ok(vote)
    }

    async fn get_votes_count(
        &self,
        subject: SubjectRef,
    ) -> Result<VotesCount, VotesRepositoryError> {
        let tables = SubjectTables::of(subject.kind());
        let sql = format!(
            "SELECT upvote_count, downvote_count FROM {subjects} WHERE id = $1",
            subjects = tables.subjects,
        );
        let (upvotes, downvotes) = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(subject.id())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(subject))?;

        Ok(VotesCount {
            subject,
            upvotes,
            downvotes,
        })
    }

    /// Commits a vote transition in one transaction.
    ///
    /// Order inside the transaction: pair lock, owning question lock, subject
    /// pin, ledger read, planner decision, ledger mutation, counter delta with
    /// activity stamp, parent question stamp. Any error drops the transaction,
    /// which rolls back.
    async fn commit_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        planner: TransitionPlanner<'_>,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;
        self.lock_vote_pair_tx(subject, voter_id, &mut tx).await?;
        let parent = self.lock_owning_question_tx(subject, &mut tx).await?;
        if self.pin_subject_tx(subject, &mut tx).await? != parent {
            return Err(VotesRepositoryError::Conflict(format!(
                "{subject} moved to another question"
            )));
        }
        let current = self.get_vote_tx(subject, voter_id, &mut tx).await?;

        let transition = planner(current.as_ref())?;

        self.apply_ledger_op_tx(subject, voter_id, transition.ledger_op, now, &mut tx)
            .await?;
        let counts = self
            .apply_votes_delta_tx(subject, transition.delta, now, &mut tx)
            .await?
            .clamped();
        if let Some(question_id) = parent {
            self.touch_question_tx(question_id, now, &mut tx).await?;
        }
        tx.commit().await?;

        debug!(
            %subject,
            %voter_id,
            op = ?transition.ledger_op,
            upvotes = counts.upvotes,
            downvotes = counts.downvotes,
            "Vote committed"
        );
        Ok(VoteOutcome {
            state: transition.next_state,
            upvote_count: counts.upvotes,
            downvote_count: counts.downvotes,
        })
    }

    async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent acceptances on the same question queue up here.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(question_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )))?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM answers WHERE id = $1 AND question_id = $2")
            .bind(answer_id)
            .bind(question_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(
                answer_id,
            )))?;

        sqlx::query(
            "UPDATE answers SET is_accepted = FALSE WHERE question_id = $1 AND is_accepted AND id <> $2",
        )
        .bind(question_id)
        .bind(answer_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE answers
            SET is_accepted = TRUE,
                last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(answer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE questions
            SET has_accepted_answer = TRUE,
                last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn touch_activity(
        &self,
        subject: SubjectRef,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;
        match subject {
            SubjectRef::Question(question_id) => {
                self.touch_question_tx(question_id, now, &mut tx).await?;
            }
            SubjectRef::Answer(answer_id) => {
                let question_id = self.parent_question_tx(answer_id, &mut tx).await?;
                self.lock_question_tx(question_id, &mut tx).await?;
                let result = sqlx::query(
                    r#"
                    UPDATE answers
                    SET last_activity_at = GREATEST(last_activity_at, $2)
                    WHERE id = $1
                    "#,
                )
                .bind(answer_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(VotesRepositoryError::SubjectNotFound(subject));
                }
                self.touch_question_tx(question_id, now, &mut tx).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn increment_comment_count(
        &self,
        answer_id: AnswerId,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;
        let question_id = self.parent_question_tx(answer_id, &mut tx).await?;
        self.lock_question_tx(question_id, &mut tx).await?;

        let result = sqlx::query(
            r#"
            UPDATE answers
            SET comment_count = comment_count + 1,
                last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(answer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(
                answer_id,
            )));
        }

        sqlx::query(
            r#"
            UPDATE questions
            SET comment_count = comment_count + 1,
                last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn increment_view_count(
        &self,
        question_id: QuestionId,
    ) -> Result<(), VotesRepositoryError> {
        let result = sqlx::query("UPDATE questions SET view_count = view_count + 1 WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )));
        }
        Ok(())
    }

    async fn get_question(
        &self,
        question_id: QuestionId,
    ) -> Result<QuestionAggregates, VotesRepositoryError> {
        let sql = format!(
            r#"
            SELECT q.id, q.upvote_count, q.downvote_count, q.comment_count,
                   COALESCE(ac.answer_count, 0) AS answer_count,
                   q.view_count, q.follow_count, q.bookmark_count, q.share_count,
                   q.bounty_amount, q.has_accepted_answer, q.is_closed,
                   q.created_at, q.last_activity_at
            FROM questions q
            {ANSWER_COUNTS_JOIN}
            WHERE q.id = $1
            "#
        );
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )))?;
        Ok(row.into())
    }

    async fn get_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<AnswerAggregates, VotesRepositoryError> {
        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, question_id, upvote_count, downvote_count, comment_count,
                   is_accepted, created_at, last_activity_at
            FROM answers
            WHERE id = $1
            "#,
        )
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(
            answer_id,
        )))?;
        Ok(row.into())
    }

    async fn trending_page(
        &self,
        now: DateTime<Utc>,
        offset: usize,
        limit: usize,
    ) -> Result<TrendingPage, VotesRepositoryError> {
        let sql = format!(
            r#"
            SELECT q.id,
                   ($2 * (q.upvote_count - q.downvote_count)
                    + $3 * q.follow_count
                    + $4 * q.bookmark_count
                    + $5 * COALESCE(ac.answer_count, 0)
                    + $6 * q.comment_count
                    + $7 * q.view_count
                    + $8 * q.share_count
                    + $9 * q.bounty_amount
                    + CASE WHEN q.has_accepted_answer THEN 0 ELSE $10 END)
                   / power(
                       GREATEST(EXTRACT(EPOCH FROM ($1 - q.last_activity_at))::float8, 0) / 3600.0
                           + $11,
                       $12
                   ) AS score
            FROM questions q
            {ANSWER_COUNTS_JOIN}
            WHERE NOT q.is_closed
            ORDER BY score DESC, q.id ASC
            OFFSET $13
            LIMIT $14
            "#
        );

        // One snapshot for the page and the total.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query_as::<_, (Uuid, f64)>(&sql)
            .bind(now)
            .bind(UPVOTE_WEIGHT)
            .bind(FOLLOW_WEIGHT)
            .bind(BOOKMARK_WEIGHT)
            .bind(ANSWER_WEIGHT)
            .bind(COMMENT_WEIGHT)
            .bind(VIEW_WEIGHT)
            .bind(SHARE_WEIGHT)
            .bind(BOUNTY_WEIGHT)
            .bind(UNANSWERED_BONUS)
            .bind(AGE_OFFSET_HOURS)
            .bind(GRAVITY)
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&mut *tx)
            .await?;

        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE NOT is_closed")
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;

        Ok(TrendingPage {
            entries: rows
                .into_iter()
                .map(|(question_id, score)| TrendingEntry {
                    question_id,
                    score,
                    display_score: display_score(score),
                })
                .collect(),
            offset,
            limit,
            total_count: usize::try_from(total_count).unwrap_or_default(),
        })
    }

    /// Repairs each drifted subject in its own transaction under the owning
    /// question's lock, answers first.
    async fn reconcile_vote_counts(&self) -> Result<Vec<CounterRepair>, VotesRepositoryError> {
        let mut repairs = Vec::new();
        for kind in [SubjectKind::Answer, SubjectKind::Question] {
            for row in self.drifted_subjects(kind).await? {
                let subject = SubjectRef::from_parts(kind, row.id);
                if let Some(repair) = self.repair_subject(subject, row.question_id).await? {
                    debug!(%subject, "Vote counters repaired");
                    repairs.push(repair);
                }
            }
        }
        Ok(repairs)
    }
}
