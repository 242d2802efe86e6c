//! Trending feed behaviour of `RankingService` against the in-memory repository.

mod common;

use chrono::Duration;
use common::{Harness, t0};
use qa_ranking_service::RankingConfig;
use qa_ranking_shared::types::{QuestionAggregates, SubjectRef, VoteIntent};
use uuid::Uuid;

#[tokio::test]
async fn test_reference_question_scores_as_expected() {
    let harness = Harness::new();
    let id = Uuid::new_v4();
    let mut question = QuestionAggregates::new(id, t0());
    question.upvote_count = 10;
    question.downvote_count = 2;
    question.follow_count = 3;
    question.bookmark_count = 1;
    question.answer_count = 4;
    question.comment_count = 5;
    question.view_count = 100;
    harness.repository.insert_question(question).await;

    let page = harness.service.compute_trending_page(0, 10).await.unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.entries[0].question_id, id);
    assert_eq!(page.entries[0].display_score, 48.0833);
}

#[tokio::test]
async fn test_closed_questions_never_trend() {
    let harness = Harness::new();
    let open = harness.question().await;
    let closed = harness.question().await;
    harness.repository.close_question(closed).await.unwrap();

    let page = harness.service.compute_trending_page(0, 0).await.unwrap();

    assert_eq!(page.total_count, 1);
    assert!(page.entries.iter().all(|e| e.question_id != closed));
    assert_eq!(page.entries[0].question_id, open);
}

#[tokio::test]
async fn test_votes_and_age_change_the_order() {
    let harness = Harness::new();
    let popular = harness.question().await;
    let quiet = harness.question().await;

    for _ in 0..3 {
        harness
            .service
            .apply_vote(SubjectRef::Question(popular), Uuid::new_v4(), VoteIntent::Upvote)
            .await
            .unwrap();
    }
    let page = harness.service.compute_trending_page(0, 10).await.unwrap();
    assert_eq!(page.entries[0].question_id, popular);

    // The quiet question gets fresh activity a day later and overtakes.
    harness.clock.advance(Duration::hours(24));
    harness
        .service
        .touch_activity(SubjectRef::Question(quiet))
        .await
        .unwrap();
    let page = harness.service.compute_trending_page(0, 10).await.unwrap();
    assert_eq!(page.entries[0].question_id, quiet);
    assert!(page.entries[0].score > page.entries[1].score);
}

#[tokio::test]
async fn test_pagination_and_limit_clamping() {
    let harness = Harness::with_config(RankingConfig::default().with_page_sizes(2, 3));
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(harness.question().await);
    }

    let first = harness.service.compute_trending_page(0, 0).await.unwrap();
    assert_eq!(first.limit, 2);
    assert_eq!(first.entries.len(), 2);
    assert_eq!(first.total_count, 5);

    let clamped = harness.service.compute_trending_page(1, 50).await.unwrap();
    assert_eq!(clamped.limit, 3);
    assert_eq!(clamped.entries.len(), 3);
    assert_eq!(clamped.entries[0].question_id, first.entries[1].question_id);

    let tail = harness.service.compute_trending_page(4, 3).await.unwrap();
    assert_eq!(tail.entries.len(), 1);

    let past_end = harness.service.compute_trending_page(10, 3).await.unwrap();
    assert!(past_end.entries.is_empty());
    assert_eq!(past_end.total_count, 5);

    // Equal scores fall back to question id order.
    ids.sort();
    let all = harness.service.compute_trending_page(0, 3).await.unwrap();
    let order: Vec<Uuid> = all.entries.iter().map(|e| e.question_id).collect();
    assert_eq!(order, ids[..3].to_vec());
}

#[tokio::test]
async fn test_views_raise_score_without_refreshing_age() {
    let harness = Harness::new();
    let question_id = harness.question().await;
    harness.clock.advance(Duration::hours(10));

    let before = harness.service.compute_trending_page(0, 1).await.unwrap();
    harness.service.record_view(question_id).await.unwrap();
    let after = harness.service.compute_trending_page(0, 1).await.unwrap();

    assert!(after.entries[0].score > before.entries[0].score);
    let expected = (10.0 + 0.5) / 12f64.powf(1.5);
    assert!((after.entries[0].score - expected).abs() < 1e-12);
}
