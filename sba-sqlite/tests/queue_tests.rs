mod common;

use common::{ms, t0};
use sba_core::models::{AuctionId, RoundId};
use sba_core::ports::{JobPayload, JobRepository as _, JobRequest};
use sba_sqlite::{Db, config::SqliteConfig};

#[tokio::test]
async fn schedule_dedups_outstanding_keys() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();
    let auction_id = AuctionId::random();

    let job = JobRequest::start_auction(auction_id, now + ms(5_000), 3);
    assert!(db.schedule_job(&job, now).await?);
    // same key while outstanding: dropped
    assert!(!db.schedule_job(&job, now).await?);
    Ok(())
}

#[tokio::test]
async fn claim_skips_future_jobs() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();

    db.schedule_job(
        &JobRequest::close_round(RoundId::random(), now + ms(5_000), 10),
        now,
    )
    .await?;

    let stale = now - ms(60_000);
    assert!(db.claim_due_jobs(now, stale, 16, "w1").await?.is_empty());

    let later = now + ms(5_000);
    let claimed = db.claim_due_jobs(later, later - ms(60_000), 16, "w1").await?;
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].attempt, 1);
    Ok(())
}

#[tokio::test]
async fn claims_are_exclusive_between_workers() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();

    db.schedule_job(&JobRequest::close_round(RoundId::random(), now, 10), now)
        .await?;

    let stale = now - ms(60_000);
    assert_eq!(db.claim_due_jobs(now, stale, 16, "w1").await?.len(), 1);
    assert!(db.claim_due_jobs(now, stale, 16, "w2").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn abandoned_claims_are_redelivered() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();
    let round_id = RoundId::random();

    db.schedule_job(&JobRequest::close_round(round_id, now, 10), now)
        .await?;
    let first = db.claim_due_jobs(now, now - ms(60_000), 16, "w1").await?;
    assert_eq!(first.len(), 1);

    // w1 dies; once its claim goes stale, w2 picks the job up again
    let later = now + ms(120_000);
    let second = db.claim_due_jobs(later, later - ms(60_000), 16, "w2").await?;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].attempt, 2);
    assert!(matches!(
        second[0].payload,
        JobPayload::CloseRound { round_id: r } if r == round_id
    ));
    Ok(())
}

#[tokio::test]
async fn reschedule_into_the_past_fires_immediately() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();
    let round_id = RoundId::random();

    db.schedule_job(&JobRequest::close_round(round_id, now + ms(30_000), 10), now)
        .await?;
    db.reschedule_job(&JobRequest::close_round(round_id, now - ms(1), 10), now)
        .await?;

    let claimed = db.claim_due_jobs(now, now - ms(60_000), 16, "w1").await?;
    assert_eq!(claimed.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_jobs_requeue_until_parked() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();

    db.schedule_job(&JobRequest::close_round(RoundId::random(), now, 2), now)
        .await?;

    let claimed = db.claim_due_jobs(now, now - ms(60_000), 16, "w1").await?;
    let job = &claimed[0];
    db.fail_job(job.id, "boom", Some(now + ms(1_000)), now).await?;

    // not due until the retry time
    assert!(
        db.claim_due_jobs(now + ms(500), now - ms(60_000), 16, "w1")
            .await?
            .is_empty()
    );
    let retried = db
        .claim_due_jobs(now + ms(1_000), now - ms(59_000), 16, "w1")
        .await?;
    assert_eq!(retried.len(), 1);
    assert_eq!(retried[0].attempt, 2);

    // out of attempts: parked for good
    db.fail_job(retried[0].id, "boom again", None, now + ms(1_100))
        .await?;
    assert!(
        db.claim_due_jobs(now + ms(120_000), now + ms(60_000), 16, "w1")
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn cancel_drops_outstanding_jobs_only() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();
    let round_id = RoundId::random();

    db.schedule_job(&JobRequest::close_round(round_id, now, 10), now)
        .await?;
    db.cancel_job(&format!("round-{round_id}")).await?;
    assert!(
        db.claim_due_jobs(now, now - ms(60_000), 16, "w1")
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn completed_jobs_free_the_key_and_get_pruned() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    let now = t0();
    let round_id = RoundId::random();

    db.schedule_job(&JobRequest::close_round(round_id, now, 10), now)
        .await?;
    let claimed = db.claim_due_jobs(now, now - ms(60_000), 16, "w1").await?;
    db.complete_job(claimed[0].id, now).await?;

    // the key is free again for a later round of scheduling
    assert!(
        db.schedule_job(&JobRequest::close_round(round_id, now + ms(1_000), 10), now)
            .await?
    );

    let pruned = db.prune_jobs(now + ms(1)).await?;
    assert_eq!(pruned, 1);
    Ok(())
}
