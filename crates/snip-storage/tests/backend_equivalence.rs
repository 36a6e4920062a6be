//! Runs one sequence of saves and lookups against every backend and checks
//! that all of them report the same outcomes and the same field values.

#[macro_use]
mod common;

use common::{code, now, record};
use jiff::{SignedDuration, Timestamp};
use snip_storage::{InMemoryRepository, Repository, StorageError, UrlRecord};

#[derive(Debug, PartialEq)]
enum Outcome {
    Saved,
    Found(UrlRecord),
    NotFound,
    Expired,
    Conflict,
    Failed(String),
}

impl From<Result<(), StorageError>> for Outcome {
    fn from(result: Result<(), StorageError>) -> Self {
        match result {
            Ok(()) => Outcome::Saved,
            Err(err) => err.into(),
        }
    }
}

impl From<Result<UrlRecord, StorageError>> for Outcome {
    fn from(result: Result<UrlRecord, StorageError>) -> Self {
        match result {
            Ok(record) => Outcome::Found(record),
            Err(err) => err.into(),
        }
    }
}

impl From<StorageError> for Outcome {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => Outcome::NotFound,
            StorageError::Expired(_) => Outcome::Expired,
            StorageError::Conflict(_) => Outcome::Conflict,
            other => Outcome::Failed(other.to_string()),
        }
    }
}

async fn run_scenario(repo: &dyn Repository, base: Timestamp) -> Vec<Outcome> {
    let past = base - SignedDuration::from_secs(30);
    let future = base + SignedDuration::from_hours(1);

    let first = record("aaaaaaaaaa", "https://a.example", None);
    let expiring = record("cccccccccc", "https://c.example", Some(past));
    let lasting = record("dddddddddd", "https://d.example", Some(future));
    let reclaimer = record("cccccccccc", "https://e.example", None);
    let long_url = format!("https://f.example/{}", "f".repeat(3000));

    vec![
        // fresh insert
        repo.save(&first).await.into(),
        // idempotent re-insert
        repo.save(&first).await.into(),
        // colliding insert
        repo.save(&record("aaaaaaaaaa", "https://b.example", None))
            .await
            .into(),
        repo.get_by_code(&code("aaaaaaaaaa")).await.into(),
        repo.get_by_original_url("https://a.example").await.into(),
        repo.get_by_original_url("https://b.example").await.into(),
        // missing lookups
        repo.get_by_code(&code("zzzzzzzzzz")).await.into(),
        // expired lookups
        repo.save(&expiring).await.into(),
        repo.get_by_code(&code("cccccccccc")).await.into(),
        repo.get_by_original_url("https://c.example").await.into(),
        // future expiration stays reachable
        repo.save(&lasting).await.into(),
        repo.get_by_code(&code("dddddddddd")).await.into(),
        // expired slot is reclaimed
        repo.save(&reclaimer).await.into(),
        repo.get_by_code(&code("cccccccccc")).await.into(),
        repo.get_by_original_url("https://c.example").await.into(),
        // over-long URL is refused, never truncated
        repo.save(&record("ffffffffff", &long_url, None)).await.into(),
        repo.get_by_code(&code("ffffffffff")).await.into(),
        repo.get_by_original_url(&long_url).await.into(),
    ]
}

fn expected(outcomes: &[Outcome]) {
    use Outcome::*;

    let kinds: Vec<&'static str> = outcomes
        .iter()
        .map(|outcome| match outcome {
            Saved => "saved",
            Found(_) => "found",
            NotFound => "not-found",
            Expired => "expired",
            Conflict => "conflict",
            Failed(_) => "failed",
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            "saved",
            "saved",
            "conflict",
            "found",
            "found",
            "not-found",
            "not-found",
            "saved",
            "expired",
            "expired",
            "saved",
            "found",
            "saved",
            "found",
            "not-found",
            "failed",
            "not-found",
            "not-found",
        ]
    );

    let Found(first) = &outcomes[3] else {
        unreachable!()
    };
    assert_eq!(first.original_url, "https://a.example");

    let Found(reclaimed) = &outcomes[13] else {
        unreachable!()
    };
    assert_eq!(reclaimed.original_url, "https://e.example");
}

#[tokio::test]
async fn in_memory_backend_follows_the_contract() {
    let repo = InMemoryRepository::new();
    expected(&run_scenario(&repo, now()).await);
}

#[tokio::test]
async fn mysql_matches_in_memory() {
    let fixture = fixture_or_skip!();

    let base = now();
    let memory = InMemoryRepository::new();
    let from_memory = run_scenario(&memory, base).await;
    let from_mysql = run_scenario(&fixture.repo, base).await;

    expected(&from_mysql);

    // created_at values differ between runs; compare everything else
    let strip = |outcomes: Vec<Outcome>| -> Vec<Outcome> {
        outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Outcome::Found(mut record) => {
                    record.created_at = Timestamp::UNIX_EPOCH;
                    Outcome::Found(record)
                }
                other => other,
            })
            .collect()
    };

    assert_eq!(strip(from_memory), strip(from_mysql));
}
