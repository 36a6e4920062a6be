#![allow(dead_code)]

use jiff::Timestamp;
use snip_core::{ShortCode, UrlRecord};
use snip_storage::MySqlRepository;
use snip_test_infra::mysql::{MySqlServer, MysqlConfig};

const SCHEMA: &str = include_str!("../../ddl/mysql/short_urls.sql");

pub struct Fixture {
    mysql: MySqlServer,
    pub repo: MySqlRepository,
}

impl Fixture {
    /// Starts a fresh MySQL container with the schema applied.
    ///
    /// Returns `None` when no container runtime is reachable so the caller can skip.
    pub async fn start() -> Option<Self> {
        let mysql = match MySqlServer::start(MysqlConfig::builder().build()).await {
            Ok(mysql) => mysql,
            Err(err) => {
                eprintln!("skipping mysql test: {err}");
                return None;
            }
        };
        let pool = mysql.pool().await.expect("connect mysql");
        mysql
            .apply_schema(&pool, SCHEMA)
            .await
            .expect("create schema");

        Some(Self {
            mysql,
            repo: MySqlRepository::new(pool),
        })
    }

    pub async fn database_url(&self) -> String {
        self.mysql.database_url().await.expect("mysql url")
    }
}

macro_rules! fixture_or_skip {
    () => {
        match common::Fixture::start().await {
            Some(fixture) => fixture,
            None => return,
        }
    };
}

pub fn code(value: &str) -> ShortCode {
    ShortCode::new(value).expect("valid test code")
}

/// Current time at microsecond precision, which every backend round-trips exactly.
pub fn now() -> Timestamp {
    Timestamp::from_microsecond(Timestamp::now().as_microsecond()).unwrap()
}

pub fn record(code_str: &str, url: &str, expires_at: Option<Timestamp>) -> UrlRecord {
    UrlRecord {
        code: code(code_str),
        original_url: url.to_string(),
        created_at: now(),
        expires_at,
    }
}
