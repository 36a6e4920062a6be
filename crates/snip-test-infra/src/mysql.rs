use crate::{Result, TestInfraError};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tracing::debug;
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    tag: String,
    #[builder(default = "snip".to_string(), setter(into))]
    database: String,
    #[builder(default = "snip".to_string(), setter(into))]
    username: String,
    #[builder(default = "snip".to_string(), setter(into))]
    password: String,
    /// Connection attempts made by [`MySqlServer::pool`] before giving up.
    #[builder(default = 20)]
    connect_attempts: u32,
}

/// A throwaway MySQL server living as long as this value.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts the container and waits for the server to listen on its real port.
    ///
    /// The image first boots a temporary server without networking to run
    /// its init scripts, which also logs "ready for connections", so the
    /// wait condition keys on the port announcement instead.
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", config.tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(format!("port: {MYSQL_PORT}")))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Opens a small pool, retrying while the server finishes booting.
    pub async fn pool(&self) -> Result<MySqlPool> {
        let url = self.database_url().await?;
        let mut last_error = String::new();

        for attempt in 1..=self.config.connect_attempts {
            match MySqlPoolOptions::new().max_connections(5).connect(&url).await {
                Ok(pool) => return Ok(pool),
                Err(err) => {
                    debug!(attempt, error = %err, "mysql not ready yet");
                    last_error = err.to_string();
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }

        Err(TestInfraError::NotReady {
            service: "mysql",
            attempts: self.config.connect_attempts,
            last_error,
        })
    }

    /// Runs a single DDL statement, e.g. a `CREATE TABLE`.
    pub async fn apply_schema(&self, pool: &MySqlPool, ddl: &str) -> Result<()> {
        sqlx::query(ddl).execute(pool).await?;
        Ok(())
    }
}
