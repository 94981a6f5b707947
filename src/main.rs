use std::{env, sync::Arc};

use colored::Colorize;
use log::{error, info};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

use unihub_campus::{Campus, DatabaseError, LogMailer, PgDatabase};
use unihub_server::{run_server, ServerConfig};

use crate::logging::LogColor;

mod logging;

struct Unihub {
    campus: Arc<Campus<PgDatabase>>,
    config: ServerConfig,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum UnihubError {
    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Unihub {
    fn new() -> Result<Self, UnihubError> {
        info!("Building async runtime...");
        let main_runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("unihub-async")
            .build()
            .map_err(|e| UnihubError::Fatal(e.to_string()))?;

        let config = ServerConfig::from_env();

        let database_url = env::var("UNIHUB_DATABASE_URL")
            .map_err(|_| UnihubError::Fatal("UNIHUB_DATABASE_URL must be set".to_string()))?;

        info!("Connecting to database...");
        let database = main_runtime.block_on(PgDatabase::new(&database_url))?;

        info!("Applying migrations...");
        main_runtime.block_on(database.migrate())?;

        let mailer = LogMailer::new(config.public_url.clone());
        let campus = Arc::new(Campus::new(database, mailer));

        Ok(Self {
            campus,
            config,
            runtime: main_runtime,
        })
    }

    fn run(self) {
        let Self {
            campus,
            config,
            runtime,
        } = self;

        runtime.block_on(run_server(campus, config));
    }
}

impl UnihubError {
    fn hint(&self) -> String {
        match self {
            UnihubError::Database(_) => "This is a database error. Make sure the Postgres instance behind UNIHUB_DATABASE_URL is running and reachable, then try again.".to_string(),
            UnihubError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn main() {
    logging::init_logger();

    match Unihub::new() {
        Ok(unihub) => {
            info!("Initialized successfully.");
            unihub.run();
        }
        Err(error) => {
            error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "unihub failed to start!".bold().color(LogColor::Red));
            error!("{}", error);
            error!(
                "{}",
                format!("Hint: {}", error.hint())
                    .color(LogColor::Dimmed)
                    .italic()
            );
        }
    }
}
