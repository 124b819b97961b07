// command line interface

use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;

use crate::config::{DEFAULT_LIMIT, GateConfig, MAX_LIMIT, TopN};
use crate::core::{Ai, Backend, BackendKind, Db, Gate, SqlDialect};
use crate::output::Output;
use crate::{Server, logging};

#[derive(Parser)]
#[command(name = "asksql", about = "Ask your database questions, get read-only sql back")]
struct Cli {
    /// database connection url
    #[arg(long, short, env = "DATABASE_URL", global = true)]
    db: Option<String>,

    /// model backend
    #[arg(long, short, env = "LLM_MODE", value_enum, default_value = "mock", global = true)]
    backend: BackendKind,

    /// api key for the backend (otherwise read from its env var)
    #[arg(long, short = 'k', global = true)]
    api_key: Option<String>,

    /// ceiling appended when a query has none
    #[arg(long, env = "DEFAULT_LIMIT", default_value_t = DEFAULT_LIMIT, global = true)]
    default_limit: u64,

    /// highest ceiling any query may carry
    #[arg(long, env = "MAX_LIMIT", default_value_t = MAX_LIMIT, global = true)]
    max_limit: u64,

    /// let "top N" in the question go past --max-limit
    #[arg(long, global = true)]
    uncapped_top_n: bool,

    /// statement timeout in milliseconds
    #[arg(long, env = "STATEMENT_TIMEOUT_MS", default_value = "5000", global = true)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// start as http server
    Serve {
        /// port number
        #[arg(long, short, default_value = "3000")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// ask one question and print the rows
    Ask {
        question: String,

        /// print json instead of a table
        #[arg(long)]
        raw: bool,

        /// show the sql without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// run sql or model output through the gate without a database
    Check {
        sql: String,

        /// question to read "top N" from
        #[arg(long, short, default_value = "")]
        question: String,
    },
}

impl Cli {
    fn gate_config(&self, dialect: SqlDialect) -> GateConfig {
        let top_n = if self.uncapped_top_n {
            TopN::Uncapped
        } else {
            TopN::Clamped
        };

        GateConfig::default()
            .with_limits(self.default_limit, self.max_limit)
            .with_top_n(top_n)
            .with_dialect(dialect)
    }

    async fn connect(&self) -> Result<Db> {
        let url = self
            .db
            .as_deref()
            .ok_or_else(|| miette::miette!("database url required (--db or DATABASE_URL)"))?;

        Ok(Db::connect(url, Duration::from_millis(self.timeout_ms)).await?)
    }

    fn ai(&self) -> Result<Ai> {
        let backend = Backend::from_env(self.backend, self.api_key.clone())?;
        Ok(Ai::new(backend)?)
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    match &cli.command {
        Commands::Serve { port, host } => {
            let db = cli.connect().await?;
            let gate = Gate::new(cli.gate_config(db.gate_dialect()))?;
            let ai = cli.ai()?;
            Ok(Server::run(db, ai, gate, host, *port).await?)
        }

        Commands::Ask {
            question,
            raw,
            dry_run,
        } => {
            let db = cli.connect().await?;
            let gate = Gate::new(cli.gate_config(db.gate_dialect()))?;
            let ai = cli.ai()?;

            let schema = db.schema().await?;
            let candidate = ai.generate(question, &schema).await?;
            let statement = gate.process(question, &candidate)?;

            if *dry_run {
                if *raw {
                    Output::raw(&statement, None);
                } else {
                    Output::statement(&statement);
                }
                return Ok(());
            }

            let result = db.run(&statement).await?;
            if *raw {
                Output::raw(&statement, Some(&result));
            } else {
                Output::pretty(&statement, &result);
            }
            Ok(())
        }

        Commands::Check { sql, question } => {
            let gate = Gate::new(cli.gate_config(SqlDialect::Generic))?;
            let statement = gate.process(question, sql)?;
            Output::statement(&statement);
            Ok(())
        }
    }
}
