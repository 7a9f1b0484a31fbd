// command line interface

use crate::core::{DEFAULT_MAX_ROWS, DEFAULT_MODEL, Dataset, Db};
use crate::output::TableStyle;
use crate::router::RoutingMode;
use crate::search::SearchProviderKind;
use crate::{Agent, Config, Error, Server};
use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "medquery",
    about = "Ask the heart disease, cancer and diabetes datasets questions in plain english"
)]
struct Cli {
    /// directory holding the dataset .db files
    #[arg(long, env = "MEDQ_DB_DIR", default_value = "db", global = true)]
    db_dir: PathBuf,

    /// groq api key
    #[arg(long, short = 'k', env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// groq model
    #[arg(long, short, env = "GROQ_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// web search provider
    #[arg(long, short, env = "MEDQ_SEARCH_PROVIDER", value_enum, default_value_t, global = true)]
    search: SearchProviderKind,

    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true, global = true)]
    serpapi_key: Option<String>,

    #[arg(long, env = "BING_SUBSCRIPTION_KEY", hide_env_values = true, global = true)]
    bing_key: Option<String>,

    /// how questions are routed to tools
    #[arg(long, value_enum, default_value_t, global = true)]
    routing: RoutingMode,

    /// row bound added to generated sql without a LIMIT
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS, global = true)]
    max_rows: usize,

    /// plain text tables instead of markdown
    #[arg(long, global = true)]
    plain: bool,

    /// more logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// answer one question and exit
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// show the dataset files and their columns
    Datasets,

    /// start as http server
    Serve {
        /// port number
        #[arg(long, short, default_value = "3000")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            db_dir: self.db_dir.clone(),
            api_key: self.api_key.clone(),
            model: Some(self.model.clone()),
            search: self.search,
            serpapi_key: self.serpapi_key.clone(),
            bing_key: self.bing_key.clone(),
            routing: self.routing,
            max_rows: self.max_rows,
            style: if self.plain {
                TableStyle::Plain
            } else {
                TableStyle::Markdown
            },
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config();
    tracing::info!(
        db_dir = %config.db_dir.display(),
        search = ?config.search,
        routing = ?config.routing,
        "starting"
    );

    match cli.command {
        Some(Commands::Datasets) => Ok(print_datasets(&config).await?),

        Some(Commands::Ask { question }) => {
            let agent = Agent::from_config(&config).await?;
            let answer = agent.answer(&question.join(" ")).await;
            println!("{}", answer.text);
            agent.close().await;
            Ok(())
        }

        Some(Commands::Serve { port, host }) => {
            let agent = Agent::from_config(&config).await?;
            Ok(Server::run(agent, &host, port).await?)
        }

        None => {
            let agent = Agent::from_config(&config).await?;
            let result = repl(&agent).await;
            agent.close().await;
            Ok(result?)
        }
    }
}

// RUST_LOG wins, otherwise -v picks the level for our crate
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("medquery={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn repl(agent: &Agent) -> Result<(), Error> {
    println!("Multi-tool medical assistant ready. Type 'quit' to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nUser> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("\nExiting.");
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "quit" | "exit") {
            break;
        }

        let answer = agent.answer(question).await;
        println!("[Routing to: {}]", answer.route);
        println!("\n=== Agent response ===\n");
        println!("{}", answer.text);
        println!("\n======================\n");
    }

    Ok(())
}

async fn print_datasets(config: &Config) -> Result<(), Error> {
    for dataset in Dataset::ALL {
        let db = Db::open(dataset.path_in(&config.db_dir));
        println!("{} ({})", dataset.label(), db.path().display());
        match db.schema_text(dataset.table()).await {
            Ok(schema) => println!("{schema}\n"),
            Err(e) => println!("  unavailable: {e}\n"),
        }
        db.close().await;
    }
    Ok(())
}
