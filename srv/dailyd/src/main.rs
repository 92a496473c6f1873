use actix_web::{web, App, HttpServer};
use clap::{Arg, Command};
use log::{error, info};
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

mod errors;
mod handlers;
mod models;
mod services;
mod utils;

use errors::StartupError;
use models::AppState;
use services::dictionary::DictionaryIndex;
use services::leaderboard::SqliteLeaderboard;
use services::providers::{DictdProvider, FreeDictionaryProvider};
use services::resolver::{DefinitionProvider, DefinitionResolver, RetryPolicy};
use services::scoring::DEFAULT_MAX_WORDS;
use services::word_loader::load_dictionary;

// Function to initialize logging
fn init_logging(log_file: Option<&String>) -> std::io::Result<()> {
    if let Some(file) = log_file {
        let log_output = OpenOptions::new().create(true).append(true).open(file)?;

        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(log_output)))
            .init();
    } else {
        env_logger::init();
    }
    Ok(())
}

fn build_resolver(
    definition_api: &str,
    dictd_host: Option<&String>,
    policy: RetryPolicy,
) -> DefinitionResolver {
    let mut providers: Vec<Box<dyn DefinitionProvider>> = Vec::new();

    if !definition_api.trim().is_empty() {
        providers.push(Box::new(FreeDictionaryProvider::new(definition_api)));
    }
    if let Some(host) = dictd_host {
        providers.push(Box::new(DictdProvider::new(host)));
    }

    let resolver = DefinitionResolver::new(providers, policy);
    info!("Definition providers: {:?}", resolver.provider_names());
    resolver
}

fn load_state(
    share_dir: &str,
    db_path: &str,
    resolver: DefinitionResolver,
    max_words: usize,
) -> Result<AppState, StartupError> {
    let dictionary: DictionaryIndex = load_dictionary(share_dir, "en")?;
    info!("Dictionary ready with {} words", dictionary.len());
    let leaderboard = SqliteLeaderboard::open(Path::new(db_path))?;

    Ok(AppState {
        dictionary,
        resolver,
        leaderboard: Box::new(leaderboard),
        max_words,
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let matches = Command::new("dailyd")
        .version("1.0")
        .author("Ron Straight <straightre@gmail.com>")
        .about("Daily word challenge and scoring service")
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .num_args(1)
                .default_value("0.0.0.0:2345")
                .help("Specify the listen address (e.g., 0.0.0.0:2345)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .arg(
            Arg::new("share-dir")
                .long("share-dir")
                .num_args(1)
                .default_value("./share")
                .help("Directory containing the word files"),
        )
        .arg(
            Arg::new("db-path")
                .long("db-path")
                .num_args(1)
                .default_value("./daily.db")
                .help("SQLite database holding the leaderboard"),
        )
        .arg(
            Arg::new("definition-api")
                .long("definition-api")
                .num_args(1)
                .default_value("https://api.dictionaryapi.dev/api/v2/entries/en")
                .help("Base URL of the dictionary API (empty to disable)"),
        )
        .arg(
            Arg::new("dictd-host")
                .long("dictd-host")
                .num_args(1)
                .help("Specify the dictd host (e.g., dictd:2628)"),
        )
        .arg(
            Arg::new("provider-timeout-ms")
                .long("provider-timeout-ms")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("2000")
                .help("Timeout for each definition lookup attempt"),
        )
        .arg(
            Arg::new("provider-attempts")
                .long("provider-attempts")
                .num_args(1)
                .value_parser(clap::value_parser!(u32))
                .default_value("2")
                .help("Attempts per definition provider before moving on"),
        )
        .arg(
            Arg::new("max-words")
                .long("max-words")
                .num_args(1)
                .value_parser(clap::value_parser!(usize))
                .help("Largest number of words accepted in one submission (default 200)"),
        )
        .get_matches();

    let listen_host = matches
        .get_one::<String>("listen-host")
        .expect("listen-host argument must always have a default value")
        .clone();
    let log_file = matches.get_one::<String>("log-file");
    let share_dir = matches
        .get_one::<String>("share-dir")
        .expect("share-dir argument must always have a default value");
    let db_path = matches
        .get_one::<String>("db-path")
        .expect("db-path argument must always have a default value");
    let definition_api = matches
        .get_one::<String>("definition-api")
        .expect("definition-api argument must always have a default value");
    let dictd_host = matches.get_one::<String>("dictd-host");
    let policy = RetryPolicy {
        timeout: Duration::from_millis(
            *matches
                .get_one::<u64>("provider-timeout-ms")
                .expect("provider-timeout-ms argument must always have a default value"),
        ),
        max_attempts: *matches
            .get_one::<u32>("provider-attempts")
            .expect("provider-attempts argument must always have a default value"),
    };
    let max_words = matches
        .get_one::<usize>("max-words")
        .copied()
        .unwrap_or(DEFAULT_MAX_WORDS);

    init_logging(log_file)?;

    let resolver = build_resolver(definition_api, dictd_host, policy);
    let state = match load_state(share_dir, db_path, resolver, max_words) {
        Ok(state) => state,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };
    let shared_state = web::Data::new(state);

    info!("Listening on {}", listen_host);
    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .configure(handlers::challenge::configure)
    })
    .bind(&listen_host)?
    .run()
    .await
}
