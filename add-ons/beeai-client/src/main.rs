//! Bee AI client - asks questions through the chat proxy.
//!
//! Plays the role of the dashboard UI: remote answer when the gateway is reachable,
//! advisory-table answer when it is not. The source of every answer is printed.

use beeai_core::{ChatAnswer, CoreConfig, KnowledgeTable, QueryMatcher};
use beeai_skills::{ChatProxy, HealthPinger};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "beeai")]
#[command(about = "Bee AI - bloom times and beekeeping advice", long_about = None)]
struct Cli {
    /// Gateway base URL (overrides `api_base_url` from config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Interactive session; keeps the gateway warm while open
    Chat,

    /// Answer from the local advisory table only
    Offline {
        #[arg(required = true)]
        question: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // .env is optional for the client
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = CoreConfig::load()?;
    if let Some(url) = cli.base_url {
        config.api_base_url = url;
    }
    let matcher = Arc::new(load_matcher(&config));

    match cli.command {
        Commands::Ask { question } => {
            let proxy = ChatProxy::from_config(&config, matcher);
            let answer = proxy.respond(&question.join(" ")).await;
            print_answer(&answer);
        }
        Commands::Chat => {
            let proxy = ChatProxy::from_config(&config, matcher);
            run_chat(&proxy, &config).await?;
        }
        Commands::Offline { question } => {
            print_answer(&ChatAnswer::fallback(matcher.answer(&question.join(" "))));
        }
    }
    Ok(())
}

fn load_matcher(config: &CoreConfig) -> QueryMatcher {
    let table = match &config.knowledge_path {
        Some(path) => KnowledgeTable::load_json_path(path),
        None => KnowledgeTable::builtin(),
    };
    QueryMatcher::new(Arc::new(table))
}

async fn run_chat(proxy: &ChatProxy, config: &CoreConfig) -> std::io::Result<()> {
    let pinger = HealthPinger::from_config(config).spawn();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    println!("Bee AI chat ({}). Type 'exit' to quit.", config.api_base_url);
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            break;
        }
        let answer = proxy.respond(question).await;
        print_answer(&answer);
    }

    pinger.stop();
    Ok(())
}

fn is_exit(input: &str) -> bool {
    matches!(input.to_ascii_lowercase().as_str(), "exit" | "quit")
}

fn status_label(answer: &ChatAnswer) -> &'static str {
    if answer.is_remote() {
        "online"
    } else {
        "offline"
    }
}

fn print_answer(answer: &ChatAnswer) {
    tracing::debug!(source = answer.source.as_str(), chars = answer.answer.len(), "Answer ready");
    println!("{}", answer.answer);
    println!("[{}]", status_label(answer));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_collects_words() {
        let cli = Cli::try_parse_from(["beeai", "ask", "wild", "garlic", "in", "Germany"]).unwrap();
        match cli.command {
            Commands::Ask { question } => assert_eq!(question.join(" "), "wild garlic in Germany"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(cli.base_url.is_none());
    }

    #[test]
    fn test_base_url_is_global() {
        let cli = Cli::try_parse_from(["beeai", "chat", "--base-url", "http://localhost:9000"]).unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(cli.command, Commands::Chat));
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["beeai", "ask"]).is_err());
    }

    #[test]
    fn test_exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit now"));
    }

    #[test]
    fn test_status_label_follows_source() {
        assert_eq!(status_label(&ChatAnswer::remote("a")), "online");
        assert_eq!(status_label(&ChatAnswer::fallback("a")), "offline");
    }

    #[test]
    fn test_missing_table_file_uses_builtin() {
        let mut config = CoreConfig::load_from(std::path::Path::new("./no/such/config")).unwrap();
        config.knowledge_path = Some("./no/such/table.json".to_string());
        let matcher = load_matcher(&config);
        assert_eq!(
            matcher.answer("climate change"),
            matcher.table().general_advisory("climate change").unwrap()
        );
    }
}
