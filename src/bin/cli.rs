//! Interactive chat CLI
//!
//! Run with: cargo run --bin ragchat-cli

use std::io::{BufRead, Write};
use std::sync::Arc;

use ragchat::{config::RagConfig, providers::OpenAiProvider, ChatEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to warnings only so log lines do not interleave with the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ragchat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env()?;

    let provider = OpenAiProvider::new(&config.provider)?;
    let (embedder, chat) = provider.split();
    let engine = ChatEngine::new(&config, Arc::new(embedder), Arc::new(chat))?;

    if !engine.has_index() {
        println!(
            "Building index from {}...",
            config.storage.docs_dir.display()
        );
    }
    engine.bootstrap().await?;

    println!("ragchat CLI ready. Type 'quit' to leave.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        print!("You: ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF, e.g. piped input ran out
            println!();
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }

        match engine.chat(message, None, &[]).await {
            Ok(outcome) => {
                println!("Detected intent: {}", outcome.route.label());
                if !outcome.sources.is_empty() {
                    println!("Documents used:");
                    for source in &outcome.sources {
                        println!(" - {}", source);
                    }
                }
                println!("Assistant: {}\n", outcome.answer);
            }
            Err(e) => {
                eprintln!("error: {}\n", e);
            }
        }
    }

    Ok(())
}
