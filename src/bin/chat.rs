use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use meetbook::client::{Coordinator, HttpBackend, SchedulerBackend};
use meetbook::config::AppConfig;
use meetbook::models::Role;

const HELP: &str = "Describe a meeting, e.g. \"30 min tomorrow 10am with alice@example.com\".
Commands: /pick N  /retry  /clear  /state  /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let config = AppConfig::from_env();
    let mut coordinator = Coordinator::new(HttpBackend::new(&config.backend_url), config.demo_mode);
    if !config.demo_mode {
        match config.user_credentials() {
            Some(token) => coordinator = coordinator.with_token(token),
            None => tracing::warn!("USER_REFRESH_TOKEN not set, confirmations will be rejected"),
        }
    }

    println!("Meeting scheduler ({})", config.backend_url);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let seen = coordinator.state().messages.len();
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/help", _) => println!("{HELP}"),
            ("/retry", _) => coordinator.retry().await,
            ("/clear", _) => {
                coordinator.clear().await;
                println!("Conversation cleared.");
            }
            ("/state", _) => {
                let state = coordinator.state();
                println!(
                    "phase={} retries={} confirmed={}",
                    coordinator.phase().as_str(),
                    state.retry_count,
                    state.confirmed
                );
            }
            ("/pick", n) => match n.trim().parse::<usize>() {
                Ok(n) if n > 0 => coordinator.select(n - 1).await,
                _ => println!("usage: /pick N"),
            },
            _ => coordinator.submit(line).await,
        }

        render(&coordinator, seen);
    }

    Ok(())
}

fn render<B: SchedulerBackend>(coordinator: &Coordinator<B>, seen: usize) {
    let state = coordinator.state();
    let new_messages = state.messages.iter().skip(seen);

    let mut showed_reply = false;
    for msg in new_messages {
        if msg.role == Role::Assistant {
            println!("🤖 {}", msg.content);
            showed_reply = true;
        }
    }

    if !showed_reply {
        return;
    }

    if let Some(proposal) = &state.pending_proposal {
        if !state.confirmed && !state.lock_held {
            for (i, slot) in proposal.slots.iter().enumerate() {
                println!("  Option {}: {}", i + 1, slot.label);
            }
        }
    }
}
