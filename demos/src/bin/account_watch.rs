//! Account watch: wallet snapshot over REST, then live account events
//!
//! Needs `BFX_API_KEY` and `BFX_API_SECRET` in the environment.
//!
//! Run: cargo run --bin account_watch

use bitfinex_auth::Credentials;
use bitfinex_rest::RestClient;
use bitfinex_types::DomainEvent;
use bitfinex_ws::{
    Connection, ConnectionConfig, ConnectionEvent, Endpoint, Feed, StreamMessage,
};
use colored::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let credentials = Credentials::from_env()?;

    let rest = RestClient::new()?.with_credentials(credentials.clone());
    println!("{}", "Wallets (REST)".cyan().bold());
    for wallet in rest.wallets().await? {
        match wallet {
            Ok(w) => println!("  {:<10} {:<6} {}", w.wallet_type, w.currency, w.balance),
            Err(e) => println!("  {} {}", "skipped:".red(), e),
        }
    }

    let conn = Connection::new(ConnectionConfig::new().with_endpoint(Endpoint::Authenticated))
        .with_credentials(credentials);
    let events = conn.take_event_receiver();
    let mut account = conn.subscribe(Feed::account())?;

    tokio::spawn(async move { conn.run().await });

    if let Some(mut events) = events {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let ConnectionEvent::Authenticated { user_id } = event {
                    println!("{} authenticated as {:?}", "✓".green(), user_id);
                }
            }
        });
    }

    println!("{}", "Account events (WS)".cyan().bold());
    while let Some(message) = account.recv().await {
        match message {
            StreamMessage::Update(update) => match update.event {
                DomainEvent::Wallet(w) => {
                    println!(
                        "  {:?} wallet {} {} = {}",
                        update.kind, w.wallet_type, w.currency, w.balance
                    )
                }
                DomainEvent::Order(o) => {
                    println!(
                        "  {:?} order {} {} {} @ {}",
                        update.kind, o.id, o.symbol, o.amount, o.price
                    )
                }
                other => println!("  {:?} {}", update.kind, other.kind()),
            },
            StreamMessage::DecodeFailed { error, .. } => {
                println!("  {} {}", "decode:".red(), error)
            }
            other => {
                println!("{} {:?}", "✗".red(), other);
                break;
            }
        }
    }

    Ok(())
}
