//! Spread monitor: streams the BTC/USD ticker and top of book
//!
//! Run: cargo run --bin spread_monitor

use bitfinex_types::{BookSide, DomainEvent, Precision};
use bitfinex_ws::{Connection, ConnectionConfig, Feed, StreamMessage};
use colored::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("{}", "═".repeat(60).cyan());
    println!("{}", "  SPREAD MONITOR  tBTCUSD".cyan().bold());
    println!("{}", "═".repeat(60).cyan());

    let conn = Connection::new(ConnectionConfig::new());
    let mut ticker = conn.subscribe(Feed::ticker("tBTCUSD"))?;
    let mut book = conn.subscribe(Feed::book("tBTCUSD", Precision::P0).with_length(1))?;
    let handle = conn.handle();

    let runner = tokio::spawn(async move { conn.run().await });

    let deadline = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            message = ticker.recv() => match message {
                Some(StreamMessage::Update(update)) => {
                    if let DomainEvent::Ticker(t) = update.event {
                        println!(
                            "  {} {}  {} {}  {} {}  {} {}",
                            "BID:".yellow(), t.bid,
                            "ASK:".yellow(), t.ask,
                            "SPREAD:".green(), t.spread(),
                            "LAST:".dimmed(), t.last_price,
                        );
                    }
                }
                Some(message) if message.is_final() => {
                    println!("{} ticker ended: {:?}", "✗".red(), message);
                    break;
                }
                Some(_) => {}
                None => break,
            },
            message = book.recv() => {
                if let Some(StreamMessage::Update(update)) = message {
                    if let DomainEvent::BookLevel(level) = update.event {
                        let side = match level.side {
                            BookSide::Bid => "bid".green(),
                            BookSide::Ask => "ask".red(),
                        };
                        println!(
                            "  {} {} x {} ({:?})",
                            side, level.price, level.amount, update.kind
                        );
                    }
                }
            }
        }
    }

    handle.close().ok();
    match runner.await? {
        Ok(()) => println!("\n{} Demo complete.", "✓".green()),
        Err(e) => println!("\n{} Connection ended: {}", "✗".red(), e),
    }
    Ok(())
}
