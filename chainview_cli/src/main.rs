use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use chainview_core::config::Config;
use chainview_core::gateway::handler::HttpGateway;
use chainview_core::navigation::{Navigator, Route};
use chainview_core::session::ViewSession;

/// Console rendition of the navigation capability: print where the user
/// would be taken.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate_to(&self, route: Route) {
        println!("-> {}", route);
    }
}

const HELP: &str = "\
commands:
  pool                 show the pending transaction pool
  send <to> <amount>   submit a transaction
  mine                 request block production
  addresses            list known addresses
  wallet               show wallet address and balance
  help                 show this text
  quit                 exit";

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "starting chainview against {} (poll every {:?})",
        config.api_base_url,
        config.poll_interval
    );

    let gateway = Arc::new(HttpGateway::new(&config.api_base_url, config.request_timeout)?);
    let session = ViewSession::new(gateway, Arc::new(ConsoleNavigator), config.poll_interval);
    session.activate();

    println!("{}", HELP);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["pool"] => render_pool(&session),
            ["send", recipient, amount] => match amount.parse::<f64>() {
                Ok(amount) => match session.submit(recipient, amount).await {
                    Ok(record) => println!("accepted: {}", record.summary()),
                    Err(err) => println!("error: {}", err),
                },
                Err(_) => println!("error: amount must be a number"),
            },
            ["mine"] => match session.mine().await {
                Ok(()) => println!("block production requested"),
                Err(err) => println!("error: {}", err),
            },
            ["addresses"] => match session.known_addresses().await {
                Ok(set) if set.is_empty() => println!("no known addresses yet"),
                Ok(set) => println!("{}", set.display()),
                Err(err) => println!("error: {}", err),
            },
            ["wallet"] => match session.wallet_info().await {
                Ok(info) => println!("Address: {}\nBalance: {}", info.address, info.balance),
                Err(err) => println!("error: {}", err),
            },
            ["help"] => println!("{}", HELP),
            ["quit"] | ["exit"] => break,
            _ => println!("unknown command, try 'help'"),
        }
    }

    session.deactivate();
    Ok(())
}

fn render_pool(session: &ViewSession) {
    let snapshot = session.snapshot();
    if snapshot.is_empty() {
        println!("(pool is empty)");
    } else {
        for record in snapshot.records() {
            for line in record.summary_lines() {
                println!("{}", line);
            }
            println!("---");
        }
    }
    println!("sync state: {:?}", session.sync_state());
}
