use clap::{Parser, Subcommand};
use kvpool::{Client, Error, PoolConfig};
use tracing::debug;

/// Run a single command against a key-value store through a connection pool.
#[derive(Parser, Debug)]
#[command(name = "kvpool", version)]
struct Args {
    #[command(flatten)]
    pool: PoolConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the store answers
    Ping,
    /// Print the value of a key
    Get { key: String },
    /// Set a key to a value
    Set { key: String, value: String },
    /// Increment a counter and print the new value
    Incr { key: String },
    /// Print the members of a set
    Smembers { key: String },
    /// Publish a message and print how many subscribers received it
    Publish { channel: String, message: String },
    /// Print messages published on the given channels until interrupted
    Subscribe {
        #[arg(required = true)]
        channels: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();
    let client = Client::new(args.pool)?;

    match args.command {
        Command::Ping => {
            let reply: String = client.execute(kvpool::Cmd::new("PING")).await?;
            println!("{reply}");
        }
        Command::Get { key } => match client.get(&key).await? {
            Some(value) => println!("{value}"),
            None => println!("(nil)"),
        },
        Command::Set { key, value } => {
            client.set(&key, value).await?;
            println!("OK");
        }
        Command::Incr { key } => println!("{}", client.incr(&key).await?),
        Command::Smembers { key } => {
            for member in client.smembers(&key).await? {
                println!("{member}");
            }
        }
        Command::Publish { channel, message } => {
            println!("{}", client.publish(&channel, message).await?)
        }
        Command::Subscribe { channels } => {
            let mut subscription = client.subscribe(channels).await?;
            loop {
                tokio::select! {
                    message = subscription.recv() => match message {
                        Some(message) => println!(
                            "{}: {}",
                            message.channel,
                            String::from_utf8_lossy(&message.payload)
                        ),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        subscription.stop().await;
                        break;
                    }
                }
            }
        }
    }

    client.shutdown();
    Ok(())
}
