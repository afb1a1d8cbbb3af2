use anyhow::Result;
use clap::{Arg, Command, value_parser};
use oneperf::perf::{Direction, receiver, sender};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("oneperf")
        .about("One-off TCP throughput measurement between a server and a single client")
        .subcommand_required(true)
        .subcommand(
            Command::new("server")
                .about("Receive from one client and report the inbound rate")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .required(true)
                        .value_parser(value_parser!(u16).range(1024..))
                        .help("Port to listen on, in the range [1024, 65535]"),
                ),
        )
        .subcommand(
            Command::new("client")
                .about("Send to a server for a fixed time and report the outbound rate")
                .arg(
                    Arg::new("host")
                        .short('H')
                        .long("host")
                        .required(true)
                        .help("Server hostname or address"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .required(true)
                        .value_parser(value_parser!(u16).range(1024..))
                        .help("Server port, in the range [1024, 65535]"),
                )
                .arg(
                    Arg::new("time")
                        .short('t')
                        .long("time")
                        .required(true)
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Transfer duration in whole seconds, greater than 0"),
                ),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    match cli().get_matches().subcommand() {
        Some(("server", matches)) => {
            let port = *matches.get_one::<u16>("port").unwrap();
            let summary = receiver::run::<TcpListener>(port).await?;
            println!("{}", summary.render(Direction::Received));
        }
        Some(("client", matches)) => {
            let host = matches.get_one::<String>("host").unwrap();
            let port = *matches.get_one::<u16>("port").unwrap();
            let time = *matches.get_one::<u64>("time").unwrap();
            let summary =
                sender::run::<TcpStream>(host, port, Duration::from_secs(time)).await?;
            println!("{}", summary.render(Direction::Sent));
        }
        _ => unreachable!(),
    }

    Ok(())
}
