//! w24fs CLI Client
//!
//! Interactive prompt for querying a w24fs server.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use w24fs::protocol::CommandType;
use w24fs::{Client, ClientConfig, Reply, W24Error};

const PROMPT: &str = "clientw24$ ";

/// w24fs CLI
#[derive(Parser, Debug)]
#[command(name = "w24fs-cli")]
#[command(about = "Interactive client for the w24fs file-query server")]
#[command(version)]
struct Args {
    /// Coordinator address
    #[arg(short, long, default_value = w24fs::client::DEFAULT_SERVER_ADDR)]
    server: String,

    /// Connect directly, without waiting for a hand-off line
    #[arg(long)]
    no_handshake: bool,

    /// Where received archives are saved
    #[arg(short, long, default_value = w24fs::client::DEFAULT_DOWNLOAD_PATH)]
    output: PathBuf,

    /// Receive buffer size in bytes
    #[arg(short, long, default_value = "1024")]
    chunk_size: usize,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    let config = ClientConfig {
        server_addr: args.server,
        handshake: !args.no_handshake,
        download_path: args.output,
        chunk_size: args.chunk_size,
        ..ClientConfig::default()
    };

    let mut client = match Client::connect(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Connection failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("Connected to {}", client.server_addr());

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        print!("{}", PROMPT);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                let _ = client.send_quit();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Cannot read input: {}", e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match client.request(line) {
            Ok(Reply::Text(body)) => println!("{}", body),
            Ok(Reply::Archive { path, len }) => {
                println!("Tar file received: {} ({} bytes)", path.display(), len)
            }
            Ok(Reply::Message(message)) => println!("{}", message.trim_end()),
            Ok(Reply::Closed) => {
                println!("Exiting connection...");
                break;
            }
            Err(W24Error::Validation(message)) => {
                eprintln!("{}", message);
                let known = line
                    .split_whitespace()
                    .next()
                    .and_then(CommandType::from_token)
                    .is_some();
                if !known {
                    print_help();
                }
            }
            Err(e @ (W24Error::Io(_) | W24Error::Network(_) | W24Error::IncompleteTransfer { .. })) => {
                eprintln!("Connection error: {}", e);
                break;
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  dirlist -a                 list directories alphabetically");
    println!("  dirlist -t                 list directories by creation time");
    println!("  w24fn <filename>           show details of the first file with that name");
    println!("  w24fz <size1> <size2>      archive files with size1 < size < size2 bytes");
    println!("  w24ft <ext1> [ext2] [ext3] archive files with the given extensions");
    println!("  w24fdb <YYYY-MM-DD>        archive files modified on or before the date");
    println!("  w24fda <YYYY-MM-DD>        archive files modified on or after the date");
    println!("  quitc                      close the session");
}
