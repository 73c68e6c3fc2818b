use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing_subscriber::{self, EnvFilter};

use secw_core::protocol::{Request, Response};
use secw_core::{storage, watcher, Wallet, X509CertValidator};
use secw_types::SecwError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One request line on the socket. The sender identity is whatever the
/// transport vouches for; this reference transport trusts the declared one.
#[derive(serde::Deserialize)]
struct WireRequest {
    sender: String,
    command: String,
    #[serde(default)]
    frames: Vec<String>,
}

#[derive(serde::Serialize)]
struct WireReply {
    frames: Vec<String>,
}

struct Options {
    config_path: PathBuf,
    database_path: PathBuf,
    socket_path: PathBuf,
}

fn parse_args() -> Option<Options> {
    let mut options = Options {
        config_path: storage::default_config_path(),
        database_path: storage::default_database_path(),
        socket_path: storage::default_data_dir().join("secw.sock"),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-V" => {
                println!("secw-server {VERSION}");
                return None;
            }
            "--help" | "-h" => {
                println!("secw-server {VERSION}");
                println!("Security wallet service\n");
                println!("USAGE: secw-server [OPTIONS]\n");
                println!("OPTIONS:");
                println!("  --config <path>      Configuration file (access policy)");
                println!("  --database <path>    Document database file");
                println!("  --socket <path>      Unix socket to serve on");
                println!("  -h, --help           Print help");
                println!("  -V, --version        Print version");
                println!("\nSpeaks newline-delimited JSON request/reply messages.");
                println!("Send the SUBSCRIBE command to stream SECW_NOTIFICATIONS events.");
                println!("SIGHUP reloads the configuration file.");
                return None;
            }
            "--config" if i + 1 < args.len() => {
                options.config_path = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            "--database" if i + 1 < args.len() => {
                options.database_path = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            "--socket" if i + 1 < args.len() => {
                options.socket_path = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            other => {
                eprintln!("unknown argument: {other} (try --help)");
                return None;
            }
        }
        i += 1;
    }
    Some(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(options) = parse_args() else {
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("secw-server v{VERSION} starting");

    let wallet = Wallet::open(
        options.config_path.clone(),
        options.database_path,
        Arc::new(X509CertValidator),
    )?;

    let _watch_handle = watcher::watch_config(wallet.clone(), options.config_path);
    spawn_sighup_reload(wallet.clone());

    if let Some(parent) = options.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&options.socket_path);
    let listener = UnixListener::bind(&options.socket_path)?;
    tracing::info!("serving on {}", options.socket_path.display());

    loop {
        let (stream, _) = listener.accept().await?;
        let wallet = wallet.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(wallet, stream).await {
                tracing::debug!("connection ended: {e}");
            }
        });
    }
}

fn spawn_sighup_reload(wallet: Wallet) {
    tokio::spawn(async move {
        let mut hangup =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("failed to install SIGHUP handler: {e}");
                    return;
                }
            };
        while hangup.recv().await.is_some() {
            match wallet.reload_config().await {
                Ok(()) => tracing::info!("configuration reloaded on SIGHUP"),
                Err(e) => tracing::warn!("configuration reload failed, keeping previous: {e}"),
            }
        }
    });
}

async fn serve_connection(wallet: Wallet, stream: UnixStream) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: WireRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let error = SecwError::ProtocolError {
                    reason: format!("invalid request JSON: {e}"),
                };
                write_reply(&mut write_half, Response::Error(error)).await?;
                continue;
            }
        };

        // SUBSCRIBE turns the connection into a one-way notification stream.
        if request.command == "SUBSCRIBE" {
            let mut events = wallet.subscribe();
            write_reply(&mut write_half, Response::Ok(Vec::new())).await?;
            while let Some(event) = events.recv().await {
                let line = serde_json::to_string(&event)?;
                write_half.write_all(line.as_bytes()).await?;
                write_half.write_all(b"\n").await?;
            }
            break;
        }

        let response = wallet
            .handle_request(&Request::new(request.sender, request.command, request.frames))
            .await;
        write_reply(&mut write_half, response).await?;
    }

    Ok(())
}

async fn write_reply(
    write_half: &mut tokio::net::unix::OwnedWriteHalf,
    response: Response,
) -> Result<()> {
    let reply = WireReply {
        frames: response.into_frames(),
    };
    write_half
        .write_all(serde_json::to_string(&reply)?.as_bytes())
        .await?;
    write_half.write_all(b"\n").await?;
    Ok(())
}
