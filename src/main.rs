//! `chunkwire` command line tool.
//!
//! `split` drives the same sender path as an embedding application, with
//! standard output standing in for the transport. `join` feeds packet lines
//! through a receiver and writes out each dispatched body. A line that cannot
//! be processed is logged and skipped, and `join` exits with an error once
//! every other payload has been written.

mod cli;

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, Read, Write},
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use chunkwire::{
    ChunkwireConfig,
    Delivery,
    Error,
    PayloadReceiver,
    PayloadSender,
    PeerId,
    Result,
    Transport,
    TransportError,
};
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, warn};

/// Prints each packet on its own line.
struct StdoutTransport;

#[async_trait]
impl Transport for StdoutTransport {
    async fn send(&self, message: String) -> std::result::Result<(), TransportError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{message}").map_err(|err| TransportError::new(err.to_string()))
    }
}

fn load_config(path: Option<&Path>) -> Result<ChunkwireConfig> {
    match path {
        Some(path) => Ok(ChunkwireConfig::from_reader(File::open(path)?)?),
        None => Ok(ChunkwireConfig::default()),
    }
}

fn read_input(path: Option<&Path>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path),
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

async fn split(
    config: &ChunkwireConfig,
    topic: &str,
    no_pace: bool,
    input: Option<&Path>,
) -> Result<()> {
    let body = read_input(input)?;
    let mut builder = config.send_queue();
    if no_pace {
        builder = builder.interval(None);
    }
    let queue = builder.spawn(StdoutTransport)?;
    let sender = PayloadSender::from_config(config, queue.handle())?;
    let payload_id = sender.send(topic, &body)?;
    info!(payload_id = payload_id.get(), body_len = body.len(), "split payload");
    queue.close().await;
    Ok(())
}

fn join(
    config: &ChunkwireConfig,
    peer: &str,
    output: Option<&Path>,
    input: Option<&Path>,
) -> Result<()> {
    let delivered: Arc<Mutex<Vec<Delivery>>> = Arc::default();
    let sink = Arc::clone(&delivered);
    let mut receiver = PayloadReceiver::from_config(config, move |delivery: Delivery| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delivery);
    });

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let peer = PeerId::new(peer);
    let mut rejected = 0_usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(err) = receiver.receive(line, &peer) {
            rejected += 1;
            warn!(line = index + 1, error = %err, "skipped packet line");
        }
    }

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let deliveries =
        std::mem::take(&mut *delivered.lock().unwrap_or_else(PoisonError::into_inner));
    for delivery in deliveries {
        eprintln!("{}", delivery.event());
        out.write_all(delivery.payload())?;
    }
    out.flush()?;

    let pending = receiver.store().buffered_len();
    if pending > 0 {
        warn!(pending, "input ended with incomplete payloads");
    }
    if rejected > 0 {
        return Err(Error::RejectedPackets { rejected });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Split {
            topic,
            no_pace,
            input,
        } => split(&config, &topic, no_pace, input.as_deref()).await,
        Command::Join {
            peer,
            output,
            input,
        } => join(&config, &peer, output.as_deref(), input.as_deref()),
    }
}
