mod handler;

use std::{
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread,
};

use clap::Parser;
use database::{
    database::{database::Database, options::DatabaseOptions},
    persistence::storage::StorageEngine,
};

use crate::handler::Handler;

/// 📀 PeopleDB TCP Server, one JSON request per line and one JSON response per line
///
/// Can connect via netcat `echo '{"op":"populationByCity"}' | netcat 127.0.0.1 9000`
#[derive(Parser, Debug)]
struct Cli {
    /// Location of the database. Reads / writes to this directory. Note: Does not support shell paths, e.g. ~
    #[clap(short, long, default_value = "data")]
    data: std::path::PathBuf,

    /// Port the server will run on
    #[clap(short, long, default_value = "9000")]
    port: u16,

    /// Address the server will run on
    #[clap(short, long, default_value = "0.0.0.0")]
    address: String,

    /// Keeps everything in memory, nothing is restored or snapshotted to disk
    #[clap(long)]
    in_memory: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Cli::parse();

    let storage_engine = match args.in_memory {
        true => StorageEngine::Memory,
        false => StorageEngine::File(args.data),
    };

    let database_options = DatabaseOptions::default()
        .set_restore(!args.in_memory)
        .set_storage_engine(storage_engine);

    let database = Arc::new(Database::new(database_options)?);

    for (name, value) in database.database_stats()? {
        log::info!("{}: {}", name, value);
    }

    let shutdown_database = database.clone();

    ctrlc::set_handler(move || {
        match shutdown_database.snapshot() {
            Ok(rows) => log::info!("Shutting down server, snapshotted {} rows", rows),
            Err(e) => log::error!("Shutting down server, snapshot failed: {}", e),
        }

        std::process::exit(0);
    })?;

    let handler = Arc::new(Handler::new(database));

    let listener = TcpListener::bind(format!("{}:{}", args.address, args.port))?;

    log::info!("TCP Server running on {}:{}", args.address, args.port);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let handler = handler.clone();

                thread::spawn(move || {
                    if let Err(e) = serve_connection(stream, &handler) {
                        log::info!("Connection closed: {}", e);
                    }
                });
            }
            Err(e) => log::info!("Failed to establish connection: {}", e),
        }
    }

    Ok(())
}

fn serve_connection(stream: TcpStream, handler: &Handler) -> std::io::Result<()> {
    log::debug!("Connected stream: {:?}", stream.peer_addr());

    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        let response = handler.handle_line(&line);

        writeln!(writer, "{}", response)?;
    }

    Ok(())
}
