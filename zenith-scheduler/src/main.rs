//! Standalone binary entry point: parses CLI configuration, wires the
//! bounded command/response queues to a [`Processor`] running on its own
//! thread, and serves the HTTP control surface over them.
//!
//! Flow: parse args, init logging, build the service, run, map any
//! top-level error to an exit code (see
//! [`zenith_scheduler::config::exit_code`]).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use zenith_scheduler::algorithm::AlgorithmFactory;
use zenith_scheduler::api::{build_router, AppState};
use zenith_scheduler::commands::Command;
use zenith_scheduler::config::{exit_code, Config};
use zenith_scheduler::processor::Processor;
use zenith_scheduler::queue::BoundedQueue;

fn main() -> ExitCode {
    let config = match Config::parse_and_validate() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("zenith-scheduler: {err}");
            return code(exit_code::BAD_ARGS);
        }
    };

    init_tracing(config.debug);

    match run(config) {
        Ok(()) => code(exit_code::SUCCESS),
        Err(err @ (zenith_scheduler::Error::IoFault(_) | zenith_scheduler::Error::Serialization(_))) => {
            tracing::error!(error = ?err, "environment or input failure");
            code(exit_code::ENV_OR_INPUT_FAILURE)
        }
        Err(err) => {
            tracing::error!(error = ?err, "fatal error");
            code(exit_code::UNCAUGHT)
        }
    }
}

fn code(value: i32) -> ExitCode {
    ExitCode::from(value.rem_euclid(256) as u8)
}

fn init_tracing(debug: bool) {
    let filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(filter).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();
}

fn run(config: Config) -> zenith_scheduler::Result<()> {
    let in_queue = Arc::new(BoundedQueue::new(config.in_queue_capacity()));
    let out_queue = Arc::new(BoundedQueue::new(config.out_queue_capacity()));
    let factory = Arc::new(AlgorithmFactory::with_builtins());

    let mut processor = Processor::new(
        Arc::clone(&factory),
        Arc::clone(&in_queue),
        Arc::clone(&out_queue),
        config.timeout_duration(),
    );
    let closed = processor.closed_flag();

    if let Some(path) = &config.input {
        // File-backed command ingestion runs standalone: load every command
        // up front, close the input side, and drain the processor in this
        // thread without standing up the HTTP control surface.
        load_commands_from_file(path, &in_queue)?;
        closed.store(true, std::sync::atomic::Ordering::SeqCst);
        processor.run();
        while out_queue.element_count() > 0 {
            let response = out_queue.pop();
            tracing::info!(request_id = %response.request_id, status = response.status, "response");
        }
        return Ok(());
    }

    let _processor_thread = processor.spawn();

    let state = AppState::new(Arc::clone(&in_queue), Arc::clone(&out_queue));
    let router = build_router(state);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(zenith_scheduler::Error::IoFault)?;

    let listen = config.listen.clone();
    runtime.block_on(async move {
        tracing::info!(address = %listen, "HTTP control surface listening");
        let listener = tokio::net::TcpListener::bind(&listen).await?;
        axum::serve(listener, router).await
    })
    .map_err(zenith_scheduler::Error::IoFault)?;

    closed.store(true, std::sync::atomic::Ordering::SeqCst);
    Ok(())
}

/// Reads newline-delimited JSON commands from `path` and pushes each onto
/// `in_queue`. Mirrors `main.cpp`'s `-i/--input` handling: a file that
/// cannot be opened is an environment failure, not a bad-argument one.
fn load_commands_from_file(path: &std::path::Path, in_queue: &Arc<BoundedQueue<Command>>) -> zenith_scheduler::Result<()> {
    let file = File::open(path).map_err(zenith_scheduler::Error::IoFault)?;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(zenith_scheduler::Error::IoFault)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let command: Command = serde_json::from_str(line).map_err(zenith_scheduler::Error::Serialization)?;
        in_queue.push(command);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_newline_delimited_commands_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"command":"interrupt","context":{{"request_id":"r1"}},"chain_id":"c1"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"command":"metrics","context":{{"request_id":"r2"}},"chain_id":"c2"}}"#).unwrap();

        let in_queue = Arc::new(BoundedQueue::new(8));
        load_commands_from_file(file.path(), &in_queue).unwrap();

        assert_eq!(in_queue.element_count(), 2);
        let first = in_queue.pop();
        assert_eq!(first.context().request_id, "r1");
    }

    #[test]
    fn missing_input_file_is_an_io_fault() {
        let in_queue = Arc::new(BoundedQueue::new(8));
        let err = load_commands_from_file(std::path::Path::new("/nonexistent/path/x.jsonl"), &in_queue).unwrap_err();
        assert!(matches!(err, zenith_scheduler::Error::IoFault(_)));
    }
}
