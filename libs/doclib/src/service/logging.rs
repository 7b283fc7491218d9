use crate::model::errors::DocResult;
use crate::Config;
use chrono::Local;
use std::backtrace::Backtrace;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::{env, panic};
use tracing::metadata::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{filter, fmt, Layer};

pub static LOG_FILE: &str = "doclib.log";

fn ours(metadata: &tracing::Metadata<'_>) -> bool {
    metadata.target().starts_with("doclib")
}

pub fn init(config: &Config) -> DocResult<()> {
    if config.logs {
        let doclib_log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| s.as_str().parse().ok())
            .unwrap_or(LevelFilter::DEBUG);

        fs::create_dir_all(&config.writeable_path)?;

        let mut layers = Vec::with_capacity(2);

        layers.push(
            fmt::Layer::new()
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_ansi(config.colored_logs)
                .with_target(true)
                .with_writer(tracing_appender::rolling::never(&config.writeable_path, LOG_FILE))
                .with_filter(doclib_log_level)
                .with_filter(filter::filter_fn(ours))
                .boxed(),
        );

        if config.stdout_logs {
            layers.push(
                fmt::Layer::new()
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                    .with_ansi(config.colored_logs)
                    .with_target(true)
                    .with_filter(doclib_log_level)
                    .with_filter(filter::filter_fn(ours))
                    .boxed(),
            );
        }

        // a second library instance in the same process keeps the first subscriber
        if tracing::subscriber::set_global_default(
            tracing_subscriber::Registry::default().with(layers),
        )
        .is_err()
        {
            debug!("a global subscriber is already installed");
            return Ok(());
        }
        panic_capture(config);
    }
    Ok(())
}

fn panic_capture(config: &Config) {
    let path = config.writeable_path.clone();
    panic::set_hook(Box::new(move |panic_info| {
        let bt = Backtrace::force_capture();
        tracing::error!("panic detected: {panic_info} {}", bt);
        eprintln!("panic detected and logged: {panic_info} {bt}");
        let timestamp = Local::now().format("%Y-%m-%d---%H-%M-%S");
        let file_name = format!("{path}/panic---{timestamp}.log");
        let content = format!("INFO: {panic_info}\nBT: {bt}");

        match OpenOptions::new().create(true).append(true).open(&file_name) {
            Ok(mut file) => {
                if let Err(err) = file.write_all(content.as_bytes()) {
                    eprintln!("could not write {file_name}: {err}");
                }
            }
            Err(err) => eprintln!("could not open {file_name}: {err}"),
        }
    }));
}
