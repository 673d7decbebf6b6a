pub mod cli;
pub mod config;
pub mod data;
pub mod etl;
pub mod frame;
pub mod io_utils;
pub mod join;
pub mod missing;
pub mod outliers;
pub mod quality;
pub mod schema;
pub mod table;
pub mod temporal;
pub mod text;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, MissingArgs, PreviewArgs, RunArgs},
    config::{EtlConfig, Settings},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("orders_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(&args),
        Commands::Missing(args) => handle_missing(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let settings = match &args.settings {
        Some(path) => {
            Settings::load(path).with_context(|| format!("Loading settings from {path:?}"))?
        }
        None => Settings::default(),
    };
    let cfg = EtlConfig::with_out_dir(&args.orders, &args.users, &args.out_dir);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    etl::run(&cfg, &settings, args.delimiter, encoding)
}

fn handle_missing(args: &MissingArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let frame = io_utils::read_frame(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading {:?}", args.input))?;
    let stats = missing::missingness_report(&frame);

    let headers = vec![
        "column".to_string(),
        "missing".to_string(),
        "proportion".to_string(),
    ];
    let rows = missing::report_rows(&stats);
    if let Some(output) = &args.output {
        let mut writer = io_utils::open_csv_writer(Some(output.as_path()), b',')?;
        writer
            .write_record(&headers)
            .context("Writing report headers")?;
        for row in &rows {
            writer.write_record(row).context("Writing report row")?;
        }
        writer.flush().context("Flushing report output")?;
        info!("Wrote missingness report for {} column(s) to {output:?}", stats.len());
    } else {
        table::print_table(&headers, &rows);
        info!("Profiled {} column(s) from {:?}", stats.len(), args.input);
    }
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();

    for (idx, record) in reader.byte_records().enumerate() {
        if idx >= args.rows {
            break;
        }
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)?;
        rows.push(decoded);
    }

    table::print_table(&headers, &rows);
    info!("Displayed {} row(s) from {:?}", rows.len(), args.input);
    Ok(())
}
