use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Batch ETL for order analytics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: clean, join, enrich, and write outputs
    Run(RunArgs),
    /// Print a per-column missing-value report for a delimited file
    Missing(MissingArgs),
    /// Preview the first few rows of a delimited file in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Raw orders file (order_id, user_id, amount, quantity, status, created_at)
    #[arg(long = "orders")]
    pub orders: PathBuf,
    /// Raw users file (user_id, country, signup_date)
    #[arg(long = "users")]
    pub users: PathBuf,
    /// Directory for all output artifacts
    #[arg(short = 'o', long = "out-dir")]
    pub out_dir: PathBuf,
    /// Optional YAML settings file overriding the pipeline defaults
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,
    /// Delimiter for both input files (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct MissingArgs {
    /// Input file to profile
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Optional CSV destination for the report (stdout table otherwise)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
