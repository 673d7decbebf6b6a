//! Delimited-file I/O for the pipeline.
//!
//! Every file read or written by orders-etl flows through this module. It
//! provides delimiter resolution by extension (`.csv` → comma, `.tsv` → tab)
//! with manual override, input decoding via `encoding_rs` (UTF-8 default),
//! the `-` path convention for standard streams, and the frame-level
//! [`read_frame()`] / [`write_frame()`] pair the pipeline core is built on.
//! The core never touches a concrete file format directly, so the delimited
//! backing store can be swapped without changing any transform.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{
    data::{self, Value},
    frame::{Column, Frame},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
    has_headers: bool,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter, has_headers))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => {
            if let Some(parent) = p.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Creating output directory {parent:?}"))?;
            }
            Box::new(BufWriter::new(
                File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
            ))
        }
        _ => Box::new(std::io::stdout()),
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Loads a delimited file into a text frame. Every cell comes in as a
/// string column; recognized null markers become null. Typing happens later
/// in the schema enforcement step.
pub fn read_frame(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Frame> {
    let mut reader = open_csv_reader_from_path(path, delimiter, true)?;
    let headers = reader_headers(&mut reader, encoding)?;
    let mut columns: Vec<Vec<Option<Value>>> = vec![Vec::new(); headers.len()];

    for (row_idx, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("Reading row {} in {path:?}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)?;
        for (col_idx, cell) in decoded.into_iter().enumerate().take(headers.len()) {
            let value = if data::is_null_marker(&cell) {
                None
            } else {
                Some(Value::Str(cell))
            };
            columns[col_idx].push(value);
        }
    }

    let mut frame = Frame::new();
    for (name, values) in headers.into_iter().zip(columns) {
        frame.push_column(Column::new(name, values))?;
    }
    Ok(frame)
}

/// Writes a frame as delimited text, nulls as empty cells, full overwrite.
pub fn write_frame(frame: &Frame, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = open_csv_writer(Some(path), delimiter)?;
    writer
        .write_record(frame.headers())
        .with_context(|| format!("Writing headers to {path:?}"))?;
    for idx in 0..frame.height() {
        writer
            .write_record(frame.render_row(idx))
            .with_context(|| format!("Writing row {} to {path:?}", idx + 1))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing output to {path:?}"))?;
    Ok(())
}
