//! Pipeline orchestration: load → gate → transform → join → enrich → save →
//! record metadata.
//!
//! Output files are only written once the post-join gate has passed, so a
//! failing run leaves no partial artifacts behind.

use std::fs;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use encoding_rs::Encoding;
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::{EtlConfig, Settings},
    data::Value,
    frame::{Column, Frame},
    io_utils,
    join::{JoinValidate, safe_left_join},
    missing::{add_missing_flags, missingness_report},
    outliers::{add_outlier_flag, winsorize},
    quality::{self, QualityError},
    schema::enforce_schema,
    temporal::{add_time_parts, parse_datetime},
    text::{apply_mapping, normalize_text},
};

pub const ORDER_COLUMNS: &[&str] = &[
    "order_id",
    "user_id",
    "amount",
    "quantity",
    "status",
    "created_at",
];
pub const USER_COLUMNS: &[&str] = &["user_id", "country", "signup_date"];

const JOIN_KEY: &str = "user_id";

#[derive(Debug, Serialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub timestamp: String,
    pub rows_in_orders_raw: usize,
    pub rows_in_users: usize,
    pub rows_out_analytics: usize,
    pub missing_created_at: Option<usize>,
    pub country_match_rate: Option<f64>,
    pub config: ConfigSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ConfigSnapshot {
    pub paths: EtlConfig,
    pub settings: Settings,
}

pub fn load_inputs(
    cfg: &EtlConfig,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<(Frame, Frame)> {
    info!(
        "Loading inputs from {:?} and {:?}",
        cfg.raw_orders, cfg.raw_users
    );
    let orders_delimiter = io_utils::resolve_input_delimiter(&cfg.raw_orders, delimiter);
    let users_delimiter = io_utils::resolve_input_delimiter(&cfg.raw_users, delimiter);
    let orders = io_utils::read_frame(&cfg.raw_orders, orders_delimiter, encoding)
        .with_context(|| format!("Reading orders from {:?}", cfg.raw_orders))?;
    let users = io_utils::read_frame(&cfg.raw_users, users_delimiter, encoding)
        .with_context(|| format!("Reading users from {:?}", cfg.raw_users))?;
    Ok((orders, users))
}

/// The transform-and-join core. Pure: consumes nothing, returns the
/// analytics frame or the first gate violation.
pub fn transform(orders_raw: &Frame, users: &Frame, settings: &Settings) -> Result<Frame> {
    quality::require_columns(orders_raw, "orders_raw", ORDER_COLUMNS)?;
    quality::require_columns(users, "users", USER_COLUMNS)?;
    quality::assert_non_empty(orders_raw, "orders_raw")?;
    quality::assert_non_empty(users, "users")?;

    // The "one" side must be unique for a many->one join
    quality::assert_unique_key(users, JOIN_KEY, false)?;

    info!("Cleaning orders");
    let orders = enforce_schema(orders_raw.clone())?;
    if let Some(max_amount) = settings.max_amount {
        quality::assert_in_range(orders.require_column("amount")?, 0.0, max_amount, "amount")?;
    }

    let status_clean = apply_mapping(
        &normalize_text(orders.require_column("status")?),
        &settings.status_map,
    )
    .renamed("status_clean");
    let orders = orders.with_column(status_clean)?;
    let orders = add_missing_flags(orders, &["amount", "quantity"])?;
    let orders = parse_datetime(orders, "created_at", settings.assume_utc)?;
    let orders = add_time_parts(orders, "created_at")?;

    info!("Joining orders with users");
    let joined = safe_left_join(
        &orders,
        users,
        &[JOIN_KEY],
        JoinValidate::ManyToOne,
        ("", "_user"),
    )?;

    // A left join must never change the row count
    if joined.height() != orders.height() {
        return Err(QualityError::RowCountChanged {
            on: JOIN_KEY.to_string(),
            before: orders.height(),
            after: joined.height(),
        }
        .into());
    }

    info!("Adding outlier flags and winsorized amount");
    let amount_winsor = winsorize(
        joined.require_column("amount")?,
        settings.winsor_lo,
        settings.winsor_hi,
    )
    .renamed("amount_winsor");
    let joined = joined.with_column(amount_winsor)?;
    add_outlier_flag(joined, "amount", settings.outlier_k)
}

/// The analytics table minus the user-side columns: an orders-only view.
fn orders_view(analytics: &Frame, users: &Frame) -> Frame {
    let mut user_side: Vec<String> = users
        .headers()
        .into_iter()
        .filter(|name| name != JOIN_KEY)
        .collect();
    user_side.extend(
        analytics
            .headers()
            .into_iter()
            .filter(|name| name.ends_with("_user")),
    );
    analytics.clone().drop_columns(&user_side)
}

pub fn write_outputs(
    analytics: &Frame,
    users: &Frame,
    rows_in_orders_raw: usize,
    cfg: &EtlConfig,
) -> Result<()> {
    let delimiter = io_utils::DEFAULT_CSV_DELIMITER;

    info!("Writing processed users to {:?}", cfg.out_users);
    io_utils::write_frame(users, &cfg.out_users, delimiter)?;

    info!("Writing analytics table to {:?}", cfg.out_analytics);
    io_utils::write_frame(analytics, &cfg.out_analytics, delimiter)?;

    let orders_clean = orders_view(analytics, users);
    info!("Writing clean orders to {:?}", cfg.out_orders_clean);
    io_utils::write_frame(&orders_clean, &cfg.out_orders_clean, delimiter)?;

    info!("Writing missingness report to {:?}", cfg.out_missingness);
    let report = missingness_frame(analytics);
    io_utils::write_frame(&report, &cfg.out_missingness, delimiter)?;

    info!("Writing run summary to {:?}", cfg.out_summary);
    let summary = summary_frame(analytics, users, rows_in_orders_raw);
    io_utils::write_frame(&summary, &cfg.out_summary, delimiter)?;
    Ok(())
}

fn missingness_frame(frame: &Frame) -> Frame {
    let stats = missingness_report(frame);
    let mut report = Frame::new();
    let column = |name: &str, values: Vec<Option<Value>>| Column::new(name, values);
    report
        .push_column(column(
            "column",
            stats
                .iter()
                .map(|s| Some(Value::Str(s.column.clone())))
                .collect(),
        ))
        .expect("fresh frame");
    report
        .push_column(column(
            "missing",
            stats
                .iter()
                .map(|s| Some(Value::Int(s.missing as i64)))
                .collect(),
        ))
        .expect("equal length");
    report
        .push_column(column(
            "proportion",
            stats
                .iter()
                .map(|s| Some(Value::Float(s.proportion)))
                .collect(),
        ))
        .expect("equal length");
    report
}

fn summary_frame(analytics: &Frame, users: &Frame, rows_in_orders_raw: usize) -> Frame {
    let match_rate = country_match_rate(analytics);
    let rows: Vec<(&str, Value)> = vec![
        ("rows_in_orders_raw", Value::Int(rows_in_orders_raw as i64)),
        ("rows_in_users", Value::Int(users.height() as i64)),
        ("rows_out_analytics", Value::Int(analytics.height() as i64)),
        (
            "missing_created_at",
            Value::Int(missing_created_at(analytics).unwrap_or(0) as i64),
        ),
        (
            "country_match_rate",
            Value::Float(match_rate.unwrap_or(0.0)),
        ),
    ];
    let mut summary = Frame::new();
    summary
        .push_column(Column::new(
            "metric",
            rows.iter()
                .map(|(name, _)| Some(Value::Str(name.to_string())))
                .collect(),
        ))
        .expect("fresh frame");
    summary
        .push_column(Column::new(
            "value",
            rows.into_iter().map(|(_, value)| Some(value)).collect(),
        ))
        .expect("equal length");
    summary
}

fn missing_created_at(analytics: &Frame) -> Option<usize> {
    analytics.column("created_at").map(Column::null_count)
}

fn country_match_rate(analytics: &Frame) -> Option<f64> {
    let column = analytics.column("country")?;
    if analytics.height() == 0 {
        return None;
    }
    Some(1.0 - column.null_count() as f64 / analytics.height() as f64)
}

pub fn build_run_meta(
    cfg: &EtlConfig,
    settings: &Settings,
    orders_raw: &Frame,
    users: &Frame,
    analytics: &Frame,
) -> RunMeta {
    RunMeta {
        run_id: Uuid::new_v4(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        rows_in_orders_raw: orders_raw.height(),
        rows_in_users: users.height(),
        rows_out_analytics: analytics.height(),
        missing_created_at: missing_created_at(analytics),
        country_match_rate: country_match_rate(analytics),
        config: ConfigSnapshot {
            paths: cfg.clone(),
            settings: settings.clone(),
        },
    }
}

pub fn write_run_meta(
    cfg: &EtlConfig,
    settings: &Settings,
    orders_raw: &Frame,
    users: &Frame,
    analytics: &Frame,
) -> Result<()> {
    let meta = build_run_meta(cfg, settings, orders_raw, users, analytics);
    info!("Writing run metadata to {:?}", cfg.run_meta);
    if let Some(parent) = cfg.run_meta.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating metadata directory {parent:?}"))?;
    }
    let payload = serde_json::to_string_pretty(&meta).context("Serializing run metadata")?;
    fs::write(&cfg.run_meta, payload)
        .with_context(|| format!("Writing run metadata to {:?}", cfg.run_meta))?;
    Ok(())
}

/// Runs the whole pipeline. Fails fast: no output file exists unless every
/// gate passed.
pub fn run(
    cfg: &EtlConfig,
    settings: &Settings,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<()> {
    info!("Starting ETL run");
    let (orders_raw, users) = load_inputs(cfg, delimiter, encoding)?;

    info!(
        "Transforming (orders={}, users={})",
        orders_raw.height(),
        users.height()
    );
    let analytics = transform(&orders_raw, &users, settings)?;

    write_outputs(&analytics, &users, orders_raw.height(), cfg)?;
    write_run_meta(cfg, settings, &orders_raw, &users, &analytics)?;
    info!("ETL run complete");
    Ok(())
}
