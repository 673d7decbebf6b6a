mod common;

use common::TestWorkspace;
use encoding_rs::UTF_8;
use orders_etl::config::{EtlConfig, Settings};
use orders_etl::data::Value;
use orders_etl::etl;
use orders_etl::io_utils::read_frame;

fn config_for(workspace: &TestWorkspace, orders: &std::path::Path, users: &std::path::Path) -> EtlConfig {
    EtlConfig::with_out_dir(orders, users, &workspace.path().join("processed"))
}

#[test]
fn full_run_produces_the_expected_analytics_row() {
    let workspace = TestWorkspace::new();
    let orders = workspace.write(
        "orders.csv",
        "order_id,user_id,amount,quantity,status,created_at\n\
         1,u1,10.5,2,Paid ,2024-01-05T10:00:00Z\n",
    );
    let users = workspace.write(
        "users.csv",
        "user_id,country,signup_date\nu1,US,2023-01-01\n",
    );
    let cfg = config_for(&workspace, &orders, &users);

    etl::run(&cfg, &Settings::default(), None, UTF_8).expect("pipeline run");

    let analytics = read_frame(&cfg.out_analytics, b',', UTF_8).expect("read analytics");
    assert_eq!(analytics.height(), 1);

    let cell = |name: &str| {
        analytics
            .column(name)
            .unwrap_or_else(|| panic!("missing column {name}"))
            .values[0]
            .clone()
    };
    assert_eq!(cell("status_clean"), Some(Value::Str("paid".to_string())));
    assert_eq!(cell("month"), Some(Value::Str("2024-01".to_string())));
    assert_eq!(cell("dow"), Some(Value::Str("Friday".to_string())));
    assert_eq!(cell("hour"), Some(Value::Str("10".to_string())));
    assert_eq!(cell("country"), Some(Value::Str("US".to_string())));
    assert_eq!(
        cell("amount__is_outlier"),
        Some(Value::Str("false".to_string()))
    );
    assert_eq!(cell("amount_winsor"), Some(Value::Str("10.5".to_string())));
}

#[test]
fn full_run_writes_every_artifact_and_metadata() {
    let workspace = TestWorkspace::new();
    let orders = workspace.write_orders();
    let users = workspace.write_users();
    let cfg = config_for(&workspace, &orders, &users);

    etl::run(&cfg, &Settings::default(), None, UTF_8).expect("pipeline run");

    for path in [
        &cfg.out_analytics,
        &cfg.out_orders_clean,
        &cfg.out_users,
        &cfg.out_summary,
        &cfg.out_missingness,
        &cfg.run_meta,
    ] {
        assert!(path.exists(), "missing artifact {path:?}");
    }

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&cfg.run_meta).unwrap()).unwrap();
    assert_eq!(meta["rows_in_orders_raw"], 2);
    assert_eq!(meta["rows_in_users"], 2);
    assert_eq!(meta["rows_out_analytics"], 2);
    assert_eq!(meta["missing_created_at"], 0);
    assert_eq!(meta["country_match_rate"], 1.0);
    assert!(meta["timestamp"].as_str().unwrap().contains('T'));
    assert!(meta["config"]["settings"]["status_map"]["refunded"] == "refund");

    // orders-only view drops user-side columns
    let orders_clean = read_frame(&cfg.out_orders_clean, b',', UTF_8).unwrap();
    assert!(orders_clean.column("country").is_none());
    assert!(orders_clean.column("status_clean").is_some());
}

#[test]
fn rerunning_the_pipeline_is_idempotent_for_tables() {
    let workspace = TestWorkspace::new();
    let orders = workspace.write_orders();
    let users = workspace.write_users();
    let cfg = config_for(&workspace, &orders, &users);

    etl::run(&cfg, &Settings::default(), None, UTF_8).expect("first run");
    let first = std::fs::read_to_string(&cfg.out_analytics).unwrap();
    etl::run(&cfg, &Settings::default(), None, UTF_8).expect("second run");
    let second = std::fs::read_to_string(&cfg.out_analytics).unwrap();
    assert_eq!(first, second);
}

#[test]
fn duplicate_user_key_aborts_before_any_output() {
    let workspace = TestWorkspace::new();
    let orders = workspace.write_orders();
    let users = workspace.write(
        "users.csv",
        "user_id,country,signup_date\n\
         u1,US,2023-01-01\n\
         u1,CA,2023-02-01\n",
    );
    let cfg = config_for(&workspace, &orders, &users);

    let err = etl::run(&cfg, &Settings::default(), None, UTF_8).unwrap_err();
    assert!(err.to_string().contains("not unique"));

    for path in [
        &cfg.out_analytics,
        &cfg.out_orders_clean,
        &cfg.out_users,
        &cfg.out_summary,
        &cfg.run_meta,
    ] {
        assert!(!path.exists(), "unexpected artifact {path:?}");
    }
}

#[test]
fn missing_required_column_aborts_with_a_named_check() {
    let workspace = TestWorkspace::new();
    let orders = workspace.write(
        "orders.csv",
        "order_id,user_id,amount,quantity,created_at\n1,u1,10.5,2,2024-01-05T10:00:00Z\n",
    );
    let users = workspace.write_users();
    let cfg = config_for(&workspace, &orders, &users);

    let err = etl::run(&cfg, &Settings::default(), None, UTF_8).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("orders_raw"));
    assert!(message.contains("status"));
}

#[test]
fn null_markers_become_missing_values_end_to_end() {
    let workspace = TestWorkspace::new();
    let orders = workspace.write(
        "orders.csv",
        "order_id,user_id,amount,quantity,status,created_at\n\
         1,u1,NA,2,Paid,2024-01-05T10:00:00Z\n\
         2,u1,20.0,N/A,null,None\n",
    );
    let users = workspace.write(
        "users.csv",
        "user_id,country,signup_date\nu1,US,2023-01-01\n",
    );
    let cfg = config_for(&workspace, &orders, &users);

    etl::run(&cfg, &Settings::default(), None, UTF_8).expect("pipeline run");
    let analytics = read_frame(&cfg.out_analytics, b',', UTF_8).unwrap();

    let isna = analytics.column("amount__isna").unwrap();
    assert_eq!(isna.values[0], Some(Value::Str("true".to_string())));
    assert_eq!(isna.values[1], Some(Value::Str("false".to_string())));
    assert_eq!(analytics.column("quantity").unwrap().values[1], None);
    assert_eq!(analytics.column("month").unwrap().values[1], None);

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&cfg.run_meta).unwrap()).unwrap();
    assert_eq!(meta["missing_created_at"], 1);
}
