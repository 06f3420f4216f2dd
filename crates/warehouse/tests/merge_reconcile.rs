use anyhow::Result;
use chrono::{TimeZone, Utc};
use normalizer::NormalizedRecord;
use warehouse::{PgWarehouse, TableNames, Warehouse};
use warehouse_test_fixture::WarehouseFixture;

fn record(key: &str, summary: &str, updated: &str) -> NormalizedRecord {
    NormalizedRecord {
        key: key.to_string(),
        summary: Some(summary.to_string()),
        description: None,
        issue_type: Some("Incident".to_string()),
        status: Some("Open".to_string()),
        priority: None,
        resolution: None,
        created: Some("2025-03-01T08:00:00.000+0000".to_string()),
        updated: Some(updated.to_string()),
        resolved: None,
        assignee: Some("Ada Lovelace".to_string()),
        reporter: None,
        operational_categorization: Some("Hardware > Laptop".to_string()),
        linked_intercom_conversation_ids: None,
        team: Some(vec!["Core".to_string(), "Infra".to_string()]),
        filiale: None,
        start_date: Some("2025-03-01".to_string()),
        ttr_raw_json: Some(r#"{"ongoingCycle":{"breached":false}}"#.to_string()),
        tffr_raw_json: None,
    }
}

#[tokio::test]
async fn merge_updates_matches_inserts_rest_and_clears_staging() -> Result<()> {
    let fixture = match WarehouseFixture::from_env() {
        Ok(f) => f,
        Err(err) => {
            eprintln!("skipping merge_updates_matches_inserts_rest_and_clears_staging: {err}");
            return Ok(());
        }
    };
    let handle = fixture.provision("merge").await?;
    let wh = PgWarehouse::from_pool(handle.pool().clone(), TableNames::default());

    // An empty batch is a loader-level no-op, not a zero-tuple INSERT.
    assert_eq!(wh.staging().append(&[]).await?, 0);
    assert_eq!(wh.staging().count().await?, 0);

    // First run: both keys are new.
    let first_sync = Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap();
    wh.staging()
        .append(&[
            record("OPS-1", "first summary", "2025-03-05T09:00:00.000+0000"),
            record("OPS-2", "untouched", "2025-03-05T09:05:00.000+0000"),
        ])
        .await?;
    let outcome = wh.target().merge_from_staging(first_sync).await?;
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.inserted, 2);
    assert_eq!(wh.staging().count().await?, 0);

    // Fresh inserts carry no sync stamp and no breach flag.
    let inserted = wh.target().get_by_key("OPS-1").await?.expect("row");
    assert_eq!(inserted.summary.as_deref(), Some("first summary"));
    assert_eq!(inserted.last_sync, None);
    assert_eq!(inserted.sla_breached, None);
    assert_eq!(
        inserted.team,
        Some(vec!["Core".to_string(), "Infra".to_string()])
    );

    // Second run re-fetches OPS-1 with a newer summary.
    let second_sync = Utc.with_ymd_and_hms(2025, 3, 5, 11, 0, 0).unwrap();
    wh.staging()
        .append(&[record(
            "OPS-1",
            "second summary",
            "2025-03-05T10:30:00.000+0000",
        )])
        .await?;
    let outcome = wh.target().merge_from_staging(second_sync).await?;
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.inserted, 0);

    assert_eq!(wh.target().count().await?, 2);
    let merged = wh.target().get_by_key("OPS-1").await?.expect("row");
    assert_eq!(merged.summary.as_deref(), Some("second summary"));
    assert_eq!(merged.last_sync, Some(second_sync));
    let untouched = wh.target().get_by_key("OPS-2").await?.expect("row");
    assert_eq!(untouched.summary.as_deref(), Some("untouched"));
    assert_eq!(untouched.last_sync, None);

    handle.teardown().await?;
    Ok(())
}

#[tokio::test]
async fn merge_twice_without_new_load_is_a_no_op() -> Result<()> {
    let fixture = match WarehouseFixture::from_env() {
        Ok(f) => f,
        Err(err) => {
            eprintln!("skipping merge_twice_without_new_load_is_a_no_op: {err}");
            return Ok(());
        }
    };
    let handle = fixture.provision("idem").await?;
    let wh = PgWarehouse::from_pool(handle.pool().clone(), TableNames::default());

    let sync_at = Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap();
    wh.staging()
        .append(&[record("OPS-9", "only row", "2025-03-05T09:00:00.000+0000")])
        .await?;
    wh.target().merge_from_staging(sync_at).await?;
    assert_eq!(wh.staging().count().await?, 0);
    let rows_before = wh.target().count().await?;

    let outcome = wh
        .target()
        .merge_from_staging(Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap())
        .await?;
    assert_eq!(outcome, warehouse::MergeOutcome::default());
    assert_eq!(wh.target().count().await?, rows_before);
    assert_eq!(wh.staging().count().await?, 0);

    // The empty second merge must not restamp the row.
    let row = wh.target().get_by_key("OPS-9").await?.expect("row");
    assert_eq!(row.last_sync, None);

    handle.teardown().await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_staging_keys_resolve_to_latest_update() -> Result<()> {
    let fixture = match WarehouseFixture::from_env() {
        Ok(f) => f,
        Err(err) => {
            eprintln!("skipping duplicate_staging_keys_resolve_to_latest_update: {err}");
            return Ok(());
        }
    };
    let handle = fixture.provision("dedup").await?;
    let wh = PgWarehouse::from_pool(handle.pool().clone(), TableNames::default());

    // Two overlapping runs staged the same key before either merged.
    wh.staging()
        .append(&[
            record("OPS-5", "older", "2025-03-05T09:00:00.000+0000"),
            record("OPS-5", "newer", "2025-03-05T09:30:00.000+0000"),
        ])
        .await?;
    let outcome = wh
        .target()
        .merge_from_staging(Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap())
        .await?;
    assert_eq!(outcome.inserted, 1);

    assert_eq!(wh.target().count().await?, 1);
    let row = wh.target().get_by_key("OPS-5").await?.expect("row");
    assert_eq!(row.summary.as_deref(), Some("newer"));
    assert_eq!(wh.staging().count().await?, 0);

    handle.teardown().await?;
    Ok(())
}
