use rust_sqlite_wrapper::{Database, Error, LedgerRecord, Result, LEDGER_TABLE};

fn ledger(seq_no: u64, time: u64, hash: &str) -> LedgerRecord {
    LedgerRecord {
        seq_no,
        time,
        ledger_hash: hash.to_string(),
        prev_ledger_hash: hash.to_string(),
        data_hash: hash.to_string(),
        state_hash: hash.to_string(),
        patch_hash: hash.to_string(),
        user_hash: hash.to_string(),
        input_hash: hash.to_string(),
        output_hash: hash.to_string(),
    }
}

fn create_ledger_db() -> Result<Database> {
    let db = Database::open_in_memory()?;
    db.create_ledger_table()?;
    Ok(db)
}

#[tokio::test]
async fn test_insert_ledger_row() {
    test_insert_ledger_row_impl().unwrap();
}

fn test_insert_ledger_row_impl() -> Result<()> {
    let db = create_ledger_db()?;
    db.insert_ledger_row(&ledger(1, 1, "test"))?;

    let rows = db.select_all(LEDGER_TABLE)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["seq_no"], "1");
    assert_eq!(rows[0]["time"], "1");
    assert_eq!(rows[0]["output_hash"], "test");
    assert_eq!(rows[0].len(), 10);
    Ok(())
}

#[test]
fn test_ledger_table_already_exists() {
    let db = create_ledger_db().unwrap();
    assert!(db.table_exists(LEDGER_TABLE).unwrap());
    assert!(matches!(
        db.create_ledger_table(),
        Err(Error::Execute { .. })
    ));
}

#[test]
fn test_duplicate_seq_no_rejected() {
    let db = create_ledger_db().unwrap();
    db.insert_ledger_row(&ledger(1, 100, "a")).unwrap();
    assert!(matches!(
        db.insert_ledger_row(&ledger(1, 200, "b")),
        Err(Error::Execute { .. })
    ));
    assert_eq!(db.select_ledger().unwrap(), vec![ledger(1, 100, "a")]);
}

#[test]
fn test_select_ledger_in_sequence_order() {
    let db = create_ledger_db().unwrap();
    let hash = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
    for seq_no in [3, 1, 2] {
        db.insert_ledger_row(&ledger(seq_no, 1_700_000_000 + seq_no, hash))
            .unwrap();
    }

    let records = db.select_ledger().unwrap();
    let seq: Vec<u64> = records.iter().map(|r| r.seq_no).collect();
    assert_eq!(seq, vec![1, 2, 3]);
    assert_eq!(records[2], ledger(3, 1_700_000_003, hash));
}

#[test]
fn test_hash_with_quote_round_trips() {
    let db = create_ledger_db().unwrap();
    let record = ledger(5, 5, "it's");
    db.insert_ledger_row(&record).unwrap();
    assert_eq!(db.select_ledger().unwrap(), vec![record]);
}

#[test]
fn test_out_of_range_sequence_number() {
    let db = create_ledger_db().unwrap();
    let err = db.insert_ledger_row(&ledger(u64::MAX, 1, "test")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(db.select_ledger().unwrap().is_empty());
}

#[test]
fn test_ledger_record_serde() -> anyhow::Result<()> {
    let record = ledger(2, 42, "abc");
    let json = serde_json::to_string(&record)?;
    assert!(json.contains("\"prev_ledger_hash\":\"abc\""));
    let back: LedgerRecord = serde_json::from_str(&json)?;
    assert_eq!(back, record);
    Ok(())
}
