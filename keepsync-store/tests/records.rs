//! Record engine against a live database.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p keepsync-store -- --ignored

use keepsync_store::{
    Card, Credential, Fields, Keeper, KeeperError, OpContext, RecordTable, Result, TextNote,
    UserId,
};
use sqlx::PgPool;

fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn seed_user(keeper: &Keeper, name: &str) -> Result<UserId> {
    keeper
        .users()
        .add_user(&OpContext::background(), name, "hash")
        .await
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn add_update_delete_roundtrip(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let records = keeper.records();

    let added = records
        .add_record(
            &ctx,
            RecordTable::TextData,
            alice,
            "e1",
            &fields(&[("data", "secret"), ("metadata", "m")]),
        )
        .await?;
    assert_eq!(added, 1);

    let rows = records
        .get_all_records(&ctx, RecordTable::TextData, alice, None, false)
        .await?;
    assert_eq!(rows.len(), 1);
    let first = &rows[0];
    assert_eq!(first.id(), Some("e1"));
    assert_eq!(first.user_id(), Some(alice));
    assert_eq!(first.get("data"), Some("secret"));
    assert_eq!(first.get("metadata"), Some("m"));
    assert!(!first.is_deleted());
    let created = first.updated_at().expect("updated_at is set");

    let updated = records
        .update_record(
            &ctx,
            RecordTable::TextData,
            alice,
            "e1",
            &fields(&[("data", "new")]),
        )
        .await?;
    assert_eq!(updated, 1);

    let rows = records
        .get_all_records(&ctx, RecordTable::TextData, alice, None, false)
        .await?;
    assert_eq!(rows[0].get("data"), Some("new"));
    assert_eq!(rows[0].get("metadata"), Some("m"));
    let after_update = rows[0].updated_at().expect("updated_at is set");
    assert!(after_update > created);

    let deleted = records
        .delete_record(&ctx, RecordTable::TextData, alice, "e1")
        .await?;
    assert_eq!(deleted, 1);

    let live = records
        .get_all_records(&ctx, RecordTable::TextData, alice, None, false)
        .await?;
    assert!(live.is_empty());

    let all = records
        .get_all_records(&ctx, RecordTable::TextData, alice, None, true)
        .await?;
    assert_eq!(all.len(), 1);
    assert!(all[0].is_deleted());
    assert!(all[0].updated_at().expect("updated_at is set") > after_update);
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn since_returns_only_later_changes(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let records = keeper.records();

    for id in ["a", "b"] {
        records
            .add_record(&ctx, RecordTable::TextData, alice, id, &fields(&[("data", id)]))
            .await?;
    }
    let snapshot = records
        .get_all_records(&ctx, RecordTable::TextData, alice, None, true)
        .await?;
    let watermark = snapshot
        .iter()
        .filter_map(|r| r.updated_at())
        .max()
        .expect("two records");

    // Nothing changed since the watermark, and asking twice gives the same answer.
    for _ in 0..2 {
        let delta = records
            .get_all_records(&ctx, RecordTable::TextData, alice, Some(watermark), true)
            .await?;
        assert!(delta.is_empty());
    }

    records
        .update_record(&ctx, RecordTable::TextData, alice, "a", &fields(&[("data", "a2")]))
        .await?;
    let delta = records
        .get_all_records(&ctx, RecordTable::TextData, alice, Some(watermark), true)
        .await?;
    assert_eq!(delta.len(), 1);
    assert_eq!(delta[0].id(), Some("a"));
    assert_eq!(delta[0].get("data"), Some("a2"));
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn records_are_scoped_to_owner(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let bob = seed_user(&keeper, "bob").await?;
    let records = keeper.records();

    records
        .add_record(&ctx, RecordTable::TextData, alice, "e1", &fields(&[("data", "x")]))
        .await?;

    let theirs = records
        .get_all_records(&ctx, RecordTable::TextData, bob, None, true)
        .await?;
    assert!(theirs.is_empty());

    // Another user's id matches nothing and is not an error.
    let affected = records
        .update_record(&ctx, RecordTable::TextData, bob, "e1", &fields(&[("data", "y")]))
        .await?;
    assert_eq!(affected, 0);
    let affected = records
        .delete_record(&ctx, RecordTable::TextData, bob, "e1")
        .await?;
    assert_eq!(affected, 0);
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn constraint_violations(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let records = keeper.records();

    records
        .add_record(&ctx, RecordTable::TextData, alice, "e1", &fields(&[("data", "x")]))
        .await?;
    let err = records
        .add_record(&ctx, RecordTable::TextData, alice, "e1", &fields(&[("data", "y")]))
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::ConstraintViolation { .. }), "{err}");

    let err = records
        .add_record(
            &ctx,
            RecordTable::TextData,
            UserId::new(9_999),
            "e2",
            &fields(&[("data", "z")]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::ConstraintViolation { .. }), "{err}");
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn null_columns_stay_null(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let records = keeper.records();

    records
        .add_record(&ctx, RecordTable::Credentials, alice, "l1", &fields(&[("login", "")]))
        .await?;
    let rows = records
        .get_all_records(&ctx, RecordTable::Credentials, alice, None, false)
        .await?;
    let row = &rows[0];
    assert_eq!(row.get("login"), Some(""));
    assert!(!row.is_null("login"));
    assert!(row.is_null("password"));

    let flat = row.to_string_map();
    assert_eq!(flat["login"], "");
    assert_eq!(flat["password"], "");
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn catalog_columns_follow_convention(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();

    for table in RecordTable::ALL {
        let columns = keeper.records().table_columns(&ctx, table).await?;
        for required in ["id", "user_id", "updated_at", "deleted"] {
            assert!(columns.iter().any(|c| c == required), "{table}: {required}");
        }
        for data in table.data_columns() {
            assert!(columns.iter().any(|c| c == data), "{table}: {data}");
        }
    }
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn typed_shapes(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let records = keeper.records();

    let note = TextNote {
        id: "n1".into(),
        data: "hello".into(),
        ..Default::default()
    };
    let card = Card {
        id: "c1".into(),
        number: "4111111111111111".into(),
        holder: "ALICE".into(),
        expiry: "12/30".into(),
        cvv: "123".into(),
        metadata: Some("personal".into()),
        ..Default::default()
    };
    let login = Credential {
        id: "l1".into(),
        login: "alice@example.com".into(),
        password: "pw".into(),
        ..Default::default()
    };

    records.add(&ctx, alice, &note).await?;
    records.add(&ctx, alice, &card).await?;
    records.add(&ctx, alice, &login).await?;

    let notes: Vec<TextNote> = records.fetch(&ctx, alice, None, false).await?;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].data, "hello");
    assert_eq!(notes[0].metadata, None);
    assert!(notes[0].sync.updated_at.is_some());

    let cards: Vec<Card> = records.fetch(&ctx, alice, None, false).await?;
    assert_eq!(cards[0].holder, "ALICE");
    assert_eq!(cards[0].metadata.as_deref(), Some("personal"));

    let changed = Credential {
        password: "pw2".into(),
        ..login
    };
    assert_eq!(records.update(&ctx, alice, &changed).await?, 1);
    let logins: Vec<Credential> = records.fetch(&ctx, alice, None, false).await?;
    assert_eq!(logins[0].password, "pw2");
    Ok(())
}

#[sqlx::test(migrator = "keepsync_store::MIGRATOR")]
#[ignore = "requires database"]
async fn update_after_delete_passes_delete_watermark(pool: PgPool) -> Result<()> {
    let keeper = Keeper::from_pool(pool);
    let ctx = OpContext::background();
    let alice = seed_user(&keeper, "alice").await?;
    let records = keeper.records();

    for id in ["gone", "kept"] {
        records
            .add_record(&ctx, RecordTable::TextData, alice, id, &fields(&[("data", id)]))
            .await?;
    }

    records
        .delete_record(&ctx, RecordTable::TextData, alice, "gone")
        .await?;
    let synced = records
        .get_all_records(&ctx, RecordTable::TextData, alice, None, true)
        .await?;
    let watermark = synced
        .iter()
        .filter_map(|r| r.updated_at())
        .max()
        .expect("two records");
    let deleted_at = synced
        .iter()
        .find(|r| r.id() == Some("gone"))
        .and_then(|r| r.updated_at())
        .expect("deleted record is still readable");
    assert_eq!(watermark, deleted_at);

    records
        .update_record(&ctx, RecordTable::TextData, alice, "kept", &fields(&[("data", "v2")]))
        .await?;
    let delta = records
        .get_all_records(&ctx, RecordTable::TextData, alice, Some(watermark), true)
        .await?;
    assert_eq!(delta.len(), 1);
    assert_eq!(delta[0].id(), Some("kept"));
    assert!(delta[0].updated_at().expect("updated_at is set") > watermark);
    Ok(())
}
