use doclink::collection::{Document, DocumentCreateOptions, DocumentReadOptions};
use doclink::common::Value;
use doclink::doc;
use doclink::errors::ErrorKind;
use doclink::policy::OverwriteMode;
use doclink_int_test::test_util::{cleanup, create_test_context, run_test};

use super::User;

#[test]
fn test_default_mode_conflicts_on_duplicate_key() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&User::with_key("dup"), &DocumentCreateOptions::new())?;
            let err = users
                .create_document(&User::with_key("dup"), &DocumentCreateOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Conflict);
            assert_eq!(ctx.server().document_count("users")?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_ignore_keeps_stored_revision() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let options = DocumentCreateOptions::new().overwrite_mode(OverwriteMode::Ignore);
            let original = User::with_key("same");
            let first = users.create_document(&original, &options)?;
            let second = users.create_document(&User::with_key("same"), &options)?;
            let third = users.create_document(&User::with_key("same"), &options)?;

            assert_eq!(first.rev(), second.rev());
            assert_eq!(second.rev(), third.rev());

            let stored: User = users.read_document("same", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.name, original.name);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_replace_mode_overwrites_whole_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let first = users.create_document(&doc! { "_key": "r", "a": 1 }, &DocumentCreateOptions::new())?;
            let second = users.create_document(
                &doc! { "_key": "r", "b": 2 },
                &DocumentCreateOptions::new().overwrite_mode(OverwriteMode::Replace),
            )?;
            assert_ne!(first.rev(), second.rev());
            assert_eq!(second.old_rev(), Some(first.rev()));

            let stored: Document = users.read_document("r", &DocumentReadOptions::new())?.expect("exists");
            assert!(!stored.contains_key("a"));
            assert_eq!(stored.get("b"), Some(&Value::from(2)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_mode_merges_into_stored_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&doc! { "_key": "u", "a": 1 }, &DocumentCreateOptions::new())?;
            let meta = users.create_document(
                &doc! { "_key": "u", "b": 2 },
                &DocumentCreateOptions::new()
                    .overwrite_mode(OverwriteMode::Update)
                    .return_old(true)
                    .return_new(true),
            )?;
            assert!(meta.old_document().map(|old| !old.contains_key("b")).unwrap_or(false));
            let new = meta.new_document().expect("new document requested");
            assert_eq!(new.get("a"), Some(&Value::from(1)));
            assert_eq!(new.get("b"), Some(&Value::from(2)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_version_attribute_discards_stale_write() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let options = DocumentCreateOptions::new()
                .overwrite_mode(OverwriteMode::Replace)
                .version_attribute("version");
            let created = users.create_document(&doc! { "_key": "v", "version": 2, "x": "a" }, &options)?;

            let stale = users.create_document(&doc! { "_key": "v", "version": 1, "x": "b" }, &options)?;
            assert_eq!(stale.rev(), created.rev());
            let equal = users.create_document(&doc! { "_key": "v", "version": 2, "x": "c" }, &options)?;
            assert_eq!(equal.rev(), created.rev());
            let stored: Document = users.read_document("v", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("x"), Some(&Value::from("a")));

            let newer = users.create_document(&doc! { "_key": "v", "version": 3, "x": "d" }, &options)?;
            assert_ne!(newer.rev(), created.rev());
            let stored: Document = users.read_document("v", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("x"), Some(&Value::from("d")));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_conflict_mode_ignores_version_attribute() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let options = DocumentCreateOptions::new()
                .overwrite_mode(OverwriteMode::Conflict)
                .version_attribute("version");
            users.create_document(&doc! { "_key": "c", "version": 5 }, &options)?;
            let err = users
                .create_document(&doc! { "_key": "c", "version": 1 }, &options)
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Conflict);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
