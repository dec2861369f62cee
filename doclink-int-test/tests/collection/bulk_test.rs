use doclink::collection::{
    Document, DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions, DocumentUpdateOptions,
};
use doclink::common::Value;
use doclink::doc;
use doclink::errors::{error_codes, ErrorKind};
use doclink_int_test::test_util::{cleanup, create_test_context, run_test};

use super::User;

#[test]
fn test_bulk_create_reports_each_item_in_order() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&User::with_key("k2"), &DocumentCreateOptions::new())?;

            let batch = (0..5).map(|i| User::with_key(&format!("k{}", i))).collect::<Vec<_>>();
            let result = users.create_documents(&batch, &DocumentCreateOptions::new())?;

            assert_eq!(result.len(), 5);
            assert!(result.has_errors());
            assert_eq!(result.errors().count(), 1);
            for (index, item) in result.iter().enumerate() {
                if index == 2 {
                    assert_eq!(item.error().map(|e| e.kind().clone()), Some(ErrorKind::Conflict));
                } else {
                    let meta = item.success().expect("item should succeed");
                    assert_eq!(meta.key(), format!("k{}", index));
                }
            }
            assert_eq!(ctx.server().document_count("users")?, 5);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_create_empty_input() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let result = users.create_documents::<User>(&[], &DocumentCreateOptions::new())?;
            assert!(result.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_silent_create_returns_no_items() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let batch = (0..3).map(|_| User::generate()).collect::<Vec<_>>();
            let result = users.create_documents(&batch, &DocumentCreateOptions::new().silent(true))?;
            assert!(result.is_silent());
            assert!(result.is_empty());
            assert_eq!(ctx.server().document_count("users")?, 3);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_read_marks_missing_keys() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let batch = ["a", "b"].iter().map(|key| User::with_key(key)).collect::<Vec<_>>();
            users.create_documents(&batch, &DocumentCreateOptions::new())?;

            let result = users.read_documents::<User, _>(&["a", "missing", "b"], &DocumentReadOptions::new())?;
            assert_eq!(result.len(), 3);
            assert_eq!(result.get(0).and_then(|i| i.success()).and_then(|u| u.key.clone()), Some("a".into()));
            assert_eq!(
                result.get(1).and_then(|i| i.error()).map(|e| e.kind().clone()),
                Some(ErrorKind::NotFound)
            );
            assert_eq!(result.get(2).and_then(|i| i.success()).and_then(|u| u.key.clone()), Some("b".into()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_update_requires_keys() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&doc! { "_key": "x", "n": 1 }, &DocumentCreateOptions::new())?;

            let patches = vec![doc! { "_key": "x", "n": 2 }, doc! { "n": 3 }, doc! { "_key": "y", "n": 4 }];
            let result = users.update_documents(&patches, &DocumentUpdateOptions::new())?;
            assert_eq!(result.len(), 3);
            assert!(result.get(0).map(|i| i.is_success()).unwrap_or(false));
            assert_eq!(
                result.get(1).and_then(|i| i.error()).map(|e| e.kind().clone()),
                Some(ErrorKind::Invalid)
            );
            assert_eq!(
                result.get(2).and_then(|i| i.error()).map(|e| e.kind().clone()),
                Some(ErrorKind::NotFound)
            );

            let stored: Document = users.read_document("x", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("n"), Some(&Value::from(2)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_delete_mixed() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let batch = (0..3).map(|i| User::with_key(&format!("d{}", i))).collect::<Vec<_>>();
            users.create_documents(&batch, &DocumentCreateOptions::new())?;

            let result =
                users.delete_documents::<User, _>(&["d0", "nope", "d2"], &DocumentDeleteOptions::new())?;
            assert_eq!(result.len(), 3);
            assert_eq!(result.successes().count(), 2);
            assert_eq!(result.errors().count(), 1);
            assert_eq!(ctx.server().document_count("users")?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_read_and_delete_reject_malformed_keys_per_slot() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&User::with_key("ok"), &DocumentCreateOptions::new())?;
            let keys = ["ok", "", "a/b", "bad key"];

            let read = users.read_documents::<User, _>(&keys, &DocumentReadOptions::new())?;
            assert_eq!(read.len(), 4);
            assert_eq!(read.successes().count(), 1);
            for err in read.errors() {
                assert_eq!(err.kind(), &ErrorKind::Invalid);
                assert_eq!(err.error_num(), Some(error_codes::DOCUMENT_KEY_BAD));
            }

            let deleted = users.delete_documents::<User, _>(&keys, &DocumentDeleteOptions::new())?;
            assert_eq!(deleted.len(), 4);
            assert_eq!(deleted.get(0).unwrap().success().unwrap().key(), "ok");
            assert_eq!(deleted.errors().count(), 3);
            for err in deleted.errors() {
                assert_eq!(err.kind(), &ErrorKind::Invalid);
                assert_eq!(err.error_num(), Some(error_codes::DOCUMENT_KEY_BAD));
            }
            assert_eq!(ctx.server().document_count("users")?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
