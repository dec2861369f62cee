use doclink::collection::{
    Document, DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions, DocumentReplaceOptions,
    DocumentUpdateOptions,
};
use doclink::common::Value;
use doclink::doc;
use doclink::errors::{error_codes, ErrorKind};
use doclink_int_test::test_util::{cleanup, create_test_context, run_test};

use super::User;

#[test]
fn test_create_then_read_carries_revision() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let user = User::with_key("alice");
            let meta = users.create_document(&user, &DocumentCreateOptions::new())?;
            assert_eq!(meta.key(), "alice");
            assert_eq!(meta.id(), "users/alice");
            assert!(meta.old_rev().is_none());

            let stored: User = users
                .read_document("alice", &DocumentReadOptions::new())?
                .expect("document should exist");
            assert_eq!(stored.rev.as_deref(), Some(meta.rev()));
            assert_eq!(stored.name, user.name);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_create_generates_key() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let first = users.create_document(&User::generate(), &DocumentCreateOptions::new())?;
            let second = users.create_document(&User::generate(), &DocumentCreateOptions::new())?;
            assert!(!first.key().is_empty());
            assert_ne!(first.key(), second.key());
            assert_eq!(ctx.server().document_count("users")?, 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_create_return_new() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let meta = users.create_document(
                &User::with_key("bob"),
                &DocumentCreateOptions::new().return_new(true),
            )?;
            let rev = meta.rev().to_string();
            let new = meta.into_new_document().expect("new document requested");
            assert_eq!(new.key.as_deref(), Some("bob"));
            assert_eq!(new.rev.as_deref(), Some(rev.as_str()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_read_missing_document_is_none() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let missing: Option<Document> = users.read_document("nobody", &DocumentReadOptions::new())?;
            assert!(missing.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_read_from_missing_collection_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ghosts = ctx.db().collection("ghosts")?;
            let err = ghosts
                .read_document::<Document>("anyone", &DocumentReadOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_silent_single_operation_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let err = users
                .create_document(&User::generate(), &DocumentCreateOptions::new().silent(true))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            assert_eq!(ctx.server().document_count("users")?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_with_keep_null_false_removes_attribute() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&doc! { "_key": "k", "a": 1, "b": 2 }, &DocumentCreateOptions::new())?;

            users.update_document(
                "k",
                &doc! { "b": (Value::Null) },
                &DocumentUpdateOptions::new().keep_null(false),
            )?;

            let stored: Document = users.read_document("k", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("a"), Some(&Value::from(1)));
            assert!(!stored.contains_key("b"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_with_keep_null_stores_null() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&doc! { "_key": "k", "a": 1, "b": 2 }, &DocumentCreateOptions::new())?;

            users.update_document("k", &doc! { "b": (Value::Null) }, &DocumentUpdateOptions::new())?;

            let stored: Document = users.read_document("k", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("b"), Some(&Value::Null));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_merges_nested_objects() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(
                &doc! { "_key": "k", "address": { "city": "Berlin", "zip": "10115" } },
                &DocumentCreateOptions::new(),
            )?;

            users.update_document(
                "k",
                &doc! { "address": { "city": "Munich" } },
                &DocumentUpdateOptions::new(),
            )?;
            let merged: Document = users.read_document("k", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(merged.get_path(&["address", "zip"]), Some(&Value::from("10115")));

            users.update_document(
                "k",
                &doc! { "address": { "city": "Hamburg" } },
                &DocumentUpdateOptions::new().merge_objects(false),
            )?;
            let overwritten: Document = users.read_document("k", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(overwritten.get_path(&["address", "city"]), Some(&Value::from("Hamburg")));
            assert!(overwritten.get_path(&["address", "zip"]).is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_replace_drops_missing_attributes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let created =
                users.create_document(&doc! { "_key": "k", "a": 1, "b": 2 }, &DocumentCreateOptions::new())?;

            let replaced = users.replace_document(
                "k",
                &doc! { "c": 3 },
                &DocumentReplaceOptions::new().return_old(true),
            )?;
            assert_eq!(replaced.old_rev(), Some(created.rev()));
            assert_ne!(replaced.rev(), created.rev());
            let old = replaced.old_document().expect("old document requested");
            assert_eq!(old.get("a"), Some(&Value::from(1)));

            let stored: Document = users.read_document("k", &DocumentReadOptions::new())?.expect("exists");
            assert!(!stored.contains_key("a"));
            assert_eq!(stored.get("c"), Some(&Value::from(3)));
            assert_eq!(stored.key(), Some("k"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_missing_document_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let err = users
                .update_document("nobody", &doc! { "a": 1 }, &DocumentUpdateOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_returns_old_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let user = User::with_key("carol");
            users.create_document(&user, &DocumentCreateOptions::new())?;

            let deleted = users.delete_document::<User>("carol", &DocumentDeleteOptions::new().return_old(true))?;
            assert_eq!(deleted.key(), "carol");
            assert_eq!(deleted.old_document().map(|u| u.email.clone()), Some(user.email));

            let gone: Option<User> = users.read_document("carol", &DocumentReadOptions::new())?;
            assert!(gone.is_none());

            let err = users
                .delete_document::<User>("carol", &DocumentDeleteOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_invalid_key_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            let err = users
                .create_document(&doc! { "_key": "no spaces allowed" }, &DocumentCreateOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Invalid);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_malformed_key_on_single_read_and_delete() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_document(&User::with_key("a"), &DocumentCreateOptions::new())?;

            for key in ["", "a/b", "bad key"] {
                let err = users
                    .read_document::<User>(key, &DocumentReadOptions::new())
                    .unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::Invalid);
                assert_eq!(err.error_num(), Some(error_codes::DOCUMENT_KEY_BAD));

                let err = users
                    .delete_document::<User>(key, &DocumentDeleteOptions::new())
                    .unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::Invalid);
                assert_eq!(err.error_num(), Some(error_codes::DOCUMENT_KEY_BAD));
            }
            assert_eq!(ctx.server().document_count("users")?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
