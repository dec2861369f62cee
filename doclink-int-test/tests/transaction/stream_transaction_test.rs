use doclink::collection::{
    Document, DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions, DocumentUpdateOptions,
};
use doclink::common::Value;
use doclink::cursor::QueryOptions;
use doclink::doc;
use doclink::errors::ErrorKind;
use doclink::transaction::{StreamTransactionOptions, StreamTransactionStatus};
use doclink_int_test::test_util::{cleanup, create_test_context, run_test};
use fake::faker::name::en::FirstName;
use fake::Fake;

use super::users_only;

#[test]
fn test_commit_makes_writes_visible() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;
            let tx = db.begin_stream_transaction(&users_only())?;
            assert!(tx.is_running());

            let name: String = FirstName().fake();
            users.create_document(
                &doc! { "_key": "tx1", "name": (name.as_str()) },
                &DocumentCreateOptions::new().stream_transaction_id(tx.id()),
            )?;

            let inside: Option<Document> =
                users.read_document("tx1", &DocumentReadOptions::new().stream_transaction_id(tx.id()))?;
            assert!(inside.is_some());
            let outside: Option<Document> = users.read_document("tx1", &DocumentReadOptions::new())?;
            assert!(outside.is_none());
            assert_eq!(ctx.server().document_count("users")?, 0);

            tx.commit()?;
            assert_eq!(tx.status(), StreamTransactionStatus::Committed);

            let committed: Document = users.read_document("tx1", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(committed.get("name"), Some(&Value::from(name)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_abort_discards_writes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;
            users.create_document(&doc! { "_key": "keep", "n": 1 }, &DocumentCreateOptions::new())?;

            let tx = db.begin_stream_transaction(&users_only())?;
            users.create_document(
                &doc! { "_key": "tmp" },
                &DocumentCreateOptions::new().stream_transaction_id(tx.id()),
            )?;
            users.update_document(
                "keep",
                &doc! { "n": 2 },
                &DocumentUpdateOptions::new().stream_transaction_id(tx.id()),
            )?;
            tx.abort()?;
            assert_eq!(tx.status(), StreamTransactionStatus::Aborted);

            assert_eq!(ctx.server().document_count("users")?, 1);
            let kept: Document = users.read_document("keep", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(kept.get("n"), Some(&Value::from(1)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_inside_transaction_is_isolated() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;
            users.create_document(&doc! { "_key": "d" }, &DocumentCreateOptions::new())?;

            let tx = db.begin_stream_transaction(&users_only())?;
            users.delete_document::<Document>("d", &DocumentDeleteOptions::new().stream_transaction_id(tx.id()))?;

            let inside: Option<Document> =
                users.read_document("d", &DocumentReadOptions::new().stream_transaction_id(tx.id()))?;
            assert!(inside.is_none());
            let outside: Option<Document> = users.read_document("d", &DocumentReadOptions::new())?;
            assert!(outside.is_some());

            db.commit_stream_transaction(tx.id())?;
            assert_eq!(ctx.server().document_count("users")?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_query_inside_transaction_sees_pending_writes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;
            users.create_document(&doc! { "n": 0 }, &DocumentCreateOptions::new())?;

            let tx = db.begin_stream_transaction(&users_only())?;
            users.create_documents(
                &[doc! { "n": 1 }, doc! { "n": 2 }],
                &DocumentCreateOptions::new().stream_transaction_id(tx.id()),
            )?;

            let mut inside = db.query::<Document>(
                "FOR u IN users RETURN u",
                None,
                &QueryOptions::new().stream_transaction_id(tx.id()),
            )?;
            assert_eq!(inside.collect_remaining()?.len(), 3);
            let mut outside = db.query::<Document>("FOR u IN users RETURN u", None, &QueryOptions::new())?;
            assert_eq!(outside.collect_remaining()?.len(), 1);

            tx.abort()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_undeclared_collection_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let orders = db.collection("orders")?;
            let tx = db.begin_stream_transaction(&users_only())?;

            let err = orders
                .create_document(
                    &doc! { "total": 10 },
                    &DocumentCreateOptions::new().stream_transaction_id(tx.id()),
                )
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnregisteredCollection);

            let err = orders
                .read_document::<Document>("any", &DocumentReadOptions::new().stream_transaction_id(tx.id()))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnregisteredCollection);

            tx.abort()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_implicit_collections_allowed_by_default() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let orders = db.collection("orders")?;
            let tx = db.begin_stream_transaction(&StreamTransactionOptions::new().read_collections(&["users"]))?;
            let missing: Option<Document> =
                orders.read_document("any", &DocumentReadOptions::new().stream_transaction_id(tx.id()))?;
            assert!(missing.is_none());
            tx.commit()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_begin_with_missing_collection_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let err = ctx
                .db()
                .begin_stream_transaction(&StreamTransactionOptions::new().write_collections(&["ghosts"]))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_terminal_transitions() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let users = db.collection("users")?;
            let tx = db.begin_stream_transaction(&users_only())?;
            tx.commit()?;
            tx.commit()?;
            assert_eq!(tx.status(), StreamTransactionStatus::Committed);

            let err = tx.abort().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::TransactionState);
            assert_eq!(tx.status(), StreamTransactionStatus::Committed);

            let err = users
                .create_document(&doc! { "n": 1 }, &DocumentCreateOptions::new().stream_transaction_id(tx.id()))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_list_and_status() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let first = db.begin_stream_transaction(&users_only())?;
            let second = db.begin_stream_transaction(&users_only())?;
            assert_ne!(first.id(), second.id());

            let running = db.stream_transactions()?;
            assert_eq!(running.len(), 2);
            assert!(running.iter().all(|t| t.status() == StreamTransactionStatus::Running));

            second.abort()?;
            let running = db.stream_transactions()?;
            assert_eq!(running.len(), 1);
            assert_eq!(running[0].id(), first.id());

            assert_eq!(db.stream_transaction(second.id())?.status(), StreamTransactionStatus::Aborted);
            assert_eq!(first.refresh()?, StreamTransactionStatus::Running);

            let err = db.stream_transaction("999999").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            first.abort()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
