use doclink::collection::{
    Document, DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions, DocumentReplaceOptions,
    DocumentUpdateOptions,
};
use doclink::common::Value;
use doclink::doc;
use doclink::errors::ErrorKind;
use doclink_int_test::test_util::{cleanup, create_test_context, run_test};

fn stale_and_current(ctx: &doclink_int_test::test_util::TestContext) -> doclink::errors::DocLinkResult<(String, String)> {
    let users = ctx.db().collection("users")?;
    let first = users.create_document(&doc! { "_key": "p", "n": 1 }, &DocumentCreateOptions::new())?;
    let second = users.update_document("p", &doc! { "n": 2 }, &DocumentUpdateOptions::new())?;
    Ok((first.rev().to_string(), second.rev().to_string()))
}

#[test]
fn test_stale_if_match_fails_update() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (stale, current) = stale_and_current(&ctx)?;
            let users = ctx.db().collection("users")?;
            let err = users
                .update_document("p", &doc! { "n": 3 }, &DocumentUpdateOptions::new().if_match(&stale))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PreconditionFailed);

            let ok = users.update_document("p", &doc! { "n": 3 }, &DocumentUpdateOptions::new().if_match(&current))?;
            assert_eq!(ok.old_rev(), Some(current.as_str()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_stale_if_match_fails_replace() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (stale, _) = stale_and_current(&ctx)?;
            let users = ctx.db().collection("users")?;
            let err = users
                .replace_document("p", &doc! { "n": 9 }, &DocumentReplaceOptions::new().if_match(&stale))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PreconditionFailed);

            let stored: Document = users.read_document("p", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("n"), Some(&Value::from(2)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_stale_if_match_fails_delete() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (stale, current) = stale_and_current(&ctx)?;
            let users = ctx.db().collection("users")?;
            let err = users
                .delete_document::<Document>("p", &DocumentDeleteOptions::new().if_match(&stale))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PreconditionFailed);
            assert_eq!(ctx.server().document_count("users")?, 1);

            users.delete_document::<Document>("p", &DocumentDeleteOptions::new().if_match(&current))?;
            assert_eq!(ctx.server().document_count("users")?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_body_revision_is_checked_unless_ignored() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (stale, _) = stale_and_current(&ctx)?;
            let users = ctx.db().collection("users")?;

            let err = users
                .update_document(
                    "p",
                    &doc! { "_rev": (stale.as_str()), "n": 4 },
                    &DocumentUpdateOptions::new().ignore_revs(false),
                )
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PreconditionFailed);

            users.update_document(
                "p",
                &doc! { "_rev": (stale.as_str()), "n": 4 },
                &DocumentUpdateOptions::new(),
            )?;
            let stored: Document = users.read_document("p", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("n"), Some(&Value::from(4)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_conditional_reads() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (stale, current) = stale_and_current(&ctx)?;
            let users = ctx.db().collection("users")?;

            let matched: Option<Document> =
                users.read_document("p", &DocumentReadOptions::new().if_match(&current))?;
            assert!(matched.is_some());
            let mismatched: Option<Document> =
                users.read_document("p", &DocumentReadOptions::new().if_match(&stale))?;
            assert!(mismatched.is_none());
            let unchanged: Option<Document> =
                users.read_document("p", &DocumentReadOptions::new().if_none_match(&current))?;
            assert!(unchanged.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_if_none_match_on_writes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let (stale, current) = stale_and_current(&ctx)?;
            let users = ctx.db().collection("users")?;

            let err = users
                .update_document("p", &doc! { "n": 3 }, &DocumentUpdateOptions::new().if_none_match(&current))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PreconditionFailed);

            let err = users
                .delete_document::<Document>("p", &DocumentDeleteOptions::new().if_none_match(&current))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PreconditionFailed);

            let replaced = users.replace_document(
                "p",
                &doc! { "n": 4 },
                &DocumentReplaceOptions::new().if_none_match(&stale),
            )?;
            assert_eq!(replaced.old_rev(), Some(current.as_str()));

            let stored: Document = users.read_document("p", &DocumentReadOptions::new())?.expect("exists");
            assert_eq!(stored.get("n"), Some(&Value::from(4)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
