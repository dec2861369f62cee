use std::collections::HashSet;

use doclink::collection::Document;
use doclink::cursor::{CursorState, QueryOptions};
use doclink::errors::ErrorKind;
use doclink::transport::Method;
use doclink_int_test::test_util::{cleanup, create_flaky_test_context, run_test, Fault, FaultPoint};

use super::seed;

const BATCH_FETCH: &str = "/_api/cursor/";

fn drain_with_fault(point: FaultPoint) {
    run_test(
        || Ok(create_flaky_test_context(Fault::new(Method::Post, BATCH_FETCH, &[1, 3], point))?.0),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 7)?;

            let mut cursor = ctx.db().query::<Document>(
                "FOR u IN users RETURN u",
                None,
                &QueryOptions::new().batch_size(2).allow_retry(true),
            )?;

            let mut numbers = Vec::new();
            while let Some(document) = cursor.advance()? {
                numbers.push(document.get("n").and_then(|n| n.as_i64()).unwrap_or(-1));
            }
            assert_eq!(numbers, (0..7).collect::<Vec<i64>>());
            assert_eq!(numbers.iter().collect::<HashSet<_>>().len(), 7);
            assert_eq!(cursor.state(), CursorState::Exhausted);
            assert_eq!(ctx.server().open_cursor_count(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_retry_after_lost_request() {
    drain_with_fault(FaultPoint::BeforeDelivery);
}

#[test]
fn test_retry_after_lost_response() {
    drain_with_fault(FaultPoint::AfterDelivery);
}

#[test]
fn test_retry_budget_exhausted() {
    run_test(
        || Ok(create_flaky_test_context(Fault::new(Method::Post, BATCH_FETCH, &[1, 2, 3, 4], FaultPoint::AfterDelivery))?.0),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 5)?;

            let mut cursor = ctx.db().query::<Document>(
                "FOR u IN users RETURN u",
                None,
                &QueryOptions::new().batch_size(2).allow_retry(true),
            )?;
            cursor.advance()?;
            cursor.advance()?;
            let err = cursor.advance().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Transport);
            assert_eq!(cursor.state(), CursorState::Closed);
            assert_eq!(ctx.server().open_cursor_count(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_no_retry_without_allow_retry() {
    let (ctx, flaky) = create_flaky_test_context(Fault::new(
        Method::Post,
        BATCH_FETCH,
        &[1],
        FaultPoint::BeforeDelivery,
    ))
    .expect("context");
    let users = ctx.db().collection("users").expect("collection");
    seed(&users, 5).expect("seed");

    let mut cursor = ctx
        .db()
        .query::<Document>("FOR u IN users RETURN u", None, &QueryOptions::new().batch_size(2))
        .expect("query");
    cursor.advance().expect("first");
    cursor.advance().expect("second");

    let err = cursor.advance().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Transport);
    assert_eq!(cursor.state(), CursorState::Closed);
    assert_eq!(flaky.matched(), 1);
    assert_eq!(flaky.injected(), 1);
    assert_eq!(ctx.server().open_cursor_count(), 0);
}
