use std::collections::HashSet;

use doclink::collection::Document;
use doclink::cursor::{CursorState, QueryOptions};
use doclink::doc;
use doclink::errors::ErrorKind;
use doclink_int_test::test_util::{cleanup, create_test_context, run_test};

use super::seed;

const BATCH_SIZE: usize = 3;

#[test]
fn test_cursor_delivers_every_result_once() {
    for total in [0, 1, BATCH_SIZE, BATCH_SIZE + 1, 3 * BATCH_SIZE + 2] {
        run_test(
            || create_test_context(),
            |ctx| {
                let users = ctx.db().collection("users")?;
                seed(&users, total)?;

                let cursor = ctx.db().query::<Document>(
                    "FOR u IN users RETURN u",
                    None,
                    &QueryOptions::new().batch_size(BATCH_SIZE).count(true),
                )?;
                assert_eq!((&cursor).count(), Some(total as u64));

                let mut keys = HashSet::new();
                for document in cursor {
                    let document = document?;
                    assert!(keys.insert(document.key().unwrap_or_default().to_string()));
                }
                assert_eq!(keys.len(), total);
                assert_eq!(ctx.server().open_cursor_count(), 0);
                Ok(())
            },
            |ctx| cleanup(ctx),
        )
    }
}

#[test]
fn test_cursor_preserves_insertion_order() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 7)?;

            let mut cursor = ctx.db().query::<Document>(
                "FOR u IN users RETURN u",
                None,
                &QueryOptions::new().batch_size(2),
            )?;
            assert_eq!(cursor.state(), CursorState::Created);
            let numbers = cursor
                .collect_remaining()?
                .iter()
                .filter_map(|d| d.get("n").and_then(|n| n.as_i64()))
                .collect::<Vec<_>>();
            assert_eq!(numbers, (0..7).collect::<Vec<i64>>());
            assert_eq!(cursor.state(), CursorState::Exhausted);
            assert!(cursor.advance()?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_close_releases_server_cursor() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 5)?;

            let mut cursor = ctx.db().query::<Document>(
                "FOR u IN users RETURN u",
                None,
                &QueryOptions::new().batch_size(2),
            )?;
            assert!(cursor.id().is_some());
            assert_eq!(ctx.server().open_cursor_count(), 1);

            cursor.advance()?;
            cursor.close();
            assert_eq!(cursor.state(), CursorState::Closed);
            assert_eq!(ctx.server().open_cursor_count(), 0);

            let err = cursor.advance().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            cursor.close();
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_releases_server_cursor() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 5)?;

            {
                let _cursor = ctx.db().query::<Document>(
                    "FOR u IN users RETURN u",
                    None,
                    &QueryOptions::new().batch_size(2).allow_retry(true),
                )?;
                assert_eq!(ctx.server().open_cursor_count(), 1);
            }
            assert_eq!(ctx.server().open_cursor_count(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_single_batch_has_no_server_cursor() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 2)?;

            let cursor = ctx.db().query::<Document>("FOR u IN users RETURN u", None, &QueryOptions::new())?;
            assert!(cursor.id().is_none());
            assert_eq!(ctx.server().open_cursor_count(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bind_variables() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 4)?;

            let mut by_collection = ctx.db().query::<Document>(
                "FOR u IN @@coll RETURN u",
                Some(doc! { "@coll": "users" }),
                &QueryOptions::new(),
            )?;
            assert_eq!(by_collection.collect_remaining()?.len(), 4);

            let mut by_value = ctx.db().query::<i64>(
                "FOR x IN @values LIMIT 1, 2 RETURN x",
                Some(doc! { "values": [10, 20, 30, 40] }),
                &QueryOptions::new(),
            )?;
            assert_eq!(by_value.collect_remaining()?, vec![20, 30]);

            let err = ctx
                .db()
                .query::<Document>("FOR u IN @@coll RETURN u", None, &QueryOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Invalid);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_full_count_and_dirty_read_metadata() {
    run_test(
        || create_test_context(),
        |ctx| {
            let users = ctx.db().collection("users")?;
            seed(&users, 6)?;

            let cursor = ctx.db().query::<Document>(
                "FOR u IN users LIMIT 2 RETURN u",
                None,
                &QueryOptions::new().full_count(true).allow_dirty_read(true),
            )?;
            assert_eq!(cursor.stats().and_then(|s| s.full_count()), Some(6));
            assert!(cursor.is_potential_dirty_read());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_malformed_query_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let err = ctx
                .db()
                .query::<Document>("SELECT * FROM users", None, &QueryOptions::new())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::Invalid);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
