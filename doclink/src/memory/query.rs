use std::collections::BTreeSet;

use serde_json::Value as Json;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{error_codes, DocLinkError, DocLinkResult};
use crate::memory::server::DatabaseState;

/// What a `FOR` loop iterates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    /// `FOR v IN users`
    Collection(String),
    /// `FOR v IN @@coll`, bound as `"@coll": "users"`
    CollectionParameter(String),
    /// `FOR v IN @values`, bound to an array
    ValueParameter(String),
}

/// A parsed `FOR v IN source [LIMIT [offset,] count] RETURN v` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    source: Source,
    offset: usize,
    limit: Option<usize>,
}

/// Result of running a query.
#[derive(Debug, Default)]
pub(crate) struct QueryOutput {
    pub(crate) results: Vec<Json>,
    /// Matches before `LIMIT` was applied
    pub(crate) full_count: u64,
    pub(crate) scanned_full: u64,
}

pub(crate) fn parse(text: &str) -> DocLinkResult<Query> {
    let spaced = text.replace(',', " , ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let mut position = 0;
    let mut next = || {
        let token = tokens.get(position).copied();
        position += 1;
        token
    };

    expect_keyword(next(), "FOR")?;
    let variable = identifier(next())?;
    expect_keyword(next(), "IN")?;
    let source = source(next())?;

    let mut token = next();
    let (mut offset, mut limit) = (0, None);
    if is_keyword(token, "LIMIT") {
        let first = number(next())?;
        token = next();
        if token == Some(",") {
            offset = first;
            limit = Some(number(next())?);
            token = next();
        } else {
            limit = Some(first);
        }
    }

    expect_keyword(token, "RETURN")?;
    let returned = identifier(next())?;
    if returned != variable {
        return Err(parse_error(&format!("variable '{}' is unknown", returned)));
    }
    if let Some(extra) = next() {
        return Err(parse_error(&format!("unexpected '{}'", extra)));
    }

    Ok(Query {
        source,
        offset,
        limit,
    })
}

impl Query {
    /// Names of the bind parameters the query declares, as they appear in bind vars.
    fn parameters(&self) -> BTreeSet<String> {
        let mut parameters = BTreeSet::new();
        match &self.source {
            Source::Collection(_) => {}
            Source::CollectionParameter(name) => {
                parameters.insert(format!("@{}", name));
            }
            Source::ValueParameter(name) => {
                parameters.insert(name.clone());
            }
        }
        parameters
    }

    /// Runs the query, inside a transaction if an id is given.
    pub(crate) fn execute(
        &self,
        db: &mut DatabaseState,
        bind_vars: Option<&Document>,
        transaction_id: Option<&str>,
    ) -> DocLinkResult<QueryOutput> {
        let declared = self.parameters();
        let empty = Document::new();
        let bind_vars = bind_vars.unwrap_or(&empty);

        for name in &declared {
            if !bind_vars.contains_key(name) {
                return Err(DocLinkError::server(
                    400,
                    Some(error_codes::QUERY_BIND_PARAMETER_MISSING),
                    &format!("no value specified for declared bind parameter '{}'", name),
                ));
            }
        }
        if let Some(unused) = bind_vars.keys().find(|name| !declared.contains(*name)) {
            return Err(DocLinkError::server(
                400,
                Some(error_codes::QUERY_BIND_PARAMETER_UNDECLARED),
                &format!("bind parameter '{}' was not declared in the query", unused),
            ));
        }

        let (values, scanned_full) = match &self.source {
            Source::Collection(name) => collection_values(db, name, transaction_id)?,
            Source::CollectionParameter(name) => match bind_vars.get(&format!("@{}", name)) {
                Some(Value::String(collection)) => collection_values(db, collection, transaction_id)?,
                _ => return Err(bad_bind_type(&format!("@{}", name))),
            },
            Source::ValueParameter(name) => match bind_vars.get(name) {
                Some(Value::Array(values)) => (values.iter().cloned().map(Json::from).collect(), 0),
                _ => return Err(bad_bind_type(name)),
            },
        };

        let full_count = values.len() as u64;
        let limit = self.limit.unwrap_or(usize::MAX);
        let results = values.into_iter().skip(self.offset).take(limit).collect();
        Ok(QueryOutput {
            results,
            full_count,
            scanned_full,
        })
    }
}

fn collection_values(
    db: &mut DatabaseState,
    name: &str,
    transaction_id: Option<&str>,
) -> DocLinkResult<(Vec<Json>, u64)> {
    let scope = db.scope_in(name, transaction_id)?;
    let values: Vec<Json> = scope
        .documents()
        .into_iter()
        .map(|document| Json::Object(document.clone().into()))
        .collect();
    let scanned = values.len() as u64;
    Ok((values, scanned))
}

fn source(token: Option<&str>) -> DocLinkResult<Source> {
    match token {
        Some(token) if token.starts_with("@@") => {
            Ok(Source::CollectionParameter(identifier(Some(&token[2..]))?))
        }
        Some(token) if token.starts_with('@') => Ok(Source::ValueParameter(identifier(Some(&token[1..]))?)),
        Some(token) => {
            let valid = !token.is_empty()
                && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if valid && !is_reserved(token) {
                Ok(Source::Collection(token.to_string()))
            } else {
                Err(parse_error(&format!("invalid collection name '{}'", token)))
            }
        }
        None => Err(parse_error("unexpected end of query")),
    }
}

fn identifier(token: Option<&str>) -> DocLinkResult<String> {
    match token {
        Some(token)
            if token.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !is_reserved(token) =>
        {
            Ok(token.to_string())
        }
        Some(token) => Err(parse_error(&format!("unexpected '{}'", token))),
        None => Err(parse_error("unexpected end of query")),
    }
}

fn number(token: Option<&str>) -> DocLinkResult<usize> {
    match token {
        Some(token) => token
            .parse()
            .map_err(|_| parse_error(&format!("expected a number, found '{}'", token))),
        None => Err(parse_error("unexpected end of query")),
    }
}

fn is_keyword(token: Option<&str>, keyword: &str) -> bool {
    token.is_some_and(|token| token.eq_ignore_ascii_case(keyword))
}

fn expect_keyword(token: Option<&str>, keyword: &str) -> DocLinkResult<()> {
    if is_keyword(token, keyword) {
        Ok(())
    } else {
        Err(parse_error(&format!(
            "expected {}, found '{}'",
            keyword,
            token.unwrap_or("end of query")
        )))
    }
}

fn is_reserved(token: &str) -> bool {
    ["FOR", "IN", "LIMIT", "RETURN"]
        .iter()
        .any(|keyword| token.eq_ignore_ascii_case(keyword))
}

fn parse_error(detail: &str) -> DocLinkError {
    DocLinkError::server(
        400,
        Some(error_codes::QUERY_PARSE),
        &format!("syntax error: {}", detail),
    )
}

fn bad_bind_type(name: &str) -> DocLinkError {
    DocLinkError::server(
        400,
        Some(error_codes::BAD_PARAMETER),
        &format!("bind parameter '{}' has an invalid value or type", name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::memory::collections::StoredCollection;

    #[test]
    fn test_parse_forms() {
        let query = parse("FOR u IN users RETURN u").unwrap();
        assert_eq!(query.source, Source::Collection("users".to_string()));
        assert_eq!(query.limit, None);

        let query = parse("for u in @@coll limit 2, 5 return u").unwrap();
        assert_eq!(query.source, Source::CollectionParameter("coll".to_string()));
        assert_eq!((query.offset, query.limit), (2, Some(5)));

        let query = parse("FOR x IN @list LIMIT 3 RETURN x").unwrap();
        assert_eq!(query.source, Source::ValueParameter("list".to_string()));
        assert_eq!((query.offset, query.limit), (0, Some(3)));
    }

    #[test]
    fn test_parse_errors() {
        for text in [
            "",
            "FOR u IN users",
            "FOR u IN users RETURN v",
            "FOR u IN users FILTER u.a == 1 RETURN u",
            "FOR u IN users LIMIT x RETURN u",
            "FOR u IN users RETURN u SORT",
            "RETURN 1",
        ] {
            let err = parse(text).unwrap_err();
            assert_eq!(err.error_num(), Some(error_codes::QUERY_PARSE), "{}", text);
        }
    }

    fn database() -> DatabaseState {
        let mut db = DatabaseState::default();
        let mut collection = StoredCollection::new();
        {
            let mut scope = crate::memory::collections::Scope::new("users", &mut collection, None);
            for key in ["a", "b", "c"] {
                scope.put(key, doc! { "_key": key });
            }
        }
        db.collections.insert("users".to_string(), collection);
        db
    }

    #[test]
    fn test_execute_with_limit() {
        let mut db = database();
        let output = parse("FOR u IN users LIMIT 1, 1 RETURN u")
            .unwrap()
            .execute(&mut db, None, None)
            .unwrap();
        assert_eq!(output.results.len(), 1);
        assert_eq!(output.results[0]["_key"], "b");
        assert_eq!(output.full_count, 3);
        assert_eq!(output.scanned_full, 3);
    }

    #[test]
    fn test_bind_parameters() {
        let mut db = database();
        let query = parse("FOR u IN @@coll RETURN u").unwrap();
        let output = query
            .execute(&mut db, Some(&doc! { "@coll": "users" }), None)
            .unwrap();
        assert_eq!(output.results.len(), 3);

        let err = query.execute(&mut db, None, None).unwrap_err();
        assert_eq!(err.error_num(), Some(error_codes::QUERY_BIND_PARAMETER_MISSING));

        let err = query
            .execute(&mut db, Some(&doc! { "@coll": "users", "extra": 1 }), None)
            .unwrap_err();
        assert_eq!(err.error_num(), Some(error_codes::QUERY_BIND_PARAMETER_UNDECLARED));

        let values = parse("FOR x IN @values RETURN x").unwrap();
        let output = values
            .execute(&mut db, Some(&doc! { "values": [1, 2, 3] }), None)
            .unwrap();
        assert_eq!(output.results, vec![Json::from(1), Json::from(2), Json::from(3)]);
    }

    #[test]
    fn test_unknown_collection() {
        let mut db = database();
        let err = parse("FOR u IN missing RETURN u")
            .unwrap()
            .execute(&mut db, None, None)
            .unwrap_err();
        assert_eq!(err.error_num(), Some(error_codes::DATA_SOURCE_NOT_FOUND));
    }
}
