//! Document reads against `SurrealDB`.
//!
//! Every collection is a table of `{ key: int, doc: string }` records, `doc`
//! holding the entity serialized as JSON. Collection names are interpolated
//! into statements, so they are validated first; all values are bound.

use crate::error::{DatabaseError, DatabaseErrorExt};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct StoredDocument {
    pub key: i64,
    pub doc: String,
}

#[derive(Debug, SurrealValue)]
struct KeyRow {
    key: i64,
}

/// A staged write as bound into the commit statement.
#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct StagedWrite {
    pub key: i64,
    pub doc: Option<String>,
}

pub(crate) fn validate_collection(name: &str) -> Result<(), DatabaseError> {
    let valid = !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        && !name.as_bytes()[0].is_ascii_digit();
    if valid {
        Ok(())
    } else {
        Err(DatabaseError::Validation {
            message: format!("invalid collection name '{name}'").into(),
            context: Some("Collections are lowercase ASCII alphanumerics or '_'".into()),
        })
    }
}

pub(crate) async fn find(
    db: &Surreal<Any>,
    collection: &str,
    key: i64,
) -> Result<Option<String>, DatabaseError> {
    let sql = format!("SELECT key, doc FROM {collection} WHERE key = $key LIMIT 1");
    let rows = db
        .query(&sql)
        .bind(("key", key))
        .await
        .context(format!("Loading {collection}:{key}"))?
        .take::<Vec<StoredDocument>>(0)
        .context(format!("Decoding {collection}:{key}"))?;

    Ok(rows.into_iter().next().map(|row| row.doc))
}

pub(crate) async fn scan(
    db: &Surreal<Any>,
    collection: &str,
) -> Result<Vec<StoredDocument>, DatabaseError> {
    let sql = format!("SELECT key, doc FROM {collection} ORDER BY key ASC");
    db.query(&sql)
        .await
        .context(format!("Scanning {collection}"))?
        .take::<Vec<StoredDocument>>(0)
        .context(format!("Decoding {collection}"))
}

pub(crate) async fn max_key(db: &Surreal<Any>, collection: &str) -> Result<Option<i64>, DatabaseError> {
    let sql = format!("SELECT key FROM {collection} ORDER BY key DESC LIMIT 1");
    let rows = db
        .query(&sql)
        .await
        .context(format!("Seeding key sequence of {collection}"))?
        .take::<Vec<KeyRow>>(0)?;

    Ok(rows.first().map(|row| row.key))
}

/// Builds one transaction applying `writes`, grouped by collection.
///
/// Each write first deletes the record with its key; puts then create the new
/// version. Values are referenced as `$writes[i]`.
pub(crate) fn commit_statement<'a>(
    writes: impl IntoIterator<Item = (usize, &'a str, bool)>,
) -> String {
    let mut sql = String::from("BEGIN TRANSACTION;\n");
    for (i, collection, is_put) in writes {
        sql.push_str(&format!("DELETE {collection} WHERE key = $writes[{i}].key;\n"));
        if is_put {
            sql.push_str(&format!(
                "CREATE {collection} SET key = $writes[{i}].key, doc = $writes[{i}].doc;\n"
            ));
        }
    }
    sql.push_str("COMMIT TRANSACTION;");
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names() {
        assert!(validate_collection("employee").is_ok());
        assert!(validate_collection("pay_order_2").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("Employee").is_err());
        assert!(validate_collection("2fast").is_err());
        assert!(validate_collection("employee; DROP TABLE x").is_err());
    }

    #[test]
    fn commit_statement_wraps_writes_in_one_transaction() {
        let sql = commit_statement([(0, "employee", true), (1, "employee", false)]);
        assert!(sql.starts_with("BEGIN TRANSACTION;"));
        assert!(sql.ends_with("COMMIT TRANSACTION;"));
        assert_eq!(sql.matches("DELETE employee").count(), 2);
        assert_eq!(sql.matches("CREATE employee").count(), 1);
        assert!(sql.contains("$writes[1].key"));
    }
}
