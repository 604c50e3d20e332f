//! Statement builders for structured operations.
//!
//! Builders assume their inputs already passed [`crate::identifier`]
//! validation. Identifiers are still quoted with [`quote_ident`], and row
//! values are always bound as parameters, never interpolated.

use crate::definition::TableDefinition;
use crate::error::ValidationError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A typed value bound positionally to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => match n.as_f64() {
                    Some(f) => Self::Float(f),
                    None => Self::Text(n.to_string()),
                },
            },
            Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Quote an identifier, doubling any embedded `"`.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn placeholder(index: usize, cast: Option<&str>) -> String {
    match cast {
        Some(ty) => format!("${}::{}", index, quote_ident(ty)),
        None => format!("${}", index),
    }
}

/// `CREATE TABLE "schema"."table" (...)`.
pub fn create_table(def: &TableDefinition) -> Statement {
    let mut clauses = Vec::with_capacity(def.columns.len());

    for column in &def.columns {
        let mut clause = format!("{} {}", quote_ident(&column.name), column.data_type.trim());
        if column.is_identity {
            clause.push_str(" GENERATED ALWAYS AS IDENTITY");
        }
        if column.primary {
            clause.push_str(" PRIMARY KEY");
        }
        if column.is_unique {
            clause.push_str(" UNIQUE");
        }
        if !column.nullable {
            clause.push_str(" NOT NULL");
        }
        if let Some(default) = column.default.as_deref().filter(|d| !d.is_empty()) {
            clause.push_str(" DEFAULT ");
            clause.push_str(default);
        }
        clauses.push(clause);
    }

    if let Some(fk) = &def.foreign_keys {
        for reference in &fk.references {
            let mut clause = format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                quote_ident(&reference.local_column),
                qualified(&fk.schema, &fk.table),
                quote_ident(&reference.foreign_column),
            );
            if let Some(action) = reference.on_delete {
                clause.push_str(" ON DELETE ");
                clause.push_str(action.as_sql());
            }
            if let Some(action) = reference.on_update {
                clause.push_str(" ON UPDATE ");
                clause.push_str(action.as_sql());
            }
            clauses.push(clause);
        }
    }

    Statement::new(format!(
        "CREATE TABLE {} (\n  {}\n)",
        qualified(def.schema_name(), &def.table),
        clauses.join(",\n  ")
    ))
}

/// `DROP TABLE "schema"."table" CASCADE`.
pub fn drop_table(schema: &str, table: &str) -> Statement {
    Statement::new(format!("DROP TABLE {} CASCADE", qualified(schema, table)))
}

/// `INSERT INTO "table" (...) VALUES (...)` with columns in sorted order.
///
/// `column_types` maps column name to its catalog type name; known columns get
/// a cast on their placeholder so text and JSON values coerce the way an
/// untyped literal would.
pub fn insert(
    table: &str,
    values: &serde_json::Map<String, Value>,
    column_types: &HashMap<String, String>,
    returning_id: bool,
) -> Statement {
    let mut entries: Vec<(&String, &Value)> = values.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut columns = Vec::with_capacity(entries.len());
    let mut placeholders = Vec::with_capacity(entries.len());
    let mut params = Vec::with_capacity(entries.len());

    for (i, (column, value)) in entries.into_iter().enumerate() {
        columns.push(quote_ident(column));
        placeholders.push(placeholder(
            i + 1,
            column_types.get(column).map(String::as_str),
        ));
        params.push(SqlValue::from(value.clone()));
    }

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    );
    if returning_id {
        sql.push_str(" RETURNING id");
    }

    Statement::with_params(sql, params)
}

/// Render a JSON default as a SQL literal.
pub fn format_default(column: &str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        Value::Array(_) | Value::Object(_) => Err(ValidationError::UnsafeDefault {
            column: column.to_string(),
            reason: "arrays and objects cannot be used as defaults".to_string(),
        }),
    }
}

/// `ALTER TABLE "table" ADD COLUMN "name" TYPE [DEFAULT literal]`.
pub fn add_column(
    table: &str,
    column: &str,
    data_type: &str,
    default: Option<&Value>,
) -> Result<Statement, ValidationError> {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_ident(table),
        quote_ident(column),
        data_type.trim()
    );
    if let Some(value) = default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&format_default(column, value)?);
    }
    Ok(Statement::new(sql))
}

/// `ALTER TABLE "table" DROP COLUMN "name"`.
pub fn drop_column(table: &str, column: &str) -> Statement {
    Statement::new(format!(
        "ALTER TABLE {} DROP COLUMN {}",
        quote_ident(table),
        quote_ident(column)
    ))
}

/// `DELETE FROM "table" WHERE "key" = $1`.
pub fn delete_row(table: &str, key_column: &str, key: SqlValue, cast: Option<&str>) -> Statement {
    Statement::with_params(
        format!(
            "DELETE FROM {} WHERE {} = {}",
            quote_ident(table),
            quote_ident(key_column),
            placeholder(1, cast)
        ),
        vec![key],
    )
}

/// Column names and catalog type names of a table in the current schema.
///
/// The name is matched exactly, as the quoted DML built here addresses it.
pub fn column_types_probe(table: &str) -> Statement {
    Statement::with_params(
        "SELECT column_name::text AS column_name, udt_name::text AS udt_name \
         FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 \
         ORDER BY ordinal_position",
        vec![SqlValue::Text(table.to_string())],
    )
}

/// Ordinal position of one column in the current schema.
pub fn column_position_probe(table: &str, column: &str) -> Statement {
    Statement::with_params(
        "SELECT ordinal_position::int8 AS ordinal_position \
         FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2",
        vec![
            SqlValue::Text(table.to_string()),
            SqlValue::Text(column.to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{
        ColumnDefinition, ForeignKeyBlock, ForeignKeyRef, ReferentialAction,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn column(name: &str, ty: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            data_type: ty.to_string(),
            default: None,
            primary: false,
            is_unique: false,
            is_identity: false,
            nullable: false,
        }
    }

    #[test]
    fn test_create_table_users_example() {
        let def = TableDefinition {
            schema: String::new(),
            table: "users".to_string(),
            columns: vec![
                ColumnDefinition {
                    primary: true,
                    is_identity: true,
                    ..column("id", "INT")
                },
                column("name", "VARCHAR(50)"),
            ],
            foreign_keys: None,
        };
        let stmt = create_table(&def);
        assert_eq!(
            stmt.sql,
            "CREATE TABLE \"public\".\"users\" (\n  \
             \"id\" INT GENERATED ALWAYS AS IDENTITY PRIMARY KEY NOT NULL,\n  \
             \"name\" VARCHAR(50) NOT NULL\n)"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_create_table_with_foreign_keys_and_default() {
        let def = TableDefinition {
            schema: "hr".to_string(),
            table: "employees".to_string(),
            columns: vec![
                ColumnDefinition {
                    nullable: true,
                    ..column("department_id", "INT")
                },
                ColumnDefinition {
                    default: Some("now()".to_string()),
                    is_unique: true,
                    ..column("hired_at", "TIMESTAMPTZ")
                },
            ],
            foreign_keys: Some(ForeignKeyBlock {
                schema: "hr".to_string(),
                table: "departments".to_string(),
                references: vec![ForeignKeyRef {
                    local_column: "department_id".to_string(),
                    foreign_column: "id".to_string(),
                    on_update: Some(ReferentialAction::Cascade),
                    on_delete: Some(ReferentialAction::SetNull),
                }],
            }),
        };
        assert_eq!(
            create_table(&def).sql,
            "CREATE TABLE \"hr\".\"employees\" (\n  \
             \"department_id\" INT,\n  \
             \"hired_at\" TIMESTAMPTZ UNIQUE NOT NULL DEFAULT now(),\n  \
             FOREIGN KEY (\"department_id\") REFERENCES \"hr\".\"departments\"(\"id\") ON DELETE SET NULL ON UPDATE CASCADE\n)"
        );
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            drop_table("public", "users").sql,
            "DROP TABLE \"public\".\"users\" CASCADE"
        );
    }

    #[test]
    fn test_insert_sorted_and_bound() {
        let values = json!({"total": 12.5, "customer": "o'brien", "paid": true, "meta": {"a": 1}});
        let stmt = insert(
            "orders",
            values.as_object().unwrap(),
            &HashMap::new(),
            false,
        );
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"orders\" (\"customer\", \"meta\", \"paid\", \"total\") VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("o'brien".to_string()),
                SqlValue::Json(json!({"a": 1})),
                SqlValue::Bool(true),
                SqlValue::Float(12.5),
            ]
        );
    }

    #[test]
    fn test_insert_casts_and_returning() {
        let values = json!({"qty": "3", "note": "x"});
        let types = HashMap::from([("qty".to_string(), "int4".to_string())]);
        let stmt = insert("orders", values.as_object().unwrap(), &types, true);
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"orders\" (\"note\", \"qty\") VALUES ($1, $2::\"int4\") RETURNING id"
        );
    }

    #[test]
    fn test_format_default() {
        assert_eq!(format_default("c", &json!("it's")).unwrap(), "'it''s'");
        assert_eq!(format_default("c", &json!(true)).unwrap(), "TRUE");
        assert_eq!(format_default("c", &json!(false)).unwrap(), "FALSE");
        assert_eq!(format_default("c", &json!(42)).unwrap(), "42");
        assert_eq!(format_default("c", &json!(1.5)).unwrap(), "1.5");
        assert_eq!(format_default("c", &Value::Null).unwrap(), "NULL");
        assert!(format_default("c", &json!([1, 2])).is_err());
        assert!(format_default("c", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_add_and_drop_column() {
        assert_eq!(
            add_column("users", "active", "BOOLEAN", Some(&json!(true)))
                .unwrap()
                .sql,
            "ALTER TABLE \"users\" ADD COLUMN \"active\" BOOLEAN DEFAULT TRUE"
        );
        assert_eq!(
            add_column("users", "bio", "TEXT", None).unwrap().sql,
            "ALTER TABLE \"users\" ADD COLUMN \"bio\" TEXT"
        );
        assert_eq!(
            drop_column("users", "bio").sql,
            "ALTER TABLE \"users\" DROP COLUMN \"bio\""
        );
    }

    #[test]
    fn test_delete_row() {
        let stmt = delete_row("orders", "id", SqlValue::Text("7".to_string()), Some("int8"));
        assert_eq!(stmt.sql, "DELETE FROM \"orders\" WHERE \"id\" = $1::\"int8\"");
        assert_eq!(stmt.params, vec![SqlValue::Text("7".to_string())]);
    }

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            drop_column("t\"; DROP TABLE x; --", "c").sql,
            "ALTER TABLE \"t\"\"; DROP TABLE x; --\" DROP COLUMN \"c\""
        );
    }

    #[test]
    fn test_large_unsigned_number_is_not_truncated() {
        assert_eq!(
            SqlValue::from(json!(u64::MAX)),
            SqlValue::Float(u64::MAX as f64)
        );
    }

    #[test]
    fn test_column_lookups_match_table_name_exactly() {
        let types = column_types_probe("Orders");
        assert!(types.sql.contains("AND table_name = $1"));
        assert!(!types.sql.contains("lower("));
        assert_eq!(types.params, vec![SqlValue::Text("Orders".to_string())]);

        let position = column_position_probe("Orders", "Total");
        assert!(position.sql.contains("AND table_name = $1 AND column_name = $2"));
        assert_eq!(
            position.params,
            vec![
                SqlValue::Text("Orders".to_string()),
                SqlValue::Text("Total".to_string()),
            ]
        );
    }
}
