//! Conversions between gateway values and sqlx Postgres types.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use gatehouse_runtime::{DriverError, Row};
use gatehouse_sql::SqlValue;
use serde_json::{Number, Value};
use sqlx::Postgres;
use sqlx::postgres::types::{PgInterval, PgTimeTz};
use sqlx::postgres::{PgArguments, PgHasArrayType, PgRow, PgTypeInfo, PgTypeKind};
use sqlx::{Arguments, Column, Row as _, TypeInfo};
use tracing::debug;

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), DriverError>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(|e| DriverError::new(e.to_string()))
}

/// Bind statement parameters positionally.
pub(crate) fn bind_params(params: &[SqlValue]) -> Result<PgArguments, DriverError> {
    let mut args = PgArguments::default();
    for param in params {
        match param {
            SqlValue::Null => args_add(&mut args, Option::<String>::None)?,
            SqlValue::Bool(b) => args_add(&mut args, *b)?,
            SqlValue::Int(i) => args_add(&mut args, *i)?,
            SqlValue::Float(f) => args_add(&mut args, *f)?,
            SqlValue::Text(s) => args_add(&mut args, s.clone())?,
            SqlValue::Json(v) => args_add(&mut args, sqlx::types::Json(v.clone()))?,
        }
    }
    Ok(args)
}

/// Keep the SQLSTATE of server-side errors so callers can branch on it.
pub(crate) fn driver_error(err: sqlx::Error) -> DriverError {
    match &err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => DriverError::with_code(code.into_owned(), db.message()),
            None => DriverError::new(db.message()),
        },
        _ => DriverError::new(err.to_string()),
    }
}

/// Element types with a binary decoder. Covers every allowlisted column
/// type, alone or as a one-dimensional array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Uuid,
    Json,
    Timestamptz,
    Timestamp,
    Date,
    Time,
    TimeTz,
    Interval,
    Bytea,
}

impl Element {
    fn for_name(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "NUMERIC" => Self::Numeric,
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => Self::Text,
            "UUID" => Self::Uuid,
            "JSON" | "JSONB" => Self::Json,
            "TIMESTAMPTZ" => Self::Timestamptz,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMETZ" => Self::TimeTz,
            "INTERVAL" => Self::Interval,
            "BYTEA" => Self::Bytea,
            _ => return None,
        })
    }
}

/// How a result column is turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoder {
    Scalar(Element),
    Array(Element),
    /// Enum labels travel as UTF-8 text even in binary format.
    Enum,
    Unsupported,
}

impl Decoder {
    pub(crate) fn for_type(type_name: &str) -> Self {
        match type_name.strip_suffix("[]") {
            Some(element) => Element::for_name(element).map_or(Self::Unsupported, Self::Array),
            None => Element::for_name(type_name).map_or(Self::Unsupported, Self::Scalar),
        }
    }

    fn for_column(type_info: &PgTypeInfo) -> Self {
        match Self::for_type(type_info.name()) {
            Self::Unsupported if matches!(type_info.kind(), PgTypeKind::Enum(_)) => Self::Enum,
            decoder => decoder,
        }
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn text(v: impl ToString) -> Value {
    Value::String(v.to_string())
}

/// Render an interval the way Postgres prints it by default,
/// e.g. `1 year 2 mons 3 days 04:05:06.5`.
pub(crate) fn interval_text(interval: &PgInterval) -> String {
    fn unit(parts: &mut Vec<String>, value: i32, name: &str) {
        if value != 0 {
            let plural = if value == 1 { "" } else { "s" };
            parts.push(format!("{} {}{}", value, name, plural));
        }
    }

    let mut parts = Vec::new();
    unit(&mut parts, interval.months / 12, "year");
    unit(&mut parts, interval.months % 12, "mon");
    unit(&mut parts, interval.days, "day");

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let negative_before = interval.months < 0 || interval.days < 0;
        let sign = if micros < 0 {
            "-"
        } else if negative_before {
            "+"
        } else {
            ""
        };
        let total = micros.unsigned_abs();
        let seconds = total / 1_000_000;
        let mut clock = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        );
        let fraction = total % 1_000_000;
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

fn scalar<T>(row: &PgRow, index: usize, f: impl Fn(T) -> Value) -> Result<Value, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    Ok(row.try_get::<Option<T>, _>(index)?.map(f).unwrap_or(Value::Null))
}

fn array<T>(row: &PgRow, index: usize, f: impl Fn(T) -> Value) -> Result<Value, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + PgHasArrayType,
{
    Ok(row
        .try_get::<Option<Vec<Option<T>>>, _>(index)?
        .map(|items| {
            Value::Array(
                items
                    .into_iter()
                    .map(|item| item.map(&f).unwrap_or(Value::Null))
                    .collect(),
            )
        })
        .unwrap_or(Value::Null))
}

fn column<T>(
    row: &PgRow,
    index: usize,
    is_array: bool,
    f: impl Fn(T) -> Value,
) -> Result<Value, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + PgHasArrayType,
{
    if is_array {
        array(row, index, f)
    } else {
        scalar(row, index, f)
    }
}

fn decode_element(
    row: &PgRow,
    index: usize,
    element: Element,
    is_array: bool,
) -> Result<Value, sqlx::Error> {
    match element {
        Element::Bool => column::<bool>(row, index, is_array, Value::from),
        Element::Int2 => column::<i16>(row, index, is_array, Value::from),
        Element::Int4 => column::<i32>(row, index, is_array, Value::from),
        Element::Int8 => column::<i64>(row, index, is_array, Value::from),
        Element::Float4 => column::<f32>(row, index, is_array, |v| float(v.into())),
        Element::Float8 => column::<f64>(row, index, is_array, float),
        // Strings keep full precision.
        Element::Numeric => column::<BigDecimal>(row, index, is_array, text),
        Element::Text => column::<String>(row, index, is_array, Value::String),
        Element::Uuid => column::<uuid::Uuid>(row, index, is_array, text),
        Element::Json => column::<Value>(row, index, is_array, |v| v),
        Element::Timestamptz => column::<DateTime<Utc>>(row, index, is_array, |v| {
            Value::String(v.to_rfc3339())
        }),
        Element::Timestamp => column::<NaiveDateTime>(row, index, is_array, |v| {
            Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        Element::Date => column::<NaiveDate>(row, index, is_array, text),
        Element::Time => column::<NaiveTime>(row, index, is_array, text),
        Element::TimeTz => {
            column::<PgTimeTz<NaiveTime, FixedOffset>>(row, index, is_array, |v| {
                Value::String(format!("{}{}", v.time, v.offset))
            })
        }
        Element::Interval => column::<PgInterval>(row, index, is_array, |v| {
            Value::String(interval_text(&v))
        }),
        Element::Bytea => column::<Vec<u8>>(row, index, is_array, |v| {
            Value::String(String::from_utf8_lossy(&v).into_owned())
        }),
    }
}

fn decode(row: &PgRow, index: usize, decoder: Decoder) -> Result<Value, sqlx::Error> {
    match decoder {
        Decoder::Scalar(element) => decode_element(row, index, element, false),
        Decoder::Array(element) => decode_element(row, index, element, true),
        Decoder::Enum => Ok(row
            .try_get_unchecked::<Option<String>, _>(index)?
            .map(Value::String)
            .unwrap_or(Value::Null)),
        Decoder::Unsupported => Ok(Value::Null),
    }
}

/// Convert one result row to a JSON object keyed by column name.
///
/// Values that cannot be decoded become `null`.
pub(crate) fn row_to_json(row: &PgRow) -> Row {
    let mut obj = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let decoder = Decoder::for_column(column.type_info());
        if decoder == Decoder::Unsupported {
            debug!(column = column.name(), type_name, "No decoder for column type");
        }
        let value = decode(row, index, decoder).unwrap_or_else(|e| {
            debug!(column = column.name(), type_name, error = %e, "Could not decode column");
            Value::Null
        });
        obj.insert(column.name().to_string(), value);
    }
    obj
}

/// Declared parameter types, matching what `bind_params` encodes.
pub(crate) fn param_types(params: &[SqlValue]) -> Vec<PgTypeInfo> {
    params
        .iter()
        .map(|param| match param {
            SqlValue::Null | SqlValue::Text(_) => <String as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Bool(_) => <bool as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Int(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Float(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Json(_) => {
                <sqlx::types::Json<Value> as sqlx::Type<Postgres>>::type_info()
            }
        })
        .collect()
}
