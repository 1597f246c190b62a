#![forbid(unsafe_code)]

use rusqlite::types::Value;
use sf_core::FieldValue;

pub(in crate::store) fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(v) => Value::Integer(*v),
        FieldValue::Real(v) => Value::Real(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
        FieldValue::Blob(v) => Value::Blob(v.clone()),
    }
}

pub(in crate::store) fn from_sql_value(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Integer(v) => FieldValue::Integer(v),
        Value::Real(v) => FieldValue::Real(v),
        Value::Text(v) => FieldValue::Text(v),
        Value::Blob(v) => FieldValue::Blob(v),
    }
}
