//! Bind FieldValue directly as a SQLite query parameter.

use crate::value::FieldValue;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::Database;

impl<'q> Encode<'q, Sqlite> for FieldValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            FieldValue::Null => Ok(IsNull::Yes),
            FieldValue::Bool(b) => <bool as Encode<Sqlite>>::encode_by_ref(b, buf),
            FieldValue::Integer(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            FieldValue::Float(f) => <f64 as Encode<Sqlite>>::encode_by_ref(f, buf),
            FieldValue::String(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf),
            // Nested values are stored as JSON text.
            nested => {
                let json = Value::from(nested.clone()).to_string();
                <String as Encode<Sqlite>>::encode(json, buf)
            }
        }
    }
}

impl sqlx::Type<Sqlite> for FieldValue {
    fn type_info() -> SqliteTypeInfo {
        <String as sqlx::Type<Sqlite>>::type_info()
    }
}
