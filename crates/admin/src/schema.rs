//! Bidirectional mapping between internal record fields and remote columns.
//!
//! The hosted tables were created by hand and do not agree with the record
//! shapes in `shoebox-core`: the users table stores the primary phone as
//! `phone_number` (older rows use `phone1` or `phone`) and the e-mail as
//! `gmail`; the products table calls the title `product_title`. Each
//! [`Schema`] lists, per internal field, the external aliases in priority
//! order. The first alias is the canonical column written on the wire.
//!
//! Reading coalesces the first non-blank alias and fills defaults, then
//! validates the row by deserialising it into the typed record. Writing
//! renames internal fields to their canonical column and strips
//! store-assigned fields.

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shoebox_core::{Product, Record, User, UserPatch};

use crate::config::RemoteConfig;

/// One internal field and the external columns it may arrive under.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub internal: &'static str,
    /// Priority order; the first entry is written on the wire.
    pub aliases: &'static [&'static str],
}

impl FieldMap {
    /// Canonical external column.
    #[must_use]
    pub fn canonical(&self) -> &'static str {
        self.aliases.first().copied().unwrap_or(self.internal)
    }
}

/// Value used when a field is absent, null, or blank after coalescing.
#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    Text(&'static str),
    Zero,
}

impl FieldDefault {
    fn value(self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.to_string()),
            Self::Zero => Value::from(0),
        }
    }
}

/// Mapping table for one remote table.
#[derive(Debug)]
pub struct Schema {
    pub kind: &'static str,
    pub fields: &'static [FieldMap],
    pub defaults: &'static [(&'static str, FieldDefault)],
    /// Fields the store assigns; never written.
    pub server_assigned: &'static [&'static str],
}

/// Why a remote row could not be turned into a record.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("row does not match the {kind} shape: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub static USER_SCHEMA: Schema = Schema {
    kind: "user",
    fields: &[
        FieldMap {
            internal: "phone1",
            aliases: &["phone_number", "phone1", "phone"],
        },
        FieldMap {
            internal: "email",
            aliases: &["gmail", "email"],
        },
    ],
    defaults: &[
        ("email", FieldDefault::Text("")),
        ("name", FieldDefault::Text("")),
        ("phone1", FieldDefault::Text("")),
        ("phone2", FieldDefault::Text("")),
        ("pin", FieldDefault::Text("")),
        ("city", FieldDefault::Text("")),
        ("country", FieldDefault::Text("")),
        ("points", FieldDefault::Zero),
    ],
    server_assigned: &["id", "created_at"],
};

pub static PRODUCT_SCHEMA: Schema = Schema {
    kind: "product",
    fields: &[FieldMap {
        internal: "title",
        aliases: &["product_title", "title"],
    }],
    defaults: &[
        ("title", FieldDefault::Text("Untitled")),
        ("sku", FieldDefault::Text("")),
        ("category", FieldDefault::Text("")),
        ("colour", FieldDefault::Text("")),
        ("size_6", FieldDefault::Zero),
        ("size_7", FieldDefault::Zero),
        ("size_8", FieldDefault::Zero),
        ("size_9", FieldDefault::Zero),
        ("size_10", FieldDefault::Zero),
        ("size_11", FieldDefault::Zero),
    ],
    server_assigned: &["id", "created_at"],
};

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl Schema {
    /// Translate a raw remote row into the internal field layout.
    ///
    /// Nulls are dropped, aliases are coalesced in priority order and every
    /// alias key is removed, then defaults fill whatever is still missing.
    /// Columns the schema does not mention pass through unchanged.
    #[must_use]
    pub fn to_internal(&self, mut row: Map<String, Value>) -> Map<String, Value> {
        row.retain(|_, v| !v.is_null());

        for field in self.fields {
            let chosen = field
                .aliases
                .iter()
                .find_map(|alias| row.get(*alias).filter(|v| !is_blank(v)).cloned());
            for alias in field.aliases {
                row.remove(*alias);
            }
            if let Some(value) = chosen {
                row.insert(field.internal.to_string(), value);
            }
        }

        for (name, default) in self.defaults {
            let missing = row.get(*name).is_none_or(is_blank);
            if missing {
                row.insert((*name).to_string(), default.value());
            }
        }

        row
    }

    /// Translate internal fields into the columns written on the wire.
    ///
    /// Store-assigned fields are dropped and mapped fields are renamed to
    /// their canonical column, so no internal-only alias is ever emitted.
    #[must_use]
    pub fn to_external(&self, mut fields: Map<String, Value>) -> Map<String, Value> {
        for name in self.server_assigned {
            fields.remove(*name);
        }
        for field in self.fields {
            if let Some(value) = fields.remove(field.internal) {
                fields.insert(field.canonical().to_string(), value);
            }
        }
        fields
    }

    /// Map and validate one remote row.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the row is not an object or does not fit the
    /// record shape after mapping.
    pub fn decode<R: DeserializeOwned>(&self, row: Value) -> Result<R, SchemaError> {
        let Value::Object(map) = row else {
            return Err(SchemaError::NotAnObject(json_kind(&row)));
        };
        serde_json::from_value(Value::Object(self.to_internal(map))).map_err(|source| {
            SchemaError::Shape {
                kind: self.kind,
                source,
            }
        })
    }

    /// Serialise an input value and map it to external columns.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotAnObject` if the value does not serialise to
    /// a JSON object.
    pub fn encode<T: Serialize>(&self, input: &T) -> Result<Map<String, Value>, SchemaError> {
        match serde_json::to_value(input) {
            Ok(Value::Object(map)) => Ok(self.to_external(map)),
            Ok(other) => Err(SchemaError::NotAnObject(json_kind(&other))),
            Err(source) => Err(SchemaError::Shape {
                kind: self.kind,
                source,
            }),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A record kind that lives in a remote table.
pub trait Mapped: Record<New: Serialize, Patch: Serialize> {
    /// Mapping table for this kind.
    fn schema() -> &'static Schema;

    /// Remote table holding this kind.
    fn table(config: &RemoteConfig) -> &str;

    /// Write-only columns carried by a patch but absent from its serialised
    /// form. They go to the remote store and nowhere else.
    fn write_only(_patch: &Self::Patch) -> Map<String, Value> {
        Map::new()
    }
}

impl Mapped for User {
    fn schema() -> &'static Schema {
        &USER_SCHEMA
    }

    fn table(config: &RemoteConfig) -> &str {
        &config.users_table
    }

    fn write_only(patch: &UserPatch) -> Map<String, Value> {
        let mut extra = Map::new();
        if let Some(password) = &patch.password {
            extra.insert(
                "password".to_string(),
                Value::String(password.expose_secret().to_string()),
            );
        }
        extra
    }
}

impl Mapped for Product {
    fn schema() -> &'static Schema {
        &PRODUCT_SCHEMA
    }

    fn table(config: &RemoteConfig) -> &str {
        &config.products_table
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use shoebox_core::{NewProduct, ProductPatch, Size, SizeRun};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_phone_number_surfaces_as_phone1() {
        let user: User = USER_SCHEMA
            .decode(json!({
                "id": "u1",
                "name": "Alice",
                "phone_number": "555-0101",
                "created_at": "2024-05-01T12:00:00+00:00"
            }))
            .unwrap();
        assert_eq!(user.phone1, "555-0101");
        assert_eq!(user.phone2, "");
        assert_eq!(user.email, "");
        assert_eq!(user.points, 0);
    }

    #[test]
    fn test_alias_priority_skips_blank_values() {
        let row = USER_SCHEMA.to_internal(object(json!({
            "phone_number": "",
            "phone1": null,
            "phone": "555-0300",
            "gmail": "alice@gmail.com",
            "email": "alice@example.com"
        })));
        assert_eq!(row["phone1"], "555-0300");
        assert_eq!(row["email"], "alice@gmail.com");
        assert!(!row.contains_key("phone_number"));
        assert!(!row.contains_key("phone"));
        assert!(!row.contains_key("gmail"));
    }

    #[test]
    fn test_product_defaults() {
        let product: Product = PRODUCT_SCHEMA
            .decode(json!({
                "id": 7,
                "price": 20,
                "sku": "SH-7",
                "colour": null,
                "created_at": "2024-05-01T12:00:00Z"
            }))
            .unwrap();
        assert_eq!(product.id.as_str(), "7");
        assert_eq!(product.title, "Untitled");
        assert_eq!(product.colour, "");
        assert_eq!(product.stock, SizeRun::default());
        assert_eq!(product.total_stock(), 0);
    }

    #[test]
    fn test_product_title_is_read_from_product_title() {
        let product: Product = PRODUCT_SCHEMA
            .decode(json!({
                "id": "p1",
                "product_title": "Trail Runner",
                "title": "stale",
                "price": 99.5,
                "sku": "SH-10",
                "size_8": 3,
                "created_at": "2024-05-01T12:00:00Z"
            }))
            .unwrap();
        assert_eq!(product.title, "Trail Runner");
        assert_eq!(product.stock.get(Size::Eight), 3);
    }

    #[test]
    fn test_encode_renames_and_never_emits_alias() {
        let new = NewProduct {
            title: "X".to_string(),
            price: Decimal::from(10),
            sku: "SH-X".to_string(),
            ..NewProduct::default()
        };
        let wire = PRODUCT_SCHEMA.encode(&new).unwrap();
        assert_eq!(wire["product_title"], "X");
        assert!(!wire.contains_key("title"));
        assert_eq!(wire["size_6"], 0);
    }

    #[test]
    fn test_encode_drops_server_assigned_fields() {
        let wire = USER_SCHEMA.to_external(object(json!({
            "id": "u1",
            "created_at": "2024-01-01T00:00:00Z",
            "phone1": "555",
            "email": "a@b.c",
            "points": 3
        })));
        assert_eq!(
            Value::Object(wire),
            json!({ "phone_number": "555", "gmail": "a@b.c", "points": 3 })
        );
    }

    #[test]
    fn test_patch_encoding_only_carries_set_fields() {
        let patch = ProductPatch {
            title: Some("Renamed".to_string()),
            ..ProductPatch::default()
        };
        let wire = PRODUCT_SCHEMA.encode(&patch).unwrap();
        assert_eq!(Value::Object(wire), json!({ "product_title": "Renamed" }));
    }

    #[test]
    fn test_roundtrip_reproduces_internal_shape() {
        let original: User = serde_json::from_value(json!({
            "id": "1",
            "email": "alice@example.com",
            "name": "Alice Johnson",
            "phone1": "555-0101",
            "phone2": "555-0199",
            "pin": "1234",
            "city": "New York",
            "country": "USA",
            "points": 120,
            "created_at": "2023-01-15T10:00:00Z",
            "role": "user"
        }))
        .unwrap();

        let mut wire = USER_SCHEMA.encode(&original).unwrap();
        // The store hands back the fields it assigned.
        wire.insert("id".to_string(), json!("1"));
        wire.insert("created_at".to_string(), json!("2023-01-15T10:00:00Z"));

        let read: User = USER_SCHEMA.decode(Value::Object(wire)).unwrap();
        assert_eq!(read, original);
    }

    #[test]
    fn test_password_is_write_only() {
        let patch = UserPatch {
            password: Some(secrecy::SecretString::from("s3cret")),
            ..UserPatch::points(10)
        };
        let wire = USER_SCHEMA.encode(&patch).unwrap();
        assert!(!wire.contains_key("password"));
        assert_eq!(User::write_only(&patch)["password"], "s3cret");
    }

    #[test]
    fn test_decode_rejects_bad_rows() {
        assert!(matches!(
            USER_SCHEMA.decode::<User>(json!([1, 2])),
            Err(SchemaError::NotAnObject("an array"))
        ));
        // created_at is store-assigned and required on read.
        assert!(matches!(
            USER_SCHEMA.decode::<User>(json!({ "id": "1" })),
            Err(SchemaError::Shape { .. })
        ));
    }
}
