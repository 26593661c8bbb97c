//! Newtype IDs for type-safe record references.
//!
//! Record identifiers are opaque strings: the remote store assigns them on
//! insert and the local fallback store synthesises short random ones. Use the
//! `define_id!` macro so a user ID can never be passed where a product ID is
//! expected.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `into_inner()`
/// - `Display`, `From<String>`, `From<&str>` and `AsRef<str>`
///
/// Remote stores with integer primary keys hand back numbers; those are
/// accepted on deserialisation and kept in their decimal string form.
///
/// # Example
///
/// ```rust
/// # use shoebox_core::define_id;
/// define_id!(CustomerId);
/// define_id!(InvoiceId);
///
/// let customer_id = CustomerId::new("c-1");
/// let invoice_id = InvoiceId::new("c-1");
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = invoice_id;
/// assert_eq!(customer_id.as_str(), invoice_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                match <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)? {
                    ::serde_json::Value::String(s) => Ok(Self(s)),
                    ::serde_json::Value::Number(n) => Ok(Self(n.to_string())),
                    other => Err(::serde::de::Error::custom(format!(
                        "expected a string or integer id, got {other}"
                    ))),
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
