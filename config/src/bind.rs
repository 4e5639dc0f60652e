//! # Binding
//!
//! Walks a target record and fills its fields from a merged tree.
//!
//! A record describes itself through [`Bind::fields`]: one [`Field`] per
//! settable field, in declaration order, carrying the field name, an optional
//! binding-key override, an optional default literal and an accessor to the
//! field's storage. `#[derive(Bind)]` generates that list; implementing
//! [`Bind`] by hand works the same way.
//!
//! Failure policy:
//! - a leaf value that does not fit its field is skipped and the field keeps
//!   its previous value (logged at `debug`)
//! - a default literal that does not parse is skipped the same way
//! - a nested record that fails is reported as [`BindError::Section`] tagged
//!   with the binding key, and aborts the enclosing record

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::coerce::{Coerce, kind_of};
use crate::normalize::canonical_key;
use crate::{BindError, CoerceError, Tree, Value};

/// A record that can be populated from a [`Tree`].
pub trait Bind: Sized {
    /// The record's own type name. When its canonical form is a top-level key
    /// mapping to a section, binding descends into that section first.
    fn type_name() -> &'static str;

    /// Field descriptors in declaration order.
    fn fields() -> Vec<Field<Self>>;
}

/// Storage of one field, assignable from a tree value or a default literal.
pub trait BindField {
    /// Assign a value present in the tree under `key`.
    fn bind_value(&mut self, key: &str, value: &Value) -> Result<(), BindError>;

    /// Assign the parsed default literal; called only when the key is absent.
    fn bind_default(&mut self, literal: &str) -> Result<(), CoerceError>;
}

/// Accessor from a record to one of its fields.
pub type Slot<T> = fn(&mut T) -> &mut dyn BindField;

/// Binding descriptor of a single record field.
pub struct Field<T> {
    name: &'static str,
    key: Option<&'static str>,
    default: Option<&'static str>,
    slot: Slot<T>
}

impl<T> Field<T> {
    pub fn new(name: &'static str, slot: Slot<T>) -> Self {
        Self {
            name,
            key: None,
            default: None,
            slot
        }
    }

    /// Bind under `key` instead of the canonical form of the field name.
    pub fn with_key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    /// Literal parsed into the field when its key is absent from the tree.
    pub fn with_default(mut self, literal: &'static str) -> Self {
        self.default = Some(literal);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_literal(&self) -> Option<&'static str> {
        self.default
    }

    /// Key looked up in the tree: the override if present, else the
    /// canonical form of the field name.
    pub fn binding_key(&self) -> Cow<'static, str> {
        match self.key {
            Some(key) => Cow::Borrowed(key),
            None => Cow::Owned(canonical_key(self.name))
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Populate `target` from `tree`.
///
/// ```
/// use confluent::{Bind, Tree, bind};
/// use serde_json::json;
///
/// #[derive(Debug, Default, Bind)]
/// struct Server {
///     #[bind(default = "localhost")]
///     host: String,
///     http_port: u16,
/// }
///
/// let tree: Tree = serde_json::from_value(json!({ "HttpPort": "9000" })).unwrap();
/// let tree = confluent::normalize_tree(&tree);
///
/// let mut server = Server::default();
/// bind(&mut server, &tree).unwrap();
/// assert_eq!(server.host, "localhost");
/// assert_eq!(server.http_port, 9000);
/// ```
pub fn bind<T: Bind>(target: &mut T, tree: &Tree) -> Result<(), BindError> {
    let own_key = canonical_key(T::type_name());
    if let Some(Value::Object(section)) = tree.get(own_key.as_str()) {
        return bind(target, section);
    }

    for field in T::fields() {
        let key = field.binding_key();
        let slot = (field.slot)(target);

        match tree.get(key.as_ref()) {
            Some(value) => slot.bind_value(&key, value)?,
            None => {
                if let Some(literal) = field.default {
                    if let Err(err) = slot.bind_default(literal) {
                        tracing::debug!(
                            record = T::type_name(),
                            field = field.name,
                            literal,
                            error = %err,
                            "Skipping unparsable default"
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// [`BindField::bind_value`] for nested records: a mapping recurses, anything
/// else leaves the record unchanged.
pub fn bind_record<T: Bind>(record: &mut T, key: &str, value: &Value) -> Result<(), BindError> {
    match value {
        Value::Object(section) => bind(record, section).map_err(|err| BindError::Section {
            key: key.to_string(),
            source: Box::new(err)
        }),
        other => {
            tracing::debug!(
                key,
                record = T::type_name(),
                found = kind_of(other),
                "Value for nested record is not a mapping, keeping previous value"
            );
            Ok(())
        }
    }
}

/// [`BindField::bind_value`] for leaves: coerce, or keep the previous value.
pub fn bind_leaf_value<T: Coerce>(slot: &mut T, key: &str, value: &Value) -> Result<(), BindError> {
    match T::coerce(value) {
        Ok(coerced) => *slot = coerced,
        Err(err) => {
            tracing::debug!(key, error = %err, "Value does not fit field type, keeping previous value");
        }
    }
    Ok(())
}

macro_rules! leaf_fields {
    ($($ty:ty),* $(,)?) => {$(
        impl BindField for $ty {
            fn bind_value(&mut self, key: &str, value: &Value) -> Result<(), BindError> {
                bind_leaf_value(self, key, value)
            }

            fn bind_default(&mut self, literal: &str) -> Result<(), CoerceError> {
                *self = <$ty as Coerce>::parse_default(literal)?;
                Ok(())
            }
        }
    )*};
}

leaf_fields!(
    String, PathBuf, bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64,
    Value,
);

impl<T: Coerce> BindField for Option<T> {
    fn bind_value(&mut self, key: &str, value: &Value) -> Result<(), BindError> {
        bind_leaf_value(self, key, value)
    }

    fn bind_default(&mut self, literal: &str) -> Result<(), CoerceError> {
        *self = <Self as Coerce>::parse_default(literal)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> BindField for Vec<T> {
    fn bind_value(&mut self, key: &str, value: &Value) -> Result<(), BindError> {
        bind_leaf_value(self, key, value)
    }

    fn bind_default(&mut self, literal: &str) -> Result<(), CoerceError> {
        *self = <Self as Coerce>::parse_default(literal)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> BindField for HashMap<String, T> {
    fn bind_value(&mut self, key: &str, value: &Value) -> Result<(), BindError> {
        bind_leaf_value(self, key, value)
    }

    fn bind_default(&mut self, literal: &str) -> Result<(), CoerceError> {
        *self = <Self as Coerce>::parse_default(literal)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> BindField for BTreeMap<String, T> {
    fn bind_value(&mut self, key: &str, value: &Value) -> Result<(), BindError> {
        bind_leaf_value(self, key, value)
    }

    fn bind_default(&mut self, literal: &str) -> Result<(), CoerceError> {
        *self = <Self as Coerce>::parse_default(literal)?;
        Ok(())
    }
}
