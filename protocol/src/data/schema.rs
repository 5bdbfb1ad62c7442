//! Static schema descriptions for Plutus data.
//!
//! Every datum and redeemer type declares its shape once, as a [`Schema`]
//! value: field order, variant order, byte widths. [`Schema::check`] is the
//! single interpreter of those descriptions; typed conversions run only
//! after it has accepted the data, so a shape error is always reported with
//! the path of the offending field instead of surfacing halfway through a
//! conversion.

use std::fmt;

use super::{CodecError, PlutusData};

/// Shape of a Plutus data value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    Integer,
    Bytes,
    /// Byte string of exactly this many bytes (hashes, ids).
    FixedBytes(usize),
    /// Byte string of at most this many bytes (asset names).
    BoundedBytes(usize),
    List(Box<Schema>),
    Map(Box<Schema>, Box<Schema>),
    /// Sum of products. The alternative index of each variant is its
    /// position in the vector; a record is a sum with one variant.
    Sum {
        name: &'static str,
        variants: Vec<Variant>,
    },
    /// Opaque data, accepted as-is.
    Any,
}

/// One constructor of a [`Schema::Sum`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

/// A named positional field. The name only appears in error paths; the
/// encoding is positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
}

impl Field {
    pub fn new(name: &'static str, schema: Schema) -> Self {
        Self { name, schema }
    }
}

impl Variant {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }

    /// A constructor without fields.
    pub fn unit(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }
}

impl Schema {
    /// Single-constructor record (alternative 0).
    pub fn record(name: &'static str, fields: Vec<Field>) -> Self {
        Self::Sum {
            name,
            variants: vec![Variant::new(name, fields)],
        }
    }

    pub fn sum(name: &'static str, variants: Vec<Variant>) -> Self {
        Self::Sum { name, variants }
    }

    pub fn list(item: Schema) -> Self {
        Self::List(Box::new(item))
    }

    pub fn map(key: Schema, value: Schema) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Verifies that `data` has this shape.
    ///
    /// # Errors
    ///
    /// [`CodecError::SchemaMismatch`] naming the first offending path.
    pub fn check(&self, data: &PlutusData) -> Result<(), CodecError> {
        let mut path = Vec::new();
        self.check_at(data, &mut path)
    }

    fn check_at(&self, data: &PlutusData, path: &mut Vec<String>) -> Result<(), CodecError> {
        let mismatch = |path: &Vec<String>, expected: String| CodecError::SchemaMismatch {
            path: render_path(path),
            expected,
            found: data.kind(),
        };

        match (self, data) {
            (Schema::Any, _) => Ok(()),
            (Schema::Integer, PlutusData::Integer(_)) => Ok(()),
            (Schema::Bytes, PlutusData::Bytes(_)) => Ok(()),
            (Schema::FixedBytes(n), PlutusData::Bytes(b)) if b.len() == *n => Ok(()),
            (Schema::BoundedBytes(n), PlutusData::Bytes(b)) if b.len() <= *n => Ok(()),
            (Schema::List(item), PlutusData::List(items)) => {
                for (i, element) in items.iter().enumerate() {
                    path.push(format!("[{}]", i));
                    item.check_at(element, path)?;
                    path.pop();
                }
                Ok(())
            }
            (Schema::Map(key, value), PlutusData::Map(entries)) => {
                for (i, (k, v)) in entries.iter().enumerate() {
                    path.push(format!("{{key {}}}", i));
                    key.check_at(k, path)?;
                    path.pop();
                    path.push(format!("{{value {}}}", i));
                    value.check_at(v, path)?;
                    path.pop();
                }
                Ok(())
            }
            (
                Schema::Sum { name, variants },
                PlutusData::Constr {
                    alternative,
                    fields,
                },
            ) => {
                let variant = usize::try_from(*alternative)
                    .ok()
                    .and_then(|i| variants.get(i))
                    .ok_or_else(|| {
                        mismatch(
                            &*path,
                            format!("{} constructor 0..{}", name, variants.len()),
                        )
                    })?;
                if variant.fields.len() != fields.len() {
                    return Err(mismatch(
                        &*path,
                        format!(
                            "{}.{} with {} fields",
                            name,
                            variant.name,
                            variant.fields.len()
                        ),
                    ));
                }
                for (field, value) in variant.fields.iter().zip(fields) {
                    path.push(field.name.to_string());
                    field.schema.check_at(value, path)?;
                    path.pop();
                }
                Ok(())
            }
            (expected, _) => Err(mismatch(&*path, expected.to_string())),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Integer => write!(f, "integer"),
            Schema::Bytes => write!(f, "bytes"),
            Schema::FixedBytes(n) => write!(f, "bytes[{}]", n),
            Schema::BoundedBytes(n) => write!(f, "bytes[..={}]", n),
            Schema::List(item) => write!(f, "list of {}", item),
            Schema::Map(k, v) => write!(f, "map of {} to {}", k, v),
            Schema::Sum { name, .. } => write!(f, "{}", name),
            Schema::Any => write!(f, "any data"),
        }
    }
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    let mut out = String::new();
    for segment in path {
        if !out.is_empty() && !segment.starts_with('[') && !segment.starts_with('{') {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}
