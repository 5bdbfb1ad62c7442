//! Typed conversions between domain values and [`PlutusData`].
//!
//! A type joins the codec by implementing [`PlutusType`]: it names its
//! [`Schema`] and converts to and from data. [`decode`] always checks the
//! schema first, so conversions can assume the shape is right and only deal
//! with value-level constraints (integer ranges, for instance).

use super::schema::{Field, Schema, Variant};
use super::{CodecError, PlutusData};
use crate::crypto::hash::Hash;

/// A domain type with a canonical Plutus data representation.
///
/// Implementations must satisfy `from_plutus_data(&x.to_plutus_data()) == Ok(x)`
/// for every value `x`, and `to_plutus_data` must always produce data
/// accepted by `schema()`.
pub trait PlutusType: Sized {
    fn schema() -> Schema;

    fn to_plutus_data(&self) -> PlutusData;

    /// Converts data that has already passed `Self::schema().check`.
    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError>;
}

/// Typed value to Plutus data.
pub fn encode<T: PlutusType>(value: &T) -> PlutusData {
    value.to_plutus_data()
}

/// Plutus data to typed value, checking the schema first.
///
/// # Errors
///
/// [`CodecError::SchemaMismatch`] if the shape or a value range is wrong.
pub fn decode<T: PlutusType>(data: &PlutusData) -> Result<T, CodecError> {
    T::schema().check(data)?;
    T::from_plutus_data(data)
}

/// Canonical bytes of Plutus data.
pub fn serialize(data: &PlutusData) -> Vec<u8> {
    data.to_cbor()
}

/// Plutus data from bytes.
///
/// # Errors
///
/// [`CodecError::MalformedEncoding`] on invalid CBOR or trailing bytes.
pub fn deserialize(bytes: &[u8]) -> Result<PlutusData, CodecError> {
    PlutusData::from_cbor(bytes)
}

/// Typed value straight to canonical bytes.
pub fn to_cbor<T: PlutusType>(value: &T) -> Vec<u8> {
    serialize(&encode(value))
}

/// Typed value straight from bytes.
pub fn from_cbor<T: PlutusType>(bytes: &[u8]) -> Result<T, CodecError> {
    decode(&deserialize(bytes)?)
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

/// Positional reader over a constructor's fields.
///
/// ```rust,ignore
/// let mut f = Fields::of(data, "OutRef", 0)?;
/// let tx_id = f.next()?;
/// let index = f.next()?;
/// ```
pub struct Fields<'a> {
    type_name: &'static str,
    items: std::slice::Iter<'a, PlutusData>,
}

impl<'a> Fields<'a> {
    /// Fields of constructor `alternative`, failing on any other shape.
    pub fn of(
        data: &'a PlutusData,
        type_name: &'static str,
        alternative: u64,
    ) -> Result<Self, CodecError> {
        match data.as_constr() {
            Some((alt, fields)) if alt == alternative => Ok(Self {
                type_name,
                items: fields.iter(),
            }),
            _ => Err(CodecError::SchemaMismatch {
                path: type_name.to_string(),
                expected: format!("constr {}", alternative),
                found: data.kind(),
            }),
        }
    }

    /// Decodes the next field.
    pub fn next<T: PlutusType>(&mut self) -> Result<T, CodecError> {
        let item = self.items.next().ok_or_else(|| CodecError::SchemaMismatch {
            path: self.type_name.to_string(),
            expected: "another field".to_string(),
            found: "end of fields".to_string(),
        })?;
        T::from_plutus_data(item)
    }
}

/// Alternative index and fields of a constructor, for sum types.
pub fn variant_of<'a>(
    data: &'a PlutusData,
    type_name: &'static str,
) -> Result<(u64, &'a [PlutusData]), CodecError> {
    data.as_constr().ok_or_else(|| CodecError::SchemaMismatch {
        path: type_name.to_string(),
        expected: "constructor".to_string(),
        found: data.kind(),
    })
}

/// Error for an alternative index outside a sum type's variants.
pub fn unknown_variant(type_name: &'static str, alternative: u64) -> CodecError {
    CodecError::SchemaMismatch {
        path: type_name.to_string(),
        expected: format!("known {} variant", type_name),
        found: format!("constr {}", alternative),
    }
}

fn integer(data: &PlutusData, type_name: &'static str) -> Result<i128, CodecError> {
    data.as_integer().ok_or_else(|| CodecError::SchemaMismatch {
        path: type_name.to_string(),
        expected: "integer".to_string(),
        found: data.kind(),
    })
}

fn out_of_range(type_name: &'static str, value: i128) -> CodecError {
    CodecError::SchemaMismatch {
        path: type_name.to_string(),
        expected: format!("{} in range", type_name),
        found: value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Primitive implementations
// ---------------------------------------------------------------------------

impl PlutusType for i128 {
    fn schema() -> Schema {
        Schema::Integer
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Integer(*self)
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        integer(data, "i128")
    }
}

impl PlutusType for i64 {
    fn schema() -> Schema {
        Schema::Integer
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Integer(i128::from(*self))
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let n = integer(data, "i64")?;
        i64::try_from(n).map_err(|_| out_of_range("i64", n))
    }
}

impl PlutusType for u64 {
    fn schema() -> Schema {
        Schema::Integer
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Integer(i128::from(*self))
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let n = integer(data, "u64")?;
        u64::try_from(n).map_err(|_| out_of_range("u64", n))
    }
}

impl PlutusType for bool {
    fn schema() -> Schema {
        Schema::sum("Bool", vec![Variant::unit("False"), Variant::unit("True")])
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(u64::from(*self), Vec::new())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "Bool")? {
            (0, []) => Ok(false),
            (1, []) => Ok(true),
            (alt, _) => Err(unknown_variant("Bool", alt)),
        }
    }
}

impl<const N: usize> PlutusType for Hash<N> {
    fn schema() -> Schema {
        Schema::FixedBytes(N)
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Bytes(self.as_bytes().to_vec())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let bytes = data.as_bytes().ok_or_else(|| CodecError::SchemaMismatch {
            path: "hash".to_string(),
            expected: format!("bytes[{}]", N),
            found: data.kind(),
        })?;
        Hash::from_slice(bytes).map_err(|_| CodecError::SchemaMismatch {
            path: "hash".to_string(),
            expected: format!("bytes[{}]", N),
            found: data.kind(),
        })
    }
}

/// Opaque passthrough for fields whose shape the enclosing schema leaves
/// open.
impl PlutusType for PlutusData {
    fn schema() -> Schema {
        Schema::Any
    }

    fn to_plutus_data(&self) -> PlutusData {
        self.clone()
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        Ok(data.clone())
    }
}

/// Plutus `Maybe`: `Just x` is `Constr 0 [x]`, `Nothing` is `Constr 1 []`.
impl<T: PlutusType> PlutusType for Option<T> {
    fn schema() -> Schema {
        Schema::sum(
            "Maybe",
            vec![
                Variant::new("Just", vec![Field::new("value", T::schema())]),
                Variant::unit("Nothing"),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Some(value) => PlutusData::constr(0, vec![value.to_plutus_data()]),
            None => PlutusData::constr(1, Vec::new()),
        }
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "Maybe")? {
            (0, [value]) => Ok(Some(T::from_plutus_data(value)?)),
            (1, []) => Ok(None),
            (alt, _) => Err(unknown_variant("Maybe", alt)),
        }
    }
}

impl<T: PlutusType> PlutusType for Vec<T> {
    fn schema() -> Schema {
        Schema::list(T::schema())
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::List(self.iter().map(PlutusType::to_plutus_data).collect())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let items = data.as_list().ok_or_else(|| CodecError::SchemaMismatch {
            path: "list".to_string(),
            expected: "list".to_string(),
            found: data.kind(),
        })?;
        items.iter().map(T::from_plutus_data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::{blake2b_224, KeyHash};

    #[test]
    fn integers_roundtrip_and_range_check() {
        let data = encode(&42u64);
        assert_eq!(decode::<u64>(&data).unwrap(), 42);
        assert_eq!(decode::<i64>(&encode(&-7i64)).unwrap(), -7);

        let err = decode::<u64>(&PlutusData::Integer(-1)).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { .. }));
    }

    #[test]
    fn bool_encoding_matches_plutus() {
        assert_eq!(encode(&false), PlutusData::constr(0, vec![]));
        assert_eq!(encode(&true), PlutusData::constr(1, vec![]));
        assert!(decode::<bool>(&PlutusData::constr(2, vec![])).is_err());
    }

    #[test]
    fn option_encoding_matches_plutus_maybe() {
        let some = encode(&Some(5u64));
        assert_eq!(some, PlutusData::constr(0, vec![PlutusData::Integer(5)]));
        let none = encode(&Option::<u64>::None);
        assert_eq!(none, PlutusData::constr(1, vec![]));
        assert_eq!(decode::<Option<u64>>(&some).unwrap(), Some(5));
        assert_eq!(decode::<Option<u64>>(&none).unwrap(), None);
    }

    #[test]
    fn hashes_check_width() {
        let h = blake2b_224(b"k");
        assert_eq!(decode::<KeyHash>(&encode(&h)).unwrap(), h);
        let err = decode::<KeyHash>(&PlutusData::Bytes(vec![0; 27])).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { .. }));
    }

    #[test]
    fn nested_list_of_options() {
        let value = vec![Some(1u64), None, Some(3)];
        let bytes = to_cbor(&value);
        assert_eq!(from_cbor::<Vec<Option<u64>>>(&bytes).unwrap(), value);
    }

    #[test]
    fn malformed_bytes_surface_as_malformed_encoding() {
        let err = from_cbor::<u64>(&[0xff]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }
}
