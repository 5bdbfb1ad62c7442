//! Plutus data and its canonical CBOR encoding.
//!
//! [`PlutusData`] is the one structured representation every on-chain
//! validator consumes. Two encoders that disagree by a single byte produce
//! two different datum hashes, so the encoder below emits exactly one byte
//! string per value:
//!
//! | value              | encoding                                              |
//! |--------------------|-------------------------------------------------------|
//! | `Constr 0..=6`     | tag `121 + alt`, fields                               |
//! | `Constr 7..=127`   | tag `1280 + alt - 7`, fields                          |
//! | `Constr` otherwise | tag `102`, `[alt, fields]`                            |
//! | list / fields      | `0x80` when empty, indefinite array otherwise         |
//! | map                | definite map, entries in order                        |
//! | integer            | major type 0/1, or bignum tag 2/3 beyond 64 bits      |
//! | bytes              | definite when ≤ 64 bytes, 64-byte chunks otherwise    |
//!
//! The decoder is more forgiving than the encoder: definite arrays and long
//! unchunked byte strings (both emitted by other ledger tooling) decode to the
//! same value. Round-tripping through [`PlutusData::from_cbor`] therefore
//! normalises, it never invents.

use minicbor::data::{Int, Tag, Type};
use minicbor::encode::Write;
use minicbor::{Decoder, Encoder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::CodecError;
use crate::config::{
    BIGNUM_NEGATIVE_TAG, BIGNUM_POSITIVE_TAG, CONSTR_TAG_GENERAL, CONSTR_TAG_LARGE_BASE,
    CONSTR_TAG_SMALL_BASE, PLUTUS_BYTES_CHUNK_SIZE,
};
use crate::crypto::hash::{blake2b_256, DatumHash};

/// Nesting limit for decoding. Deeper input is treated as malformed. Each
/// level costs two recursive frames, so the limit has to hold on a 2 MiB
/// thread stack in unoptimised builds.
pub const MAX_DECODE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// PlutusData
// ---------------------------------------------------------------------------

/// Structured on-chain data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlutusData {
    /// Constructor application: alternative index plus positional fields.
    Constr {
        alternative: u64,
        fields: Vec<PlutusData>,
    },
    /// Association list. Order is significant and preserved.
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    /// Arbitrary-precision on-chain, bounded to `i128` here.
    Integer(i128),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(alternative: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr {
            alternative,
            fields,
        }
    }

    /// `Constr 0 []`, the unit/void value.
    pub fn void() -> Self {
        Self::constr(0, Vec::new())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> String {
        match self {
            Self::Constr { alternative, fields } => {
                format!("constr {} with {} fields", alternative, fields.len())
            }
            Self::Map(_) => "map".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Integer(_) => "integer".to_string(),
            Self::Bytes(b) => format!("bytes[{}]", b.len()),
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            Self::Constr {
                alternative,
                fields,
            } => Some((*alternative, fields.as_slice())),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PlutusData]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(PlutusData, PlutusData)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Canonical CBOR bytes.
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        encode_data(self, &mut encoder).expect("writing CBOR into a Vec cannot fail");
        encoder.into_writer()
    }

    /// Parses CBOR bytes. The whole input must be consumed.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut decoder = Decoder::new(bytes);
        let data = decode_data(&mut decoder, 0)?;
        let consumed = decoder.position();
        if consumed != bytes.len() {
            return Err(CodecError::MalformedEncoding(format!(
                "{} trailing bytes after data item",
                bytes.len() - consumed
            )));
        }
        Ok(data)
    }

    /// Hash of the canonical encoding, as used for datum-hash outputs.
    pub fn hash(&self) -> DatumHash {
        blake2b_256(&self.to_cbor())
    }
}

/// Ledger snapshots carry datums as hex-encoded CBOR.
impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.to_cbor()))
    }
}

impl<'de> Deserialize<'de> for PlutusData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        PlutusData::from_cbor(&bytes).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Writes `data` in canonical form.
pub fn encode_data<W: Write>(
    data: &PlutusData,
    e: &mut Encoder<W>,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    match data {
        PlutusData::Constr {
            alternative,
            fields,
        } => {
            let alt = *alternative;
            match alt {
                0..=6 => {
                    e.tag(Tag::new(CONSTR_TAG_SMALL_BASE + alt))?;
                    encode_items(fields, e)?;
                }
                7..=127 => {
                    e.tag(Tag::new(CONSTR_TAG_LARGE_BASE + alt - 7))?;
                    encode_items(fields, e)?;
                }
                _ => {
                    e.tag(Tag::new(CONSTR_TAG_GENERAL))?;
                    e.array(2)?;
                    e.u64(alt)?;
                    encode_items(fields, e)?;
                }
            }
        }
        PlutusData::Map(entries) => {
            e.map(entries.len() as u64)?;
            for (k, v) in entries {
                encode_data(k, e)?;
                encode_data(v, e)?;
            }
        }
        PlutusData::List(items) => encode_items(items, e)?,
        PlutusData::Integer(n) => match Int::try_from(*n) {
            Ok(small) => {
                e.int(small)?;
            }
            Err(_) => {
                // Outside ±2^64: bignum over the minimal big-endian magnitude.
                let (tag, magnitude) = if *n >= 0 {
                    (BIGNUM_POSITIVE_TAG, *n as u128)
                } else {
                    (BIGNUM_NEGATIVE_TAG, (-1 - *n) as u128)
                };
                let be = magnitude.to_be_bytes();
                let start = be.iter().position(|b| *b != 0).unwrap_or(be.len());
                e.tag(Tag::new(tag))?;
                encode_bytes(&be[start..], e)?;
            }
        },
        PlutusData::Bytes(bytes) => encode_bytes(bytes, e)?,
    }
    Ok(())
}

fn encode_items<W: Write>(
    items: &[PlutusData],
    e: &mut Encoder<W>,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    if items.is_empty() {
        e.array(0)?;
        return Ok(());
    }
    e.begin_array()?;
    for item in items {
        encode_data(item, e)?;
    }
    e.end()?;
    Ok(())
}

fn encode_bytes<W: Write>(
    bytes: &[u8],
    e: &mut Encoder<W>,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    if bytes.len() <= PLUTUS_BYTES_CHUNK_SIZE {
        e.bytes(bytes)?;
        return Ok(());
    }
    e.begin_bytes()?;
    for chunk in bytes.chunks(PLUTUS_BYTES_CHUNK_SIZE) {
        e.bytes(chunk)?;
    }
    e.end()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn malformed(err: minicbor::decode::Error) -> CodecError {
    CodecError::MalformedEncoding(err.to_string())
}

fn decode_data(d: &mut Decoder<'_>, depth: usize) -> Result<PlutusData, CodecError> {
    if depth > MAX_DECODE_DEPTH {
        return Err(CodecError::MalformedEncoding(format!(
            "nesting deeper than {}",
            MAX_DECODE_DEPTH
        )));
    }

    match d.datatype().map_err(malformed)? {
        Type::Tag => {
            let tag = d.tag().map_err(malformed)?.as_u64();
            match tag {
                121..=127 => Ok(PlutusData::constr(
                    tag - CONSTR_TAG_SMALL_BASE,
                    decode_items(d, depth)?,
                )),
                1280..=1400 => Ok(PlutusData::constr(
                    tag - CONSTR_TAG_LARGE_BASE + 7,
                    decode_items(d, depth)?,
                )),
                CONSTR_TAG_GENERAL => {
                    if d.array().map_err(malformed)? != Some(2) {
                        return Err(CodecError::MalformedEncoding(
                            "general constructor must be a 2-element array".to_string(),
                        ));
                    }
                    let alternative = d.u64().map_err(malformed)?;
                    Ok(PlutusData::constr(alternative, decode_items(d, depth)?))
                }
                BIGNUM_POSITIVE_TAG | BIGNUM_NEGATIVE_TAG => {
                    let bytes = decode_bytes(d)?;
                    let magnitude = bignum_magnitude(&bytes)?;
                    let value = if tag == BIGNUM_POSITIVE_TAG {
                        magnitude
                    } else {
                        -1 - magnitude
                    };
                    Ok(PlutusData::Integer(value))
                }
                other => Err(CodecError::MalformedEncoding(format!(
                    "unexpected CBOR tag {}",
                    other
                ))),
            }
        }
        Type::Map | Type::MapIndef => {
            let mut entries = Vec::new();
            match d.map().map_err(malformed)? {
                Some(len) => {
                    for _ in 0..len {
                        let k = decode_data(d, depth + 1)?;
                        let v = decode_data(d, depth + 1)?;
                        entries.push((k, v));
                    }
                }
                None => {
                    while !at_break(d)? {
                        let k = decode_data(d, depth + 1)?;
                        let v = decode_data(d, depth + 1)?;
                        entries.push((k, v));
                    }
                    skip_break(d);
                }
            }
            Ok(PlutusData::Map(entries))
        }
        Type::Array | Type::ArrayIndef => Ok(PlutusData::List(decode_items(d, depth)?)),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => {
            let n = d.int().map_err(malformed)?;
            Ok(PlutusData::Integer(i128::from(n)))
        }
        Type::Bytes | Type::BytesIndef => Ok(PlutusData::Bytes(decode_bytes(d)?)),
        other => Err(CodecError::MalformedEncoding(format!(
            "CBOR type {:?} is not Plutus data",
            other
        ))),
    }
}

/// Array of data items, definite or indefinite.
fn decode_items(d: &mut Decoder<'_>, depth: usize) -> Result<Vec<PlutusData>, CodecError> {
    let mut items = Vec::new();
    match d.array().map_err(malformed)? {
        Some(len) => {
            for _ in 0..len {
                items.push(decode_data(d, depth + 1)?);
            }
        }
        None => {
            while !at_break(d)? {
                items.push(decode_data(d, depth + 1)?);
            }
            skip_break(d);
        }
    }
    Ok(items)
}

fn decode_bytes(d: &mut Decoder<'_>) -> Result<Vec<u8>, CodecError> {
    match d.datatype().map_err(malformed)? {
        Type::Bytes => Ok(d.bytes().map_err(malformed)?.to_vec()),
        Type::BytesIndef => {
            let mut out = Vec::new();
            for chunk in d.bytes_iter().map_err(malformed)? {
                out.extend_from_slice(chunk.map_err(malformed)?);
            }
            Ok(out)
        }
        other => Err(CodecError::MalformedEncoding(format!(
            "expected bytes, found CBOR type {:?}",
            other
        ))),
    }
}

fn at_break(d: &Decoder<'_>) -> Result<bool, CodecError> {
    Ok(d.datatype().map_err(malformed)? == Type::Break)
}

/// Consumes the single `0xff` byte that terminates an indefinite container.
fn skip_break(d: &mut Decoder<'_>) {
    d.set_position(d.position() + 1);
}

fn bignum_magnitude(bytes: &[u8]) -> Result<i128, CodecError> {
    let significant: &[u8] = match bytes.iter().position(|b| *b != 0) {
        Some(start) => &bytes[start..],
        None => &[],
    };
    if significant.len() > 16 {
        return Err(CodecError::MalformedEncoding(format!(
            "bignum of {} bytes exceeds 128 bits",
            significant.len()
        )));
    }
    let mut buf = [0u8; 16];
    buf[16 - significant.len()..].copy_from_slice(significant);
    i128::try_from(u128::from_be_bytes(buf)).map_err(|_| {
        CodecError::MalformedEncoding("bignum exceeds the supported integer range".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(data: &PlutusData) -> String {
        hex::encode(data.to_cbor())
    }

    #[test]
    fn void_is_d87980() {
        assert_eq!(hex_of(&PlutusData::void()), "d87980");
    }

    #[test]
    fn small_constr_uses_indefinite_fields() {
        let data = PlutusData::constr(1, vec![PlutusData::Integer(5)]);
        assert_eq!(hex_of(&data), "d87a9f05ff");
    }

    #[test]
    fn large_constr_tags() {
        let seven = PlutusData::constr(7, vec![]);
        // tag 1280 = 0xd9 0x0500
        assert_eq!(hex_of(&seven), "d9050080");

        let big = PlutusData::constr(200, vec![]);
        // tag 102, [200, []]
        assert_eq!(hex_of(&big), "d8668218c880");
    }

    #[test]
    fn integers_pick_shortest_head() {
        assert_eq!(hex_of(&PlutusData::Integer(0)), "00");
        assert_eq!(hex_of(&PlutusData::Integer(-1)), "20");
        assert_eq!(hex_of(&PlutusData::Integer(1_000_000)), "1a000f4240");
    }

    #[test]
    fn integers_beyond_64_bits_use_bignum() {
        let n = PlutusData::Integer(1i128 << 64);
        assert_eq!(hex_of(&n), "c249010000000000000000");
        assert_eq!(PlutusData::from_cbor(&n.to_cbor()).unwrap(), n);

        let neg = PlutusData::Integer(-(1i128 << 64) - 1);
        assert_eq!(hex_of(&neg), "c349010000000000000000");
        assert_eq!(PlutusData::from_cbor(&neg.to_cbor()).unwrap(), neg);
    }

    #[test]
    fn long_bytes_are_chunked() {
        let data = PlutusData::Bytes(vec![0xAB; 100]);
        let cbor = data.to_cbor();
        assert_eq!(cbor[0], 0x5f, "indefinite byte string");
        assert_eq!(*cbor.last().unwrap(), 0xff);
        assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);
    }

    #[test]
    fn definite_arrays_decode_to_same_value() {
        // [1, 2] as a definite array.
        let definite = hex::decode("820102").unwrap();
        let data = PlutusData::from_cbor(&definite).unwrap();
        assert_eq!(
            data,
            PlutusData::List(vec![PlutusData::Integer(1), PlutusData::Integer(2)])
        );
        // Re-encoding normalises to the indefinite form.
        assert_eq!(hex_of(&data), "9f0102ff");
    }

    #[test]
    fn nested_structure_roundtrip() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::Map(vec![(
                    PlutusData::Bytes(b"k".to_vec()),
                    PlutusData::List(vec![PlutusData::Integer(-42)]),
                )]),
                PlutusData::constr(3, vec![PlutusData::Bytes(vec![])]),
                PlutusData::List(vec![]),
            ],
        );
        assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let err = PlutusData::from_cbor(&[0x00, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }

    #[test]
    fn truncated_input_rejected() {
        // Indefinite array that never terminates.
        let err = PlutusData::from_cbor(&[0x9f, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }

    #[test]
    fn text_strings_are_not_plutus_data() {
        // "a" as a CBOR text string.
        let err = PlutusData::from_cbor(&[0x61, 0x61]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }

    #[test]
    fn unknown_tag_rejected() {
        // tag 24 wrapping an integer.
        let err = PlutusData::from_cbor(&[0xd8, 0x18, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }

    #[test]
    fn serde_hex_roundtrip() {
        let data = PlutusData::constr(0, vec![PlutusData::Integer(7)]);
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, "\"d8799f07ff\"");
        let back: PlutusData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    /// `depth` nested single-element arrays around the integer 0.
    fn nested_lists(depth: usize) -> Vec<u8> {
        let mut bytes = vec![0x81; depth];
        bytes.push(0x00);
        bytes
    }

    #[test]
    fn nesting_limit_holds_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let at_limit = PlutusData::from_cbor(&nested_lists(MAX_DECODE_DEPTH));
                let past_limit = PlutusData::from_cbor(&nested_lists(MAX_DECODE_DEPTH + 1));
                let hostile = PlutusData::from_cbor(&nested_lists(100_000));
                (at_limit, past_limit, hostile)
            })
            .unwrap();
        let (at_limit, past_limit, hostile) = handle.join().unwrap();

        assert!(at_limit.is_ok());
        assert!(matches!(past_limit, Err(CodecError::MalformedEncoding(_))));
        assert!(matches!(hostile, Err(CodecError::MalformedEncoding(_))));
    }

    #[test]
    fn bytes_chunk_boundary() {
        let exact = PlutusData::Bytes(vec![0x11; 64]).to_cbor();
        assert_eq!(&exact[..2], &[0x58, 0x40], "64 bytes stay definite");
        assert_eq!(exact.len(), 66);

        let over = PlutusData::Bytes(vec![0x11; 65]).to_cbor();
        assert_eq!(over[0], 0x5f);
        // One full chunk, then a one-byte chunk, then the break.
        assert_eq!(&over[1..3], &[0x58, 0x40]);
        assert_eq!(&over[67..], &[0x41, 0x11, 0xff]);
    }

    #[test]
    fn constr_tag_boundary() {
        // tag 1400 = 0xd9 0x0578
        assert_eq!(hex_of(&PlutusData::constr(127, vec![])), "d9057880");
        // tag 102, [128, []]
        assert_eq!(hex_of(&PlutusData::constr(128, vec![])), "d86682188080");
        for alt in [6, 7, 127, 128] {
            let data = PlutusData::constr(alt, vec![PlutusData::Integer(1)]);
            assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
        }
    }

    #[test]
    fn integer_range_boundaries() {
        let two_64 = 1i128 << 64;
        // u64::MAX and -2^64 still fit a plain head.
        assert_eq!(hex_of(&PlutusData::Integer(two_64 - 1)), "1bffffffffffffffff");
        assert_eq!(hex_of(&PlutusData::Integer(-two_64)), "3bffffffffffffffff");
        assert!(hex_of(&PlutusData::Integer(two_64)).starts_with("c249"));
        assert!(hex_of(&PlutusData::Integer(-two_64 - 1)).starts_with("c349"));

        assert_eq!(
            hex_of(&PlutusData::Integer(i128::MAX)),
            "c2507fffffffffffffffffffffffffffffff"
        );
        assert_eq!(
            hex_of(&PlutusData::Integer(i128::MIN)),
            "c3507fffffffffffffffffffffffffffffff"
        );

        for n in [i128::MIN, -two_64 - 1, -two_64, two_64 - 1, two_64, i128::MAX] {
            let data = PlutusData::Integer(n);
            assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
        }
    }

    #[test]
    fn bignum_beyond_i128_rejected() {
        // tag 2 over 2^127, one past i128::MAX.
        let mut cbor = vec![0xc2, 0x50, 0x80];
        cbor.extend([0u8; 15]);
        let err = PlutusData::from_cbor(&cbor).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }
}
