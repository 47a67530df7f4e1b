//! Persistence formats shared by every filter variant.
//!
//! Each variant converts itself into a plain record (see [`records`]) which
//! is then encoded in one of three interchangeable formats:
//!
//! * [`SerializationFormat::Binary`]: fixed big-endian layout, header then
//!   payload, with no field names or framing.
//! * [`SerializationFormat::Json`]: the record as a JSON object.
//! * [`SerializationFormat::Compact`]: the record as CBOR, self-describing
//!   and field-named but much smaller than JSON.
//!
//! Decoding always validates the record before a filter is rebuilt, so a
//! malformed payload never yields a partially constructed filter.
pub mod binary;
pub mod records;

pub use records::{
    BloomFilterData, CountingBloomFilterData, ScalableBloomFilterData,
    TtlCountingBloomFilterData,
};

use crate::error::{BloomError, Result};
use binary::WireReader;
use bytes::BytesMut;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum SerializationFormat {
    #[default]
    Binary,
    Json,
    Compact,
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "binary",
            Self::Json => "json",
            Self::Compact => "compact",
        };
        f.write_str(name)
    }
}

/// A persisted filter record with a fixed binary layout.
pub trait WireRecord: Serialize + DeserializeOwned {
    fn write_binary(&self, buf: &mut BytesMut);

    /// Reads exactly one record; the caller checks for trailing bytes.
    fn read_binary(reader: &mut WireReader<'_>) -> Result<Self>;

    /// Structural checks applied after every decode.
    fn validate(&self) -> Result<()>;
}

pub fn encode<R: WireRecord>(
    record: &R,
    format: SerializationFormat,
) -> Result<Vec<u8>> {
    match format {
        SerializationFormat::Binary => {
            let mut buf = BytesMut::new();
            record.write_binary(&mut buf);
            Ok(buf.to_vec())
        }
        SerializationFormat::Json => serde_json::to_vec(record)
            .map_err(|e| BloomError::Serialization(e.to_string())),
        SerializationFormat::Compact => serde_cbor::to_vec(record)
            .map_err(|e| BloomError::Serialization(e.to_string())),
    }
}

pub fn decode<R: WireRecord>(
    data: &[u8],
    format: SerializationFormat,
) -> Result<R> {
    let record: R = match format {
        SerializationFormat::Binary => {
            let mut reader = WireReader::new(data);
            let record = R::read_binary(&mut reader)?;
            reader.finish()?;
            record
        }
        SerializationFormat::Json => serde_json::from_slice(data).map_err(|e| {
            BloomError::Deserialization(format!("Malformed JSON payload: {e}"))
        })?,
        SerializationFormat::Compact => {
            serde_cbor::from_slice(data).map_err(|e| {
                BloomError::Deserialization(format!(
                    "Malformed compact payload: {e}"
                ))
            })?
        }
    };
    record.validate()?;
    Ok(record)
}

/// Narrows an in-memory size to the 32-bit integers the formats carry.
pub fn wire_int(value: usize, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        BloomError::Serialization(format!(
            "{field} = {value} does not fit in a 32-bit field"
        ))
    })
}
