// Copyright (C) 2013-2020 Blockstack PBC, a public benefit corporation
// Copyright (C) 2020 Stacks Open Internet Foundation
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io::{Read, Write};
use std::{error, fmt};

use crate::clarity::{
    BuffData, CharType, ClarityName, ClarityTypeError, ContractName, ListData, OptionalData,
    PrincipalData, QualifiedContractIdentifier, ResponseData, SequenceData, StandardPrincipalData,
    TupleData, Value, BOUND_VALUE_SERIALIZATION_BYTES, MAX_STRING_LEN, MAX_TYPE_DEPTH,
    MAX_VALUE_SIZE,
};
use crate::codec::{Error as codec_error, StacksMessageCodec};
use crate::util::hash::{hex_bytes, to_hex};
use crate::util::retry::BoundReader;

/// Errors that may occur in serialization or deserialization.
/// Any IOError from the supplied buffer will manifest as an IOError variant,
///   except for EOF -- if the deserialization code experiences an EOF, it is caught
///   and rethrown as DeserializationError
#[derive(Debug)]
pub enum SerializationError {
    IOError(std::io::Error),
    BadTypeError(ClarityTypeError),
    DeserializationError(String),
    SerializationError(String),
    LeftoverBytesInDeserialization,
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SerializationError::IOError(e) => {
                write!(f, "Serialization error caused by IO: {e}")
            }
            SerializationError::BadTypeError(e) => {
                write!(f, "Deserialization error, bad type, caused by: {e}")
            }
            SerializationError::DeserializationError(e) => {
                write!(f, "Deserialization error: {e}")
            }
            SerializationError::SerializationError(e) => {
                write!(f, "Serialization error: {e}")
            }
            SerializationError::LeftoverBytesInDeserialization => {
                write!(f, "Deserialization error: bytes left over in buffer")
            }
        }
    }
}

impl error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SerializationError::IOError(e) => Some(e),
            SerializationError::BadTypeError(e) => Some(e),
            _ => None,
        }
    }
}

// Note: a byte stream that describes a longer type than
//   there are available bytes to read will result in an IOError(UnexpectedEOF)
impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IOError(err)
    }
}

impl From<&str> for SerializationError {
    fn from(e: &str) -> Self {
        SerializationError::DeserializationError(e.into())
    }
}

impl From<ClarityTypeError> for SerializationError {
    fn from(e: ClarityTypeError) -> Self {
        SerializationError::BadTypeError(e)
    }
}

define_u8_enum!(TypePrefix {
    Int = 0,
    UInt = 1,
    Buffer = 2,
    BoolTrue = 3,
    BoolFalse = 4,
    PrincipalStandard = 5,
    PrincipalContract = 6,
    ResponseOk = 7,
    ResponseErr = 8,
    OptionalNone = 9,
    OptionalSome = 10,
    List = 11,
    Tuple = 12,
    StringASCII = 13,
    StringUTF8 = 14
});

impl From<&PrincipalData> for TypePrefix {
    fn from(v: &PrincipalData) -> TypePrefix {
        match v {
            PrincipalData::Standard(_) => TypePrefix::PrincipalStandard,
            PrincipalData::Contract(_) => TypePrefix::PrincipalContract,
        }
    }
}

impl From<&Value> for TypePrefix {
    fn from(v: &Value) -> TypePrefix {
        match v {
            Value::Int(_) => TypePrefix::Int,
            Value::UInt(_) => TypePrefix::UInt,
            Value::Bool(value) => {
                if *value {
                    TypePrefix::BoolTrue
                } else {
                    TypePrefix::BoolFalse
                }
            }
            Value::Principal(p) => TypePrefix::from(p),
            Value::Response(response) => {
                if response.committed {
                    TypePrefix::ResponseOk
                } else {
                    TypePrefix::ResponseErr
                }
            }
            Value::Optional(OptionalData { data: None }) => TypePrefix::OptionalNone,
            Value::Optional(OptionalData { data: Some(_) }) => TypePrefix::OptionalSome,
            Value::Tuple(_) => TypePrefix::Tuple,
            Value::Sequence(SequenceData::Buffer(_)) => TypePrefix::Buffer,
            Value::Sequence(SequenceData::List(_)) => TypePrefix::List,
            Value::Sequence(SequenceData::String(CharType::ASCII(_))) => TypePrefix::StringASCII,
            Value::Sequence(SequenceData::String(CharType::UTF8(_))) => TypePrefix::StringUTF8,
        }
    }
}

/// Not a public trait,
///   this is just used to simplify serializing some types that
///   are repeatedly serialized or deserialized.
trait ClarityValueSerializable<T: std::marker::Sized> {
    fn serialize_write<W: Write>(&self, w: &mut W) -> std::io::Result<()>;
    fn deserialize_read<R: Read>(r: &mut R) -> Result<T, SerializationError>;
}

impl ClarityValueSerializable<StandardPrincipalData> for StandardPrincipalData {
    fn serialize_write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&[self.version()])?;
        w.write_all(&self.1)
    }

    fn deserialize_read<R: Read>(r: &mut R) -> Result<Self, SerializationError> {
        let mut version = [0; 1];
        let mut data = [0; 20];
        r.read_exact(&mut version)?;
        r.read_exact(&mut data)?;
        StandardPrincipalData::new(version[0], data).map_err(SerializationError::from)
    }
}

macro_rules! serialize_guarded_string {
    ($Name:ident) => {
        impl ClarityValueSerializable<$Name> for $Name {
            fn serialize_write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
                w.write_all(&self.len().to_be_bytes())?;
                // self.as_bytes() is always len bytes, because this is only used for GuardedStrings
                //   which are a subset of ASCII
                w.write_all(self.as_str().as_bytes())
            }

            fn deserialize_read<R: Read>(r: &mut R) -> Result<Self, SerializationError> {
                let mut len = [0; 1];
                r.read_exact(&mut len)?;
                let len = u8::from_be_bytes(len);
                if len > MAX_STRING_LEN {
                    return Err(SerializationError::DeserializationError(
                        "String too long".to_string(),
                    ));
                }

                let mut data = vec![0; len as usize];
                r.read_exact(&mut data)?;

                String::from_utf8(data)
                    .map_err(|_| "Non-UTF8 string data".into())
                    .and_then(|x| $Name::try_from(x).map_err(|_| "Illegal Clarity string".into()))
            }
        }
    };
}

serialize_guarded_string!(ClarityName);
serialize_guarded_string!(ContractName);

impl PrincipalData {
    fn inner_consensus_serialize<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&[TypePrefix::from(self) as u8])?;
        match self {
            PrincipalData::Standard(p) => p.serialize_write(w),
            PrincipalData::Contract(contract_identifier) => {
                contract_identifier.issuer.serialize_write(w)?;
                contract_identifier.name.serialize_write(w)
            }
        }
    }

    fn inner_consensus_deserialize<R: Read>(
        r: &mut R,
    ) -> Result<PrincipalData, SerializationError> {
        let mut header = [0];
        r.read_exact(&mut header)?;

        let prefix = TypePrefix::from_u8(header[0]).ok_or("Bad principal prefix")?;

        match prefix {
            TypePrefix::PrincipalStandard => {
                StandardPrincipalData::deserialize_read(r).map(PrincipalData::from)
            }
            TypePrefix::PrincipalContract => {
                let issuer = StandardPrincipalData::deserialize_read(r)?;
                let name = ContractName::deserialize_read(r)?;
                Ok(PrincipalData::from(QualifiedContractIdentifier {
                    issuer,
                    name,
                }))
            }
            _ => Err("Bad principal prefix".into()),
        }
    }
}

impl StacksMessageCodec for PrincipalData {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        self.inner_consensus_serialize(fd)
            .map_err(codec_error::WriteError)
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<PrincipalData, codec_error> {
        PrincipalData::inner_consensus_deserialize(fd)
            .map_err(|e| codec_error::DeserializeError(e.to_string()))
    }
}

impl Value {
    pub fn deserialize_read<R: Read>(r: &mut R) -> Result<Value, SerializationError> {
        Self::deserialize_read_count(r).map(|(value, _)| value)
    }

    /// Deserialize just like `deserialize_read` but also
    ///  return the bytes read
    pub fn deserialize_read_count<R: Read>(r: &mut R) -> Result<(Value, u64), SerializationError> {
        let mut bound_reader = BoundReader::from_reader(r, BOUND_VALUE_SERIALIZATION_BYTES as u64);
        let value = Value::inner_deserialize_read(&mut bound_reader, 0)?;
        let bytes_read = bound_reader.num_read();
        Ok((value, bytes_read))
    }

    fn inner_deserialize_read<R: Read>(
        r: &mut R,
        depth: u8,
    ) -> Result<Value, SerializationError> {
        if depth >= MAX_TYPE_DEPTH {
            return Err(ClarityTypeError::TypeSignatureTooDeep.into());
        }

        let mut header = [0];
        r.read_exact(&mut header)?;

        let prefix = TypePrefix::from_u8(header[0]).ok_or("Bad type prefix")?;

        match prefix {
            TypePrefix::Int => {
                let mut buffer = [0; 16];
                r.read_exact(&mut buffer)?;
                Ok(Value::Int(i128::from_be_bytes(buffer)))
            }
            TypePrefix::UInt => {
                let mut buffer = [0; 16];
                r.read_exact(&mut buffer)?;
                Ok(Value::UInt(u128::from_be_bytes(buffer)))
            }
            TypePrefix::Buffer => {
                let mut buffer_len = [0; 4];
                r.read_exact(&mut buffer_len)?;
                let buffer_len = u32::from_be_bytes(buffer_len);
                if buffer_len > MAX_VALUE_SIZE {
                    return Err("Illegal buffer type size".into());
                }

                let mut data = vec![0; buffer_len as usize];
                r.read_exact(&mut data[..])?;

                Value::buff_from(data).map_err(|_| "Bad buffer".into())
            }
            TypePrefix::BoolTrue => Ok(Value::Bool(true)),
            TypePrefix::BoolFalse => Ok(Value::Bool(false)),
            TypePrefix::PrincipalStandard => {
                StandardPrincipalData::deserialize_read(r).map(Value::from)
            }
            TypePrefix::PrincipalContract => {
                let issuer = StandardPrincipalData::deserialize_read(r)?;
                let name = ContractName::deserialize_read(r)?;
                Ok(Value::from(QualifiedContractIdentifier { issuer, name }))
            }
            TypePrefix::ResponseOk | TypePrefix::ResponseErr => {
                let committed = prefix == TypePrefix::ResponseOk;

                let data = Value::inner_deserialize_read(r, depth + 1)?;
                let value = if committed {
                    Value::okay(data)
                } else {
                    Value::error(data)
                }
                .map_err(|_x| "Value too large")?;

                Ok(value)
            }
            TypePrefix::OptionalNone => Ok(Value::none()),
            TypePrefix::OptionalSome => {
                let value = Value::some(Value::inner_deserialize_read(r, depth + 1)?)
                    .map_err(|_x| "Value too large")?;

                Ok(value)
            }
            TypePrefix::List => {
                let mut len = [0; 4];
                r.read_exact(&mut len)?;
                let len = u32::from_be_bytes(len);

                if len > MAX_VALUE_SIZE {
                    return Err("Illegal list type".into());
                }

                let mut items = Vec::with_capacity(len as usize);
                for _i in 0..len {
                    items.push(Value::inner_deserialize_read(r, depth + 1)?);
                }

                Value::list_from(items).map_err(|_| "Illegal list type".into())
            }
            TypePrefix::Tuple => {
                let mut len = [0; 4];
                r.read_exact(&mut len)?;
                let len = u32::from_be_bytes(len);

                if len > MAX_VALUE_SIZE {
                    return Err(SerializationError::DeserializationError(
                        "Illegal tuple type".to_string(),
                    ));
                }

                let mut items = Vec::with_capacity(len as usize);
                for _i in 0..len {
                    let key = ClarityName::deserialize_read(r)?;
                    let value = Value::inner_deserialize_read(r, depth + 1)?;
                    items.push((key, value))
                }

                TupleData::from_data(items)
                    .map_err(|_| "Illegal tuple type".into())
                    .map(Value::from)
            }
            TypePrefix::StringASCII => {
                let mut buffer_len = [0; 4];
                r.read_exact(&mut buffer_len)?;
                let buffer_len = u32::from_be_bytes(buffer_len);
                if buffer_len > MAX_VALUE_SIZE {
                    return Err("Illegal string-ascii type size".into());
                }

                let mut data = vec![0; buffer_len as usize];
                r.read_exact(&mut data[..])?;

                Value::string_ascii_from_bytes(data).map_err(|_| "Bad string".into())
            }
            TypePrefix::StringUTF8 => {
                let mut total_len = [0; 4];
                r.read_exact(&mut total_len)?;
                let total_len = u32::from_be_bytes(total_len);
                if total_len > MAX_VALUE_SIZE {
                    return Err("Illegal string-utf8 type size".into());
                }

                let mut data: Vec<u8> = vec![0; total_len as usize];
                r.read_exact(&mut data[..])?;

                Value::string_utf8_from_bytes(data).map_err(|_| "Illegal string_utf8 type".into())
            }
        }
    }

    pub fn serialize_write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&[TypePrefix::from(self) as u8])?;
        match self {
            Value::Int(value) => w.write_all(&value.to_be_bytes())?,
            Value::UInt(value) => w.write_all(&value.to_be_bytes())?,
            Value::Principal(PrincipalData::Standard(data)) => data.serialize_write(w)?,
            Value::Principal(PrincipalData::Contract(contract_identifier)) => {
                contract_identifier.issuer.serialize_write(w)?;
                contract_identifier.name.serialize_write(w)?;
            }
            Value::Response(response) => response.data.serialize_write(w)?,
            // Bool types don't need any more data.
            Value::Bool(_) => {}
            // None types don't need any more data.
            Value::Optional(OptionalData { data: None }) => {}
            Value::Optional(OptionalData { data: Some(value) }) => {
                value.serialize_write(w)?;
            }
            Value::Sequence(SequenceData::List(data)) => {
                w.write_all(&(data.data.len() as u32).to_be_bytes())?;
                for item in data.data.iter() {
                    item.serialize_write(w)?;
                }
            }
            Value::Sequence(SequenceData::Buffer(value)) => {
                w.write_all(&(value.data.len() as u32).to_be_bytes())?;
                w.write_all(&value.data)?
            }
            Value::Sequence(SequenceData::String(CharType::UTF8(value))) => {
                let total_len: u32 = value.data.iter().fold(0u32, |len, c| len + c.len() as u32);
                w.write_all(&(total_len.to_be_bytes()))?;
                for bytes in value.data.iter() {
                    w.write_all(bytes)?
                }
            }
            Value::Sequence(SequenceData::String(CharType::ASCII(value))) => {
                w.write_all(&(value.data.len() as u32).to_be_bytes())?;
                w.write_all(&value.data)?
            }
            Value::Tuple(data) => {
                w.write_all(&(data.data_map.len() as u32).to_be_bytes())?;
                for (key, value) in data.data_map.iter() {
                    key.serialize_write(w)?;
                    value.serialize_write(w)?;
                }
            }
        };

        Ok(())
    }

    /// This function attempts to deserialize a byte buffer into a
    /// Clarity Value, while ensuring that the whole byte buffer is
    /// consumed by the deserialization, erroring if it is not.
    pub fn try_deserialize_bytes_exact(bytes: &[u8]) -> Result<Value, SerializationError> {
        let input_length = bytes.len();
        let (value, read_count) = Value::deserialize_read_count(&mut &bytes[..])?;
        if read_count != (input_length as u64) {
            Err(SerializationError::LeftoverBytesInDeserialization)
        } else {
            Ok(value)
        }
    }

    pub fn try_deserialize_bytes_untyped(bytes: &[u8]) -> Result<Value, SerializationError> {
        Value::deserialize_read(&mut &bytes[..])
    }

    pub fn try_deserialize_hex_untyped(hex: &str) -> Result<Value, SerializationError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let data = hex_bytes(hex).map_err(|_| "Bad hex string")?;
        Value::try_deserialize_bytes_untyped(&data)
    }

    pub fn serialize_to_hex(&self) -> Result<String, SerializationError> {
        let mut byte_serialization = Vec::new();
        self.serialize_write(&mut byte_serialization)?;
        Ok(to_hex(byte_serialization.as_slice()))
    }

    pub fn serialized_size(&self) -> Result<u32, ClarityTypeError> {
        let mut counter = WriteCounter { count: 0 };
        self.serialize_write(&mut counter)
            .map_err(|_| ClarityTypeError::ValueTooLarge)?;
        Ok(counter.count)
    }
}

/// A writer that just counts the bytes written
struct WriteCounter {
    count: u32,
}

impl Write for WriteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input: u32 = buf.len().try_into().map_err(|_e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                "Serialization size would overflow u32",
            )
        })?;
        self.count = self.count.checked_add(input).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                "Serialization size would overflow u32",
            )
        })?;
        Ok(input as usize)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StacksMessageCodec for Value {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        self.serialize_write(fd).map_err(codec_error::WriteError)
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<Value, codec_error> {
        Value::deserialize_read(fd).map_err(|e| codec_error::DeserializeError(e.to_string()))
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod test {
    use super::*;

    fn check_serialization(value: &Value, hex: &str) {
        assert_eq!(value.serialize_to_hex().unwrap(), hex);
        let parsed = Value::try_deserialize_hex_untyped(hex).unwrap();
        assert_eq!(&parsed, value);
    }

    #[test]
    fn serialize_ints() {
        check_serialization(&Value::Int(1), "0000000000000000000000000000000001");
        check_serialization(&Value::Int(-1), "00ffffffffffffffffffffffffffffffff");
        check_serialization(&Value::UInt(1), "0100000000000000000000000000000001");
        check_serialization(&Value::UInt(u128::MAX), "01ffffffffffffffffffffffffffffffff");
    }

    #[test]
    fn serialize_bools_and_options() {
        check_serialization(&Value::Bool(true), "03");
        check_serialization(&Value::Bool(false), "04");
        check_serialization(&Value::none(), "09");
        check_serialization(&Value::some(Value::Bool(false)).unwrap(), "0a04");
        check_serialization(&Value::okay(Value::Int(1)).unwrap(), "070000000000000000000000000000000001");
        check_serialization(&Value::error(Value::Int(1)).unwrap(), "080000000000000000000000000000000001");
    }

    #[test]
    fn serialize_buffers_and_strings() {
        check_serialization(&Value::buff_from(vec![0xde, 0xad, 0xbe, 0xef]).unwrap(), "0200000004deadbeef");
        check_serialization(&Value::buff_from(vec![]).unwrap(), "0200000000");
        check_serialization(
            &Value::string_ascii_from_bytes("hello".as_bytes().to_vec()).unwrap(),
            "0d0000000568656c6c6f");
        check_serialization(
            &Value::string_utf8_from_bytes("hello".as_bytes().to_vec()).unwrap(),
            "0e0000000568656c6c6f");
    }

    #[test]
    fn serialize_principals() {
        let standard = StandardPrincipalData::new(0x01, [0x02; 20]).unwrap();
        check_serialization(
            &Value::from(standard.clone()),
            "05010202020202020202020202020202020202020202");
        let contract = QualifiedContractIdentifier::new(standard, "tokens".into());
        check_serialization(
            &Value::from(contract),
            "0601020202020202020202020202020202020202020206746f6b656e73");
    }

    #[test]
    fn serialize_lists_and_tuples() {
        check_serialization(
            &Value::list_from(vec![Value::Int(1), Value::Int(2)]).unwrap(),
            "0b0000000200000000000000000000000000000000010000000000000000000000000000000002");
        check_serialization(&Value::list_from(vec![]).unwrap(), "0b00000000");

        // tuple fields serialize in lexicographic order regardless of insertion order
        let tuple_ab = TupleData::from_data(vec![
            ("b".into(), Value::Bool(false)),
            ("a".into(), Value::Bool(true)),
        ]).unwrap();
        check_serialization(&Value::from(tuple_ab), "0c00000002016103016204");
    }

    #[test]
    fn deserialize_bad_prefix() {
        assert!(Value::try_deserialize_hex_untyped("ff").is_err());
    }

    #[test]
    fn deserialize_too_deep() {
        // 16 nested `some` wrappers around an int exceeds the depth limit
        let mut hex = String::new();
        for _ in 0..16 {
            hex.push_str("0a");
        }
        hex.push_str("0000000000000000000000000000000001");
        assert!(Value::try_deserialize_hex_untyped(&hex).is_err());

        // 15 wrappers still parse
        let mut hex = String::new();
        for _ in 0..15 {
            hex.push_str("0a");
        }
        hex.push_str("0000000000000000000000000000000001");
        assert!(Value::try_deserialize_hex_untyped(&hex).is_ok());
    }

    #[test]
    fn deserialize_leftover_bytes() {
        assert!(Value::try_deserialize_bytes_exact(&[0x03, 0x03]).is_err());
        assert!(Value::try_deserialize_bytes_exact(&[0x03]).is_ok());
    }

    #[test]
    fn deserialize_bad_principal_version() {
        // version byte 0x20 is out of range
        assert!(Value::try_deserialize_hex_untyped(
            "05200202020202020202020202020202020202020202").is_err());
    }

    #[test]
    fn deserialize_duplicate_tuple_field() {
        // two fields, both named "a"
        assert!(Value::try_deserialize_hex_untyped("0c00000002016103016104").is_err());
    }

    #[test]
    fn deserialize_oversized_length_prefix() {
        // buffer claims 2MB
        assert!(Value::try_deserialize_hex_untyped("0200200000").is_err());
    }
}
