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

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::prelude::*;
use std::{error, fmt, str};

use regex::Regex;

use crate::address::StacksAddress;
use crate::codec::{read_next, write_next, Error as codec_error, StacksMessageCodec};
use crate::util::hash;

pub mod serialization;

pub const MAX_VALUE_SIZE: u32 = 1024 * 1024; // 1MB

pub const BOUND_VALUE_SERIALIZATION_BYTES: u32 = MAX_VALUE_SIZE * 2;

// UTF8 characters can require up to 4 bytes each
pub const MAX_UTF8_VALUE_SIZE: u32 = MAX_VALUE_SIZE / 4;

// nesting depth of compound values, enforced at construction and
// deserialization alike
pub const MAX_TYPE_DEPTH: u8 = 16;

pub const CONTRACT_MIN_NAME_LENGTH: usize = 1;
pub const CONTRACT_MAX_NAME_LENGTH: usize = 40;
pub const MAX_STRING_LEN: u8 = 128;

lazy_static! {
    pub static ref CLARITY_NAME_REGEX_STRING: String =
        "^[a-zA-Z]([a-zA-Z0-9]|[-_!?+<>=/*])*$|^[-+=/*]$|^[<>]=?$".into();
    pub static ref CLARITY_NAME_REGEX: Regex =
        Regex::new(CLARITY_NAME_REGEX_STRING.as_str()).unwrap();
    pub static ref CONTRACT_NAME_REGEX_STRING: String = format!(
        r#"([a-zA-Z](([a-zA-Z0-9]|[-_]){{{},{}}}))"#,
        CONTRACT_MIN_NAME_LENGTH.saturating_sub(1),
        // NOTE: this is deliberate.  Earlier versions of the node will accept contract principals whose names are up to
        // 128 bytes.  This behavior must be preserved for backwards-compatibility.
        MAX_STRING_LEN - 1
    );
    pub static ref CONTRACT_NAME_REGEX: Regex = Regex::new(
        format!("^{}$|^__transient$", CONTRACT_NAME_REGEX_STRING.as_str()).as_str()
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityTypeError {
    ValueTooLarge,
    TypeSignatureTooDeep,
    InvalidPrincipalVersion(u8),
    InvalidAsciiCharacter(u8),
    InvalidUtf8Encoding,
    DuplicateTupleField(String),
    NoSuchTupleField(String),
    BadNameValue(&'static str, String),
}

impl fmt::Display for ClarityTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClarityTypeError::ValueTooLarge => write!(f, "Value too large"),
            ClarityTypeError::TypeSignatureTooDeep => write!(f, "Type signature too deep"),
            ClarityTypeError::InvalidPrincipalVersion(v) => {
                write!(f, "Invalid principal version byte {v}")
            }
            ClarityTypeError::InvalidAsciiCharacter(c) => {
                write!(f, "Invalid ASCII character 0x{c:02x}")
            }
            ClarityTypeError::InvalidUtf8Encoding => write!(f, "Invalid UTF8 encoding"),
            ClarityTypeError::DuplicateTupleField(name) => {
                write!(f, "Duplicate tuple field \"{name}\"")
            }
            ClarityTypeError::NoSuchTupleField(name) => write!(f, "No such tuple field \"{name}\""),
            ClarityTypeError::BadNameValue(label, value) => {
                write!(f, "Bad name value {label}, {value}")
            }
        }
    }
}

impl error::Error for ClarityTypeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

guarded_string!(
    ClarityName,
    "ClarityName",
    CLARITY_NAME_REGEX,
    MAX_STRING_LEN,
    ClarityTypeError,
    ClarityTypeError::BadNameValue
);
guarded_string!(
    ContractName,
    "ContractName",
    CONTRACT_NAME_REGEX,
    MAX_STRING_LEN,
    ClarityTypeError,
    ClarityTypeError::BadNameValue
);

impl StacksMessageCodec for ClarityName {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        // ClarityName can't be longer than MAX_STRING_LEN, which itself fits into a u8,
        // so we should be good here.
        if self.as_bytes().len() > MAX_STRING_LEN as usize {
            return Err(codec_error::SerializeError(
                "Failed to serialize clarity name: too long".to_string(),
            ));
        }
        write_next(fd, &(self.as_bytes().len() as u8))?;
        fd.write_all(self.as_bytes())
            .map_err(codec_error::WriteError)?;
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<ClarityName, codec_error> {
        let len_byte: u8 = read_next(fd)?;
        if len_byte > MAX_STRING_LEN {
            return Err(codec_error::DeserializeError(
                "Failed to deserialize clarity name: too long".to_string(),
            ));
        }
        let mut bytes = vec![0u8; len_byte as usize];
        fd.read_exact(&mut bytes).map_err(codec_error::ReadError)?;

        // must encode a valid string
        let s = String::from_utf8(bytes).map_err(|_e| {
            codec_error::DeserializeError(
                "Failed to parse Clarity name: could not construct from utf8".to_string(),
            )
        })?;

        // must decode to a clarity name
        let name = ClarityName::try_from(s).map_err(|e| {
            codec_error::DeserializeError(format!("Failed to parse Clarity name: {e:?}"))
        })?;
        Ok(name)
    }
}

impl StacksMessageCodec for ContractName {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        if self.as_bytes().len() < CONTRACT_MIN_NAME_LENGTH
            || self.as_bytes().len() > MAX_STRING_LEN as usize
        {
            return Err(codec_error::SerializeError(format!(
                "Failed to serialize contract name: too short or too long: {}",
                self.as_bytes().len()
            )));
        }
        write_next(fd, &(self.as_bytes().len() as u8))?;
        fd.write_all(self.as_bytes())
            .map_err(codec_error::WriteError)?;
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<ContractName, codec_error> {
        let len_byte: u8 = read_next(fd)?;
        if (len_byte as usize) < CONTRACT_MIN_NAME_LENGTH || len_byte > MAX_STRING_LEN {
            return Err(codec_error::DeserializeError(format!(
                "Failed to deserialize contract name: too short or too long: {len_byte}",
            )));
        }
        let mut bytes = vec![0u8; len_byte as usize];
        fd.read_exact(&mut bytes).map_err(codec_error::ReadError)?;

        // must encode a valid string
        let s = String::from_utf8(bytes).map_err(|_e| {
            codec_error::DeserializeError(
                "Failed to parse Contract name: could not construct from utf8".to_string(),
            )
        })?;

        let name = ContractName::try_from(s).map_err(|e| {
            codec_error::DeserializeError(format!("Failed to parse Contract name: {e:?}"))
        })?;
        Ok(name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TupleData {
    pub data_map: BTreeMap<ClarityName, Value>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffData {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    pub data: Vec<Value>,
}

#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct StandardPrincipalData(u8, pub [u8; 20]);

impl StandardPrincipalData {
    pub fn new(version: u8, bytes: [u8; 20]) -> Result<Self, ClarityTypeError> {
        if version >= 32 {
            return Err(ClarityTypeError::InvalidPrincipalVersion(version));
        }
        Ok(Self(version, bytes))
    }

    /// `version` must NEVER be greater than 31.
    #[cfg(test)]
    pub fn new_unsafe(version: u8, bytes: [u8; 20]) -> Self {
        Self(version, bytes)
    }

    pub fn null_principal() -> Self {
        Self(0, [0; 20])
    }

    pub fn transient() -> StandardPrincipalData {
        Self(
            1,
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        )
    }

    pub fn version(&self) -> u8 {
        self.0
    }

    pub fn destruct(self) -> (u8, [u8; 20]) {
        let Self(version, bytes) = self;
        (version, bytes)
    }
}

impl fmt::Display for StandardPrincipalData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02x}.{}", self.0, hash::to_hex(&self.1))
    }
}

impl fmt::Debug for StandardPrincipalData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StandardPrincipalData({self})")
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct QualifiedContractIdentifier {
    pub issuer: StandardPrincipalData,
    pub name: ContractName,
}

impl QualifiedContractIdentifier {
    pub fn new(issuer: StandardPrincipalData, name: ContractName) -> QualifiedContractIdentifier {
        Self { issuer, name }
    }

    pub fn local(name: &str) -> Result<QualifiedContractIdentifier, ClarityTypeError> {
        let name = name.to_string().try_into()?;
        Ok(Self::new(StandardPrincipalData::transient(), name))
    }

    /// Was this contract issued by the null issuer address? (i.e., is it a "boot contract")
    pub fn is_boot(&self) -> bool {
        self.issuer.1 == [0; 20]
    }
}

impl fmt::Display for QualifiedContractIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.issuer, self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PrincipalData {
    Standard(StandardPrincipalData),
    Contract(QualifiedContractIdentifier),
}

impl PrincipalData {
    pub fn version(&self) -> u8 {
        match self {
            PrincipalData::Standard(p) => p.version(),
            PrincipalData::Contract(QualifiedContractIdentifier { issuer, name: _ }) => {
                issuer.version()
            }
        }
    }
}

impl fmt::Display for PrincipalData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrincipalData::Standard(sender) => write!(f, "{sender}"),
            PrincipalData::Contract(contract_identifier) => write!(
                f,
                "{}.{}",
                contract_identifier.issuer, contract_identifier.name
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalData {
    pub data: Option<Box<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    pub committed: bool,
    pub data: Box<Value>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i128),
    UInt(u128),
    Bool(bool),
    Sequence(SequenceData),
    Principal(PrincipalData),
    Tuple(TupleData),
    Optional(OptionalData),
    Response(ResponseData),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SequenceData {
    Buffer(BuffData),
    List(ListData),
    String(CharType),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum CharType {
    UTF8(UTF8Data),
    ASCII(ASCIIData),
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ASCIIData {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UTF8Data {
    pub data: Vec<Vec<u8>>,
}

impl fmt::Display for CharType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CharType::ASCII(string) => write!(f, "{string}"),
            CharType::UTF8(string) => write!(f, "{string}"),
        }
    }
}

impl fmt::Display for ASCIIData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", String::from_utf8_lossy(&self.data))
    }
}

impl fmt::Debug for ASCIIData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for UTF8Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for c in self.data.iter() {
            if c.len() > 1 {
                // We escape extended charset
                result.push_str(&format!("\\u{{{}}}", hash::to_hex(&c[..])));
            } else {
                result.push(c[0] as char)
            }
        }
        write!(f, "u\"{result}\"")
    }
}

pub const NONE: Value = Value::Optional(OptionalData { data: None });

impl Value {
    pub fn some(data: Value) -> Result<Value, ClarityTypeError> {
        if data.serialized_size()?.saturating_add(1) > MAX_VALUE_SIZE {
            Err(ClarityTypeError::ValueTooLarge)
        } else if data.depth().saturating_add(1) > MAX_TYPE_DEPTH {
            Err(ClarityTypeError::TypeSignatureTooDeep)
        } else {
            Ok(Value::Optional(OptionalData {
                data: Some(Box::new(data)),
            }))
        }
    }

    pub fn none() -> Value {
        NONE.clone()
    }

    pub fn okay_true() -> Value {
        Value::Response(ResponseData {
            committed: true,
            data: Box::new(Value::Bool(true)),
        })
    }

    pub fn err_uint(ecode: u128) -> Value {
        Value::Response(ResponseData {
            committed: false,
            data: Box::new(Value::UInt(ecode)),
        })
    }

    pub fn err_none() -> Value {
        Value::Response(ResponseData {
            committed: false,
            data: Box::new(NONE.clone()),
        })
    }

    pub fn okay(data: Value) -> Result<Value, ClarityTypeError> {
        if data.serialized_size()?.saturating_add(1) > MAX_VALUE_SIZE {
            Err(ClarityTypeError::ValueTooLarge)
        } else if data.depth().saturating_add(1) > MAX_TYPE_DEPTH {
            Err(ClarityTypeError::TypeSignatureTooDeep)
        } else {
            Ok(Value::Response(ResponseData {
                committed: true,
                data: Box::new(data),
            }))
        }
    }

    pub fn error(data: Value) -> Result<Value, ClarityTypeError> {
        if data.serialized_size()?.saturating_add(1) > MAX_VALUE_SIZE {
            Err(ClarityTypeError::ValueTooLarge)
        } else if data.depth().saturating_add(1) > MAX_TYPE_DEPTH {
            Err(ClarityTypeError::TypeSignatureTooDeep)
        } else {
            Ok(Value::Response(ResponseData {
                committed: false,
                data: Box::new(data),
            }))
        }
    }

    /// Nesting depth of this value.  Compound values add one level for each
    /// wrapper; atoms are depth 1.
    pub fn depth(&self) -> u8 {
        let child_depth = match self {
            Value::Optional(OptionalData { data: Some(inner) }) => inner.depth(),
            Value::Response(ResponseData { data, .. }) => data.depth(),
            Value::Tuple(tuple_data) => tuple_data
                .data_map
                .values()
                .map(|v| v.depth())
                .max()
                .unwrap_or(0),
            Value::Sequence(SequenceData::List(list_data)) => list_data
                .data
                .iter()
                .map(|v| v.depth())
                .max()
                .unwrap_or(0),
            _ => return 1,
        };
        child_depth.saturating_add(1)
    }

    pub fn list_from(list_data: Vec<Value>) -> Result<Value, ClarityTypeError> {
        let value = Value::Sequence(SequenceData::List(ListData { data: list_data }));
        if value.serialized_size()? > MAX_VALUE_SIZE {
            return Err(ClarityTypeError::ValueTooLarge);
        }
        if value.depth() > MAX_TYPE_DEPTH {
            return Err(ClarityTypeError::TypeSignatureTooDeep);
        }
        Ok(value)
    }

    pub fn buff_from(buff_data: Vec<u8>) -> Result<Value, ClarityTypeError> {
        // check the buffer size
        if buff_data.len() > MAX_VALUE_SIZE as usize {
            return Err(ClarityTypeError::ValueTooLarge);
        }
        // construct the buffer
        Ok(Value::Sequence(SequenceData::Buffer(BuffData {
            data: buff_data,
        })))
    }

    pub fn buff_from_byte(byte: u8) -> Value {
        Value::Sequence(SequenceData::Buffer(BuffData { data: vec![byte] }))
    }

    pub fn string_ascii_from_bytes(bytes: Vec<u8>) -> Result<Value, ClarityTypeError> {
        // check the string size
        if bytes.len() > MAX_VALUE_SIZE as usize {
            return Err(ClarityTypeError::ValueTooLarge);
        }

        for b in bytes.iter() {
            if !b.is_ascii_alphanumeric() && !b.is_ascii_punctuation() && !b.is_ascii_whitespace() {
                return Err(ClarityTypeError::InvalidAsciiCharacter(*b));
            }
        }
        // construct the string
        Ok(Value::Sequence(SequenceData::String(CharType::ASCII(
            ASCIIData { data: bytes },
        ))))
    }

    pub fn string_utf8_from_bytes(bytes: Vec<u8>) -> Result<Value, ClarityTypeError> {
        let validated_utf8_str =
            str::from_utf8(&bytes).map_err(|_| ClarityTypeError::InvalidUtf8Encoding)?;
        let data = validated_utf8_str
            .chars()
            .map(|char| {
                let mut encoded_char = vec![0u8; char.len_utf8()];
                char.encode_utf8(&mut encoded_char);
                encoded_char
            })
            .collect::<Vec<_>>();
        // check the string size
        if data.len() > MAX_UTF8_VALUE_SIZE as usize {
            return Err(ClarityTypeError::ValueTooLarge);
        }

        Ok(Value::Sequence(SequenceData::String(CharType::UTF8(
            UTF8Data { data },
        ))))
    }

    pub fn expect_u128(self) -> Result<u128, ClarityTypeError> {
        if let Value::UInt(inner) = self {
            Ok(inner)
        } else {
            Err(ClarityTypeError::ValueTooLarge)
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{int}"),
            Value::UInt(int) => write!(f, "u{int}"),
            Value::Bool(boolean) => write!(f, "{boolean}"),
            Value::Tuple(data) => write!(f, "{data}"),
            Value::Principal(principal_data) => write!(f, "{principal_data}"),
            Value::Optional(opt_data) => write!(f, "{opt_data}"),
            Value::Response(res_data) => write!(f, "{res_data}"),
            Value::Sequence(SequenceData::Buffer(vec_bytes)) => write!(f, "0x{vec_bytes}"),
            Value::Sequence(SequenceData::String(string)) => write!(f, "{string}"),
            Value::Sequence(SequenceData::List(list_data)) => {
                write!(f, "(")?;
                for (ix, v) in list_data.data.iter().enumerate() {
                    if ix > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for OptionalData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.data {
            Some(ref x) => write!(f, "(some {x})"),
            None => write!(f, "none"),
        }
    }
}

impl fmt::Display for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.committed {
            true => write!(f, "(ok {})", self.data),
            false => write!(f, "(err {})", self.data),
        }
    }
}

impl fmt::Display for BuffData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hash::to_hex(&self.data))
    }
}

impl fmt::Debug for BuffData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<StacksAddress> for StandardPrincipalData {
    fn from(addr: StacksAddress) -> Self {
        StandardPrincipalData(addr.version, addr.bytes.0)
    }
}

impl From<StacksAddress> for PrincipalData {
    fn from(addr: StacksAddress) -> Self {
        PrincipalData::from(StandardPrincipalData::from(addr))
    }
}

impl From<StandardPrincipalData> for StacksAddress {
    fn from(o: StandardPrincipalData) -> StacksAddress {
        StacksAddress::new(o.version(), hash::Hash160(o.1))
    }
}

impl From<StandardPrincipalData> for Value {
    fn from(principal: StandardPrincipalData) -> Self {
        Value::Principal(PrincipalData::from(principal))
    }
}

impl From<QualifiedContractIdentifier> for Value {
    fn from(principal: QualifiedContractIdentifier) -> Self {
        Value::Principal(PrincipalData::Contract(principal))
    }
}

impl From<PrincipalData> for Value {
    fn from(p: PrincipalData) -> Self {
        Value::Principal(p)
    }
}

impl From<StandardPrincipalData> for PrincipalData {
    fn from(p: StandardPrincipalData) -> Self {
        PrincipalData::Standard(p)
    }
}

impl From<QualifiedContractIdentifier> for PrincipalData {
    fn from(principal: QualifiedContractIdentifier) -> Self {
        PrincipalData::Contract(principal)
    }
}

impl From<TupleData> for Value {
    fn from(t: TupleData) -> Self {
        Value::Tuple(t)
    }
}

impl From<ASCIIData> for Value {
    fn from(ascii: ASCIIData) -> Self {
        Value::Sequence(SequenceData::String(CharType::ASCII(ascii)))
    }
}

impl TupleData {
    fn new(data_map: BTreeMap<ClarityName, Value>) -> TupleData {
        TupleData { data_map }
    }

    /// Return the number of fields in this tuple value
    pub fn len(&self) -> u64 {
        self.data_map.len() as u64
    }

    /// Checks whether the tuple value is empty
    pub fn is_empty(&self) -> bool {
        self.data_map.is_empty()
    }

    pub fn from_data(data: Vec<(ClarityName, Value)>) -> Result<TupleData, ClarityTypeError> {
        let mut data_map = BTreeMap::new();
        for (name, value) in data.into_iter() {
            match data_map.entry(name) {
                Entry::Vacant(e) => e.insert(value),
                Entry::Occupied(e) => {
                    return Err(ClarityTypeError::DuplicateTupleField(e.key().to_string()));
                }
            };
        }
        Ok(Self::new(data_map))
    }

    pub fn get(&self, name: &str) -> Result<&Value, ClarityTypeError> {
        self.data_map
            .get(name)
            .ok_or_else(|| ClarityTypeError::NoSuchTupleField(name.to_string()))
    }

    pub fn get_owned(mut self, name: &str) -> Result<Value, ClarityTypeError> {
        self.data_map
            .remove(name)
            .ok_or_else(|| ClarityTypeError::NoSuchTupleField(name.to_string()))
    }
}

impl fmt::Display for TupleData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(tuple")?;
        for (name, value) in self.data_map.iter() {
            write!(f, " ")?;
            write!(f, "({} {value})", &**name)?;
        }
        write!(f, ")")
    }
}
