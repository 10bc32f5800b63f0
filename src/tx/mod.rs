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

use std::{error, fmt};

use crate::address::AddressHashMode;
use crate::clarity::{ClarityName, ContractName, PrincipalData, Value};
use crate::codec::Error as codec_error;
use crate::util::hash::{Hash160, Sha512Trunc256Sum};
use crate::util::secp256k1::{MessageSignature, Secp256k1PrivateKey, Secp256k1PublicKey};
use crate::util::strings::StacksString;

pub mod auth;
pub mod payload;
pub mod postcondition;
pub mod signer;
pub mod transaction;

pub type StacksPublicKey = Secp256k1PublicKey;
pub type StacksPrivateKey = Secp256k1PrivateKey;

/// Transaction ID -- the SHA512/256 hash of the serialized transaction.
/// Doubles as the rolling signature hash during signing and verification.
pub struct Txid(pub [u8; 32]);
impl_array_newtype!(Txid, u8, 32);
impl_array_hexstring_fmt!(Txid);
impl_byte_array_newtype!(Txid, u8, 32);
impl_byte_array_serde!(Txid);
impl_byte_array_message_codec!(Txid, 32);

impl Txid {
    /// A txid is the SHA512/256 hash of a serialized transaction.
    pub fn from_stacks_tx(txdata: &[u8]) -> Txid {
        let h = Sha512Trunc256Sum::from_data(txdata);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(h.as_bytes());
        Txid(bytes)
    }

    /// A sighash is calculated the same way as a txid
    pub fn from_sighash_bytes(txdata: &[u8]) -> Txid {
        Txid::from_stacks_tx(txdata)
    }
}

#[derive(Debug)]
pub enum Error {
    /// Failed to encode or decode a wire structure
    CodecError(codec_error),
    /// Failed to produce a signature
    SigningError(String),
    /// Failed to authenticate a signature or signer hash
    VerifyingError(String),
    /// Operation is not supported by this kind of spending condition
    IncompatibleSpendingConditionError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CodecError(ref e) => fmt::Display::fmt(e, f),
            Error::SigningError(ref s) => write!(f, "Failed to sign: {s}"),
            Error::VerifyingError(ref s) => write!(f, "Failed to verify signature: {s}"),
            Error::IncompatibleSpendingConditionError => {
                write!(f, "Incompatible spending condition")
            }
        }
    }
}

impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        match self {
            Error::CodecError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<codec_error> for Error {
    fn from(e: codec_error) -> Error {
        Error::CodecError(e)
    }
}

pub const CHAIN_ID_MAINNET: u32 = 0x00000001;
pub const CHAIN_ID_TESTNET: u32 = 0x80000000;

define_u8_enum!(TransactionVersion {
    Mainnet = 0x00,
    Testnet = 0x80
});

define_u8_enum!(TransactionAnchorMode {
    OnChainOnly = 1,  // must be included in a StacksBlock
    OffChainOnly = 2, // must be included in a StacksMicroBlock
    Any = 3           // either
});

define_u8_enum!(TransactionAuthFlags {
    AuthStandard = 0x04,
    AuthSponsored = 0x05
});

/// Transaction signatures are validated by calculating the public key from the signature, and
/// verifying that all public keys hash to the signing account's hash.  To do so, we must preserve
/// enough information in the auth structure to recover each public key's bytes.
define_u8_enum!(TransactionPublicKeyEncoding {
    // ways we can encode a public key
    Compressed = 0x00,
    Uncompressed = 0x01
});

define_u8_enum!(TransactionAuthFieldID {
    // types of auth fields
    PublicKeyCompressed = 0x00,
    PublicKeyUncompressed = 0x01,
    SignatureCompressed = 0x02,
    SignatureUncompressed = 0x03
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionAuthField {
    PublicKey(StacksPublicKey),
    Signature(TransactionPublicKeyEncoding, MessageSignature),
}

impl TransactionAuthField {
    pub fn is_public_key(&self) -> bool {
        matches!(self, TransactionAuthField::PublicKey(_))
    }

    pub fn is_signature(&self) -> bool {
        matches!(self, TransactionAuthField::Signature(..))
    }

    pub fn as_public_key(&self) -> Option<StacksPublicKey> {
        match self {
            TransactionAuthField::PublicKey(ref pubk) => Some(pubk.clone()),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<(TransactionPublicKeyEncoding, MessageSignature)> {
        match self {
            TransactionAuthField::Signature(ref key_fmt, ref sig) => Some((*key_fmt, *sig)),
            _ => None,
        }
    }
}

define_u8_enum!(SinglesigHashMode {
    // hash modes for single-signature spending conditions
    P2PKH = 0x00,
    P2WPKH = 0x02
});

define_u8_enum!(MultisigHashMode {
    // hash modes for multi-signature spending conditions that chain
    // signatures sequentially
    P2SH = 0x01,
    P2WSH = 0x03
});

define_u8_enum!(OrderIndependentMultisigHashMode {
    // hash modes for multi-signature spending conditions whose signatures
    // may be given in any order
    P2SH = 0x05,
    P2WSH = 0x07
});

impl SinglesigHashMode {
    pub fn to_address_hash_mode(&self) -> AddressHashMode {
        match *self {
            SinglesigHashMode::P2PKH => AddressHashMode::SerializeP2PKH,
            SinglesigHashMode::P2WPKH => AddressHashMode::SerializeP2WPKH,
        }
    }
}

impl MultisigHashMode {
    pub fn to_address_hash_mode(&self) -> AddressHashMode {
        match *self {
            MultisigHashMode::P2SH => AddressHashMode::SerializeP2SH,
            MultisigHashMode::P2WSH => AddressHashMode::SerializeP2WSH,
        }
    }
}

impl OrderIndependentMultisigHashMode {
    pub fn to_address_hash_mode(&self) -> AddressHashMode {
        match *self {
            OrderIndependentMultisigHashMode::P2SH => AddressHashMode::SerializeP2SH,
            OrderIndependentMultisigHashMode::P2WSH => AddressHashMode::SerializeP2WSH,
        }
    }
}

/// A structure that encodes enough state to authenticate
/// a transaction's execution against a Stacks address.
/// public_keys + signatures_required determines the Principal.
/// nonce is the "check number" for the Principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSpendingCondition {
    pub hash_mode: MultisigHashMode,
    pub signer: Hash160,
    pub nonce: u64,  // nth authorization from this account
    pub tx_fee: u64, // microSTX/compute rate offered by this account
    pub fields: Vec<TransactionAuthField>,
    pub signatures_required: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglesigSpendingCondition {
    pub hash_mode: SinglesigHashMode,
    pub signer: Hash160,
    pub nonce: u64,  // nth authorization from this account
    pub tx_fee: u64, // microSTX/compute rate offered by this account
    pub key_encoding: TransactionPublicKeyEncoding,
    pub signature: MessageSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIndependentMultisigSpendingCondition {
    pub hash_mode: OrderIndependentMultisigHashMode,
    pub signer: Hash160,
    pub nonce: u64,  // nth authorization from this account
    pub tx_fee: u64, // microSTX/compute rate offered by this account
    pub fields: Vec<TransactionAuthField>,
    pub signatures_required: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionSpendingCondition {
    Singlesig(SinglesigSpendingCondition),
    Multisig(MultisigSpendingCondition),
    OrderIndependentMultisig(OrderIndependentMultisigSpendingCondition),
}

/// Types of transaction authorizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionAuth {
    Standard(TransactionSpendingCondition),
    Sponsored(TransactionSpendingCondition, TransactionSpendingCondition), // the second account pays on behalf of the first account
}

/// A transaction that instantiates a smart contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSmartContract {
    pub name: ContractName,
    pub code_body: StacksString,
}

/// A transaction that calls into a smart contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContractCall {
    pub address: crate::address::StacksAddress,
    pub contract_name: ContractName,
    pub function_name: ClarityName,
    pub function_args: Vec<Value>,
}

/// Cause of change in mining tenure
pub struct CoinbasePayload(pub [u8; 32]);
impl_byte_array_message_codec!(CoinbasePayload, 32);
impl_array_newtype!(CoinbasePayload, u8, 32);
impl_array_hexstring_fmt!(CoinbasePayload);
impl_byte_array_newtype!(CoinbasePayload, u8, 32);
impl_byte_array_serde!(CoinbasePayload);

pub struct TokenTransferMemo(pub [u8; 34]); // same length as it is in Stacks v1
impl_byte_array_message_codec!(TokenTransferMemo, 34);
impl_array_newtype!(TokenTransferMemo, u8, 34);
impl_array_hexstring_fmt!(TokenTransferMemo);
impl_byte_array_serde!(TokenTransferMemo);

// no impl_byte_array_newtype! here -- its hex Display would collide with the
// lossy text Display below, so the byte and hex accessors are written out
impl TokenTransferMemo {
    pub fn from_hex(hex_str: &str) -> Result<TokenTransferMemo, crate::util::HexError> {
        let bytes = crate::util::hash::hex_bytes(hex_str)?;
        TokenTransferMemo::from_bytes(&bytes)
            .ok_or(crate::util::HexError::BadLength(hex_str.len()))
    }

    pub fn from_bytes(inp: &[u8]) -> Option<TokenTransferMemo> {
        if inp.len() != 34 {
            return None;
        }
        let mut ret = [0u8; 34];
        ret.copy_from_slice(inp);
        Some(TokenTransferMemo(ret))
    }

    pub fn to_hex(&self) -> String {
        crate::util::hash::to_hex(&self.0)
    }
}

impl fmt::Display for TokenTransferMemo {
    /// Lossy rendering: bytes from the first NUL onward are dropped, so
    /// distinct memos can display identically.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nul_pos = self.0.iter().position(|b| *b == 0).unwrap_or(self.0.len());
        write!(f, "{}", String::from_utf8_lossy(&self.0[..nul_pos]))
    }
}

define_u8_enum!(ClarityVersion {
    Clarity1 = 1,
    Clarity2 = 2,
    Clarity3 = 3
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    TokenTransfer(PrincipalData, u64, TokenTransferMemo),
    ContractCall(TransactionContractCall),
    SmartContract(TransactionSmartContract, Option<ClarityVersion>),
    Coinbase(CoinbasePayload, Option<PrincipalData>),
}

define_u8_enum!(TransactionPayloadID {
    TokenTransfer = 0,
    SmartContract = 1,
    ContractCall = 2,
    // not constructible; transactions carrying it cannot be decoded
    PoisonMicroblock = 3,
    Coinbase = 4,
    CoinbaseToAltRecipient = 5,
    VersionedSmartContract = 6
});

/// Encoding of an asset type identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetInfo {
    pub contract_address: crate::address::StacksAddress,
    pub contract_name: ContractName,
    pub asset_name: ClarityName,
}

/// numeric wire-format ID of an asset info type variant
define_u8_enum!(AssetInfoID {
    STX = 0,
    FungibleAsset = 1,
    NonfungibleAsset = 2
});

define_u8_enum!(FungibleConditionCode {
    SentEq = 0x01,
    SentGt = 0x02,
    SentGe = 0x03,
    SentLt = 0x04,
    SentLe = 0x05
});

define_u8_enum!(NonfungibleConditionCode {
    Sent = 0x10,
    NotSent = 0x11
});

define_u8_enum!(PostConditionPrincipalID {
    Origin = 0x01,
    Standard = 0x02,
    Contract = 0x03
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostConditionPrincipal {
    Origin,
    Standard(crate::address::StacksAddress),
    Contract(crate::address::StacksAddress, ContractName),
}

/// Post-condition on a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPostCondition {
    STX(PostConditionPrincipal, FungibleConditionCode, u64),
    Fungible(
        PostConditionPrincipal,
        AssetInfo,
        FungibleConditionCode,
        u64,
    ),
    Nonfungible(
        PostConditionPrincipal,
        AssetInfo,
        Value,
        NonfungibleConditionCode,
    ),
}

/// Post-condition modes for unspecified assets
define_u8_enum!(TransactionPostConditionMode {
    Allow = 0x01, // allow any other changes not specified
    Deny = 0x02   // deny any other changes not specified
});

/// Stacks transaction versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StacksTransaction {
    pub version: TransactionVersion,
    pub chain_id: u32,
    pub auth: TransactionAuth,
    pub anchor_mode: TransactionAnchorMode,
    pub post_condition_mode: TransactionPostConditionMode,
    pub post_conditions: Vec<TransactionPostCondition>,
    pub payload: TransactionPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StacksTransactionSigner {
    pub tx: StacksTransaction,
    pub sighash: Txid,
    origin_done: bool,
    check_oversign: bool,
    check_overlap: bool,
}
