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

use crate::clarity::{PrincipalData, Value};
use crate::codec::{read_next, write_next, Error as codec_error, StacksMessageCodec};
use crate::tx::{
    ClarityVersion, CoinbasePayload, TokenTransferMemo, TransactionContractCall,
    TransactionPayload, TransactionPayloadID, TransactionSmartContract,
};

impl StacksMessageCodec for TransactionContractCall {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.address)?;
        write_next(fd, &self.contract_name)?;
        write_next(fd, &self.function_name)?;
        write_next(fd, &self.function_args)?;
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<TransactionContractCall, codec_error> {
        let address = read_next(fd)?;
        let contract_name = read_next(fd)?;
        let function_name = read_next(fd)?;
        let function_args = read_next(fd)?;

        Ok(TransactionContractCall {
            address,
            contract_name,
            function_name,
            function_args,
        })
    }
}

impl StacksMessageCodec for TransactionSmartContract {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.name)?;
        write_next(fd, &self.code_body)?;
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<TransactionSmartContract, codec_error> {
        let name = read_next(fd)?;
        let code_body = read_next(fd)?;
        Ok(TransactionSmartContract { name, code_body })
    }
}

impl StacksMessageCodec for TransactionPayload {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        match *self {
            TransactionPayload::TokenTransfer(ref address, ref amount, ref memo) => {
                write_next(fd, &(TransactionPayloadID::TokenTransfer as u8))?;
                write_next(fd, address)?;
                write_next(fd, amount)?;
                write_next(fd, memo)?;
            }
            TransactionPayload::ContractCall(ref cc) => {
                write_next(fd, &(TransactionPayloadID::ContractCall as u8))?;
                cc.consensus_serialize(fd)?;
            }
            TransactionPayload::SmartContract(ref sc, ref version_opt) => {
                if let Some(version) = version_opt {
                    // caller requests a specific Clarity version
                    write_next(fd, &(TransactionPayloadID::VersionedSmartContract as u8))?;
                    write_next(fd, &(*version as u8))?;
                    sc.consensus_serialize(fd)?;
                } else {
                    // caller requests to use whatever the current clarity version is
                    write_next(fd, &(TransactionPayloadID::SmartContract as u8))?;
                    sc.consensus_serialize(fd)?;
                }
            }
            TransactionPayload::Coinbase(ref buf, ref recipient_opt) => {
                match recipient_opt {
                    None => {
                        write_next(fd, &(TransactionPayloadID::Coinbase as u8))?;
                        write_next(fd, buf)?;
                    }
                    Some(recipient) => {
                        write_next(fd, &(TransactionPayloadID::CoinbaseToAltRecipient as u8))?;
                        write_next(fd, buf)?;
                        write_next(fd, recipient)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<TransactionPayload, codec_error> {
        let type_id_u8 = read_next(fd)?;
        let type_id = TransactionPayloadID::from_u8(type_id_u8).ok_or_else(|| {
            codec_error::DeserializeError(format!(
                "Failed to parse transaction: unknown payload type ID {type_id_u8}"
            ))
        })?;
        let payload = match type_id {
            TransactionPayloadID::TokenTransfer => {
                let principal = read_next(fd)?;
                let amount = read_next(fd)?;
                let memo = read_next(fd)?;
                TransactionPayload::TokenTransfer(principal, amount, memo)
            }
            TransactionPayloadID::ContractCall => {
                let payload: TransactionContractCall = read_next(fd)?;
                TransactionPayload::ContractCall(payload)
            }
            TransactionPayloadID::SmartContract => {
                let payload: TransactionSmartContract = read_next(fd)?;
                TransactionPayload::SmartContract(payload, None)
            }
            TransactionPayloadID::VersionedSmartContract => {
                let version_u8: u8 = read_next(fd)?;
                let version = ClarityVersion::from_u8(version_u8).ok_or_else(|| {
                    codec_error::DeserializeError(format!(
                        "Failed to parse smart contract payload: unknown clarity version {version_u8}"
                    ))
                })?;
                let payload: TransactionSmartContract = read_next(fd)?;
                TransactionPayload::SmartContract(payload, Some(version))
            }
            TransactionPayloadID::PoisonMicroblock => {
                return Err(codec_error::DeserializeError(
                    "Failed to parse transaction: unsupported payload type ID 3".to_string(),
                ));
            }
            TransactionPayloadID::Coinbase => {
                let payload: CoinbasePayload = read_next(fd)?;
                TransactionPayload::Coinbase(payload, None)
            }
            TransactionPayloadID::CoinbaseToAltRecipient => {
                let payload: CoinbasePayload = read_next(fd)?;
                let principal_value: PrincipalData = read_next(fd)?;
                TransactionPayload::Coinbase(payload, Some(principal_value))
            }
        };

        Ok(payload)
    }
}

impl TransactionPayload {
    pub fn new_contract_call(
        contract_address: crate::address::StacksAddress,
        contract_name: &str,
        function_name: &str,
        args: Vec<Value>,
    ) -> Option<TransactionPayload> {
        let contract_name_str = match crate::clarity::ContractName::try_from(contract_name.to_string())
        {
            Ok(s) => s,
            Err(_) => {
                test_debug!("Not a clarity name: '{}'", contract_name);
                return None;
            }
        };

        let function_name_str = match crate::clarity::ClarityName::try_from(function_name.to_string())
        {
            Ok(s) => s,
            Err(_) => {
                test_debug!("Not a clarity name: '{}'", function_name);
                return None;
            }
        };

        Some(TransactionPayload::ContractCall(TransactionContractCall {
            address: contract_address,
            contract_name: contract_name_str,
            function_name: function_name_str,
            function_args: args,
        }))
    }

    pub fn new_smart_contract(
        name: &str,
        contract: &str,
        version_opt: Option<ClarityVersion>,
    ) -> Option<TransactionPayload> {
        match (
            crate::clarity::ContractName::try_from(name.to_string()),
            crate::util::strings::StacksString::from_str(contract),
        ) {
            (Ok(s_name), Some(s_body)) => Some(TransactionPayload::SmartContract(
                TransactionSmartContract {
                    name: s_name,
                    code_body: s_body,
                },
                version_opt,
            )),
            (_, _) => None,
        }
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod test {
    use super::*;
    use crate::address::StacksAddress;
    use crate::clarity::{ClarityName, ContractName, PrincipalData, StandardPrincipalData};
    use crate::codec::test::check_codec_and_corruption;
    use crate::util::hash::Hash160;
    use crate::util::strings::StacksString;

    #[test]
    fn tx_stacks_transaction_payload_tokens() {
        let addr = PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());

        let tt_stx =
            TransactionPayload::TokenTransfer(addr.clone(), 123, TokenTransferMemo([0u8; 34]));

        // wire encodings of the same
        let mut tt_stx_bytes = vec![];
        tt_stx_bytes.push(TransactionPayloadID::TokenTransfer as u8);
        addr.consensus_serialize(&mut tt_stx_bytes).unwrap();
        tt_stx_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7b]);
        tt_stx_bytes.extend_from_slice(&[0u8; 34]);

        check_codec_and_corruption::<TransactionPayload>(&tt_stx, &tt_stx_bytes);

        let addr = PrincipalData::from(
            crate::clarity::QualifiedContractIdentifier {
                issuer: StandardPrincipalData::new(1, [0xff; 20]).unwrap(),
                name: "foo-contract".into(),
            },
        );

        let tt_stx =
            TransactionPayload::TokenTransfer(addr.clone(), 123, TokenTransferMemo([1u8; 34]));

        let mut tt_stx_bytes = vec![];
        tt_stx_bytes.push(TransactionPayloadID::TokenTransfer as u8);
        addr.consensus_serialize(&mut tt_stx_bytes).unwrap();
        tt_stx_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7b]);
        tt_stx_bytes.extend_from_slice(&[1u8; 34]);

        check_codec_and_corruption::<TransactionPayload>(&tt_stx, &tt_stx_bytes);
    }

    #[test]
    fn tx_stacks_transaction_payload_contract_call() {
        let hello_contract_call = "hello-contract-call";
        let hello_function_name = "hello-function-name";

        let contract_call = TransactionContractCall {
            address: StacksAddress {
                version: 1,
                bytes: Hash160([0xff; 20]),
            },
            contract_name: ContractName::try_from(hello_contract_call.to_string()).unwrap(),
            function_name: ClarityName::try_from(hello_function_name.to_string()).unwrap(),
            function_args: vec![Value::Int(0)],
        };

        let mut contract_call_bytes = vec![];
        contract_call
            .address
            .consensus_serialize(&mut contract_call_bytes)
            .unwrap();
        contract_call
            .contract_name
            .consensus_serialize(&mut contract_call_bytes)
            .unwrap();
        contract_call
            .function_name
            .consensus_serialize(&mut contract_call_bytes)
            .unwrap();
        contract_call
            .function_args
            .consensus_serialize(&mut contract_call_bytes)
            .unwrap();

        let payload_contract_call = TransactionPayload::ContractCall(contract_call.clone());
        let mut payload_contract_call_bytes = vec![TransactionPayloadID::ContractCall as u8];
        payload_contract_call_bytes.append(&mut contract_call_bytes.clone());

        check_codec_and_corruption::<TransactionContractCall>(
            &contract_call,
            &contract_call_bytes,
        );
        check_codec_and_corruption::<TransactionPayload>(
            &payload_contract_call,
            &payload_contract_call_bytes,
        );
    }

    #[test]
    fn tx_stacks_transaction_payload_smart_contract() {
        let hello_contract_name = "hello-contract-name";
        let hello_contract_body = "hello contract code body";

        let smart_contract = TransactionSmartContract {
            name: ContractName::try_from(hello_contract_name.to_string()).unwrap(),
            code_body: StacksString::from_str(hello_contract_body).unwrap(),
        };

        let mut smart_contract_bytes = vec![];
        smart_contract
            .name
            .consensus_serialize(&mut smart_contract_bytes)
            .unwrap();
        smart_contract
            .code_body
            .consensus_serialize(&mut smart_contract_bytes)
            .unwrap();

        let payload_smart_contract =
            TransactionPayload::SmartContract(smart_contract.clone(), None);
        let mut payload_smart_contract_bytes = vec![TransactionPayloadID::SmartContract as u8];
        payload_smart_contract_bytes.append(&mut smart_contract_bytes.clone());

        check_codec_and_corruption::<TransactionSmartContract>(
            &smart_contract,
            &smart_contract_bytes,
        );
        check_codec_and_corruption::<TransactionPayload>(
            &payload_smart_contract,
            &payload_smart_contract_bytes,
        );

        // versioned smart contract
        let versioned_smart_contract =
            TransactionPayload::SmartContract(smart_contract.clone(), Some(ClarityVersion::Clarity2));
        let mut versioned_smart_contract_bytes =
            vec![TransactionPayloadID::VersionedSmartContract as u8, ClarityVersion::Clarity2 as u8];
        smart_contract
            .name
            .consensus_serialize(&mut versioned_smart_contract_bytes)
            .unwrap();
        smart_contract
            .code_body
            .consensus_serialize(&mut versioned_smart_contract_bytes)
            .unwrap();

        check_codec_and_corruption::<TransactionPayload>(
            &versioned_smart_contract,
            &versioned_smart_contract_bytes,
        );
    }

    #[test]
    fn tx_stacks_transaction_payload_coinbase() {
        let coinbase_payload = TransactionPayload::Coinbase(CoinbasePayload([0x12; 32]), None);
        let coinbase_payload_bytes = vec![
            // payload type ID
            TransactionPayloadID::Coinbase as u8,
            // buffer
            0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12,
        ];

        check_codec_and_corruption::<TransactionPayload>(
            &coinbase_payload,
            &coinbase_payload_bytes,
        );

        // with an alt recipient
        let recipient = PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());
        let alt_coinbase =
            TransactionPayload::Coinbase(CoinbasePayload([0x12; 32]), Some(recipient.clone()));

        let mut alt_coinbase_bytes = vec![TransactionPayloadID::CoinbaseToAltRecipient as u8];
        alt_coinbase_bytes.extend_from_slice(&[0x12; 32]);
        recipient.consensus_serialize(&mut alt_coinbase_bytes).unwrap();

        check_codec_and_corruption::<TransactionPayload>(&alt_coinbase, &alt_coinbase_bytes);
    }

    #[test]
    fn tx_stacks_transaction_payload_invalid() {
        // poison microblock payloads are not supported
        let poison_bytes = vec![TransactionPayloadID::PoisonMicroblock as u8, 0x00, 0x00];
        assert!(TransactionPayload::consensus_deserialize(&mut &poison_bytes[..]).is_err());

        // wrong payload type ID
        let payload_bytes = vec![
            // payload type ID
            0xff,
            // buffer
            0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12, 0x12,
        ];
        assert!(TransactionPayload::consensus_deserialize(&mut &payload_bytes[..]).is_err());

        // versioned smart contract with a bad clarity version byte
        let bad_version_bytes = vec![TransactionPayloadID::VersionedSmartContract as u8, 0x7f];
        assert!(TransactionPayload::consensus_deserialize(&mut &bad_version_bytes[..]).is_err());
    }

    #[test]
    fn tx_token_transfer_memo_display() {
        let mut memo_bytes = [0u8; 34];
        memo_bytes[0..5].copy_from_slice(b"hello");
        let memo = TokenTransferMemo(memo_bytes);
        assert_eq!(format!("{memo}"), "hello");

        // the text rendering is lossy; the hex accessors carry all 34 bytes
        let parsed = TokenTransferMemo::from_hex(&memo.to_hex()).unwrap();
        assert_eq!(parsed, memo);
        assert!(TokenTransferMemo::from_bytes(&memo_bytes[0..33]).is_none());
    }

    #[test]
    fn tx_stacks_transaction_payload_args_roundtrip() {
        let payload = TransactionPayload::new_contract_call(
            StacksAddress {
                version: 1,
                bytes: Hash160([0xff; 20]),
            },
            "hello-world",
            "set-value",
            vec![Value::UInt(99), Value::Bool(true)],
        )
        .unwrap();

        let bytes = payload.serialize_to_vec();
        let parsed = TransactionPayload::consensus_deserialize(&mut &bytes[..]).unwrap();
        assert_eq!(parsed, payload);

        // invalid names are rejected up front
        assert!(TransactionPayload::new_contract_call(
            StacksAddress {
                version: 1,
                bytes: Hash160([0xff; 20]),
            },
            "hello world",
            "set-value",
            vec![],
        )
        .is_none());
    }
}
