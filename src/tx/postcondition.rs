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

use crate::address::StacksAddress;
use crate::clarity::{ContractName, Value};
use crate::codec::{read_next, write_next, Error as codec_error, StacksMessageCodec};
use crate::tx::{
    AssetInfo, AssetInfoID, FungibleConditionCode, NonfungibleConditionCode,
    PostConditionPrincipal, PostConditionPrincipalID, TransactionPostCondition,
};

impl StacksMessageCodec for AssetInfo {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.contract_address)?;
        write_next(fd, &self.contract_name)?;
        write_next(fd, &self.asset_name)?;
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<AssetInfo, codec_error> {
        let contract_address: StacksAddress = read_next(fd)?;
        let contract_name: ContractName = read_next(fd)?;
        let asset_name: crate::clarity::ClarityName = read_next(fd)?;
        Ok(AssetInfo {
            contract_address,
            contract_name,
            asset_name,
        })
    }
}

impl StacksMessageCodec for PostConditionPrincipal {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        match *self {
            PostConditionPrincipal::Origin => {
                write_next(fd, &(PostConditionPrincipalID::Origin as u8))?;
            }
            PostConditionPrincipal::Standard(ref address) => {
                write_next(fd, &(PostConditionPrincipalID::Standard as u8))?;
                write_next(fd, address)?;
            }
            PostConditionPrincipal::Contract(ref address, ref contract_name) => {
                write_next(fd, &(PostConditionPrincipalID::Contract as u8))?;
                write_next(fd, address)?;
                write_next(fd, contract_name)?;
            }
        }
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<PostConditionPrincipal, codec_error> {
        let principal_id: u8 = read_next(fd)?;
        let principal = match principal_id {
            x if x == PostConditionPrincipalID::Origin as u8 => PostConditionPrincipal::Origin,
            x if x == PostConditionPrincipalID::Standard as u8 => {
                let addr: StacksAddress = read_next(fd)?;
                PostConditionPrincipal::Standard(addr)
            }
            x if x == PostConditionPrincipalID::Contract as u8 => {
                let addr: StacksAddress = read_next(fd)?;
                let contract_name: ContractName = read_next(fd)?;
                PostConditionPrincipal::Contract(addr, contract_name)
            }
            _ => {
                return Err(codec_error::DeserializeError(format!(
                    "Failed to parse transaction: unknown post condition principal ID {principal_id}"
                )));
            }
        };
        Ok(principal)
    }
}

impl StacksMessageCodec for TransactionPostCondition {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        match *self {
            TransactionPostCondition::STX(ref principal, ref fungible_condition, ref amount) => {
                write_next(fd, &(AssetInfoID::STX as u8))?;
                write_next(fd, principal)?;
                write_next(fd, &(*fungible_condition as u8))?;
                write_next(fd, amount)?;
            }
            TransactionPostCondition::Fungible(
                ref principal,
                ref asset_info,
                ref fungible_condition,
                ref amount,
            ) => {
                write_next(fd, &(AssetInfoID::FungibleAsset as u8))?;
                write_next(fd, principal)?;
                write_next(fd, asset_info)?;
                write_next(fd, &(*fungible_condition as u8))?;
                write_next(fd, amount)?;
            }
            TransactionPostCondition::Nonfungible(
                ref principal,
                ref asset_info,
                ref asset_value,
                ref nonfungible_condition,
            ) => {
                write_next(fd, &(AssetInfoID::NonfungibleAsset as u8))?;
                write_next(fd, principal)?;
                write_next(fd, asset_info)?;
                write_next(fd, asset_value)?;
                write_next(fd, &(*nonfungible_condition as u8))?;
            }
        };
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<TransactionPostCondition, codec_error> {
        let asset_info_id: u8 = read_next(fd)?;
        let postcond = match asset_info_id {
            x if x == AssetInfoID::STX as u8 => {
                let principal: PostConditionPrincipal = read_next(fd)?;
                let condition_u8: u8 = read_next(fd)?;
                let amount: u64 = read_next(fd)?;

                let condition_code = FungibleConditionCode::from_u8(condition_u8).ok_or(
                    codec_error::DeserializeError(format!(
                        "Failed to parse transaction: Failed to parse STX fungible condition code {condition_u8}"
                    )),
                )?;

                TransactionPostCondition::STX(principal, condition_code, amount)
            }
            x if x == AssetInfoID::FungibleAsset as u8 => {
                let principal: PostConditionPrincipal = read_next(fd)?;
                let asset: AssetInfo = read_next(fd)?;
                let condition_u8: u8 = read_next(fd)?;
                let amount: u64 = read_next(fd)?;

                let condition_code = FungibleConditionCode::from_u8(condition_u8).ok_or(
                    codec_error::DeserializeError(format!(
                        "Failed to parse transaction: Failed to parse FungibleAsset condition code {condition_u8}"
                    )),
                )?;

                TransactionPostCondition::Fungible(principal, asset, condition_code, amount)
            }
            x if x == AssetInfoID::NonfungibleAsset as u8 => {
                let principal: PostConditionPrincipal = read_next(fd)?;
                let asset: AssetInfo = read_next(fd)?;
                let asset_value: Value = read_next(fd)?;
                let condition_u8: u8 = read_next(fd)?;

                let condition_code = NonfungibleConditionCode::from_u8(condition_u8).ok_or(
                    codec_error::DeserializeError(format!(
                        "Failed to parse transaction: Failed to parse NonfungibleAsset condition code {condition_u8}"
                    )),
                )?;

                TransactionPostCondition::Nonfungible(principal, asset, asset_value, condition_code)
            }
            _ => {
                return Err(codec_error::DeserializeError(format!(
                    "Failed to parse transaction: unknown asset info ID {asset_info_id}"
                )));
            }
        };

        Ok(postcond)
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod test {
    use super::*;
    use crate::clarity::ClarityName;
    use crate::codec::test::check_codec_and_corruption;
    use crate::util::hash::Hash160;

    #[test]
    fn tx_stacks_postcondition_principal() {
        let origin = PostConditionPrincipal::Origin;
        let origin_bytes = vec![PostConditionPrincipalID::Origin as u8];

        let standard = PostConditionPrincipal::Standard(StacksAddress {
            version: 1,
            bytes: Hash160([1u8; 20]),
        });
        let standard_bytes = vec![
            // principal type ID
            PostConditionPrincipalID::Standard as u8,
            // address
            0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        ];

        let contract = PostConditionPrincipal::Contract(
            StacksAddress {
                version: 2,
                bytes: Hash160([2u8; 20]),
            },
            ContractName::try_from("hello-world").unwrap(),
        );
        let mut contract_bytes = vec![
            // principal type ID
            PostConditionPrincipalID::Contract as u8,
            // address
            0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02,
        ];
        ContractName::try_from("hello-world")
            .unwrap()
            .consensus_serialize(&mut contract_bytes)
            .unwrap();

        check_codec_and_corruption::<PostConditionPrincipal>(&origin, &origin_bytes);
        check_codec_and_corruption::<PostConditionPrincipal>(&standard, &standard_bytes);
        check_codec_and_corruption::<PostConditionPrincipal>(&contract, &contract_bytes);
    }

    #[test]
    fn tx_stacks_asset() {
        let addr = StacksAddress {
            version: 1,
            bytes: Hash160([0xff; 20]),
        };
        let asset_name = ClarityName::try_from("hello-asset").unwrap();
        let mut asset_name_bytes = vec![
            // length
            asset_name.len(),
        ];
        asset_name_bytes.extend_from_slice(asset_name.as_str().as_bytes());

        let contract_name = ContractName::try_from("hello-world").unwrap();
        let mut contract_name_bytes = vec![contract_name.len()];
        contract_name_bytes.extend_from_slice(contract_name.as_str().as_bytes());

        let asset_info = AssetInfo {
            contract_address: addr.clone(),
            contract_name: contract_name.clone(),
            asset_name: asset_name.clone(),
        };

        let mut asset_info_bytes = vec![
            // address
            0x01, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        ];
        asset_info_bytes.extend_from_slice(&contract_name_bytes);
        asset_info_bytes.extend_from_slice(&asset_name_bytes);

        check_codec_and_corruption::<AssetInfo>(&asset_info, &asset_info_bytes);
    }

    #[test]
    fn tx_stacks_postcondition() {
        let tx_post_condition_principals = vec![
            PostConditionPrincipal::Origin,
            PostConditionPrincipal::Standard(StacksAddress {
                version: 1,
                bytes: Hash160([1u8; 20]),
            }),
            PostConditionPrincipal::Contract(
                StacksAddress {
                    version: 2,
                    bytes: Hash160([2u8; 20]),
                },
                ContractName::try_from("hello-world").unwrap(),
            ),
        ];

        for tx_pcp in tx_post_condition_principals {
            let addr = StacksAddress {
                version: 1,
                bytes: Hash160([0xff; 20]),
            };
            let asset_name = ClarityName::try_from("hello-asset").unwrap();
            let contract_name = ContractName::try_from("contract-name").unwrap();

            let stx_pc =
                TransactionPostCondition::STX(tx_pcp.clone(), FungibleConditionCode::SentGt, 12345);
            let fungible_pc = TransactionPostCondition::Fungible(
                tx_pcp.clone(),
                AssetInfo {
                    contract_address: addr.clone(),
                    contract_name: contract_name.clone(),
                    asset_name: asset_name.clone(),
                },
                FungibleConditionCode::SentGt,
                23456,
            );
            let nonfungible_pc = TransactionPostCondition::Nonfungible(
                tx_pcp.clone(),
                AssetInfo {
                    contract_address: addr.clone(),
                    contract_name: contract_name.clone(),
                    asset_name: asset_name.clone(),
                },
                Value::buff_from(vec![0, 1, 2, 3]).unwrap(),
                NonfungibleConditionCode::NotSent,
            );

            let mut stx_pc_bytes = vec![AssetInfoID::STX as u8];
            tx_pcp.consensus_serialize(&mut stx_pc_bytes).unwrap();
            stx_pc_bytes.push(FungibleConditionCode::SentGt as u8);
            stx_pc_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x39]);

            let mut fungible_pc_bytes = vec![AssetInfoID::FungibleAsset as u8];
            tx_pcp.consensus_serialize(&mut fungible_pc_bytes).unwrap();
            AssetInfo {
                contract_address: addr.clone(),
                contract_name: contract_name.clone(),
                asset_name: asset_name.clone(),
            }
            .consensus_serialize(&mut fungible_pc_bytes)
            .unwrap();
            fungible_pc_bytes.push(FungibleConditionCode::SentGt as u8);
            fungible_pc_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x5b, 0xa0]);

            let mut nonfungible_pc_bytes = vec![AssetInfoID::NonfungibleAsset as u8];
            tx_pcp
                .consensus_serialize(&mut nonfungible_pc_bytes)
                .unwrap();
            AssetInfo {
                contract_address: addr.clone(),
                contract_name: contract_name.clone(),
                asset_name: asset_name.clone(),
            }
            .consensus_serialize(&mut nonfungible_pc_bytes)
            .unwrap();
            Value::buff_from(vec![0, 1, 2, 3])
                .unwrap()
                .consensus_serialize(&mut nonfungible_pc_bytes)
                .unwrap();
            nonfungible_pc_bytes.push(NonfungibleConditionCode::NotSent as u8);

            check_codec_and_corruption::<TransactionPostCondition>(&stx_pc, &stx_pc_bytes);
            check_codec_and_corruption::<TransactionPostCondition>(
                &fungible_pc,
                &fungible_pc_bytes,
            );
            check_codec_and_corruption::<TransactionPostCondition>(
                &nonfungible_pc,
                &nonfungible_pc_bytes,
            );
        }
    }

    #[test]
    fn tx_stacks_postcondition_invalid() {
        let addr = StacksAddress {
            version: 1,
            bytes: Hash160([0xff; 20]),
        };

        // can't parse a postcondition with an invalid condition code
        let stx_pc = TransactionPostCondition::STX(
            PostConditionPrincipal::Origin,
            FungibleConditionCode::SentGt,
            12345,
        );
        let mut stx_pc_bytes_bad_condition = stx_pc.serialize_to_vec();
        // overwrite the condition code byte
        let cc_index = stx_pc_bytes_bad_condition.len() - 9;
        stx_pc_bytes_bad_condition[cc_index] = NonfungibleConditionCode::NotSent as u8;

        assert!(TransactionPostCondition::consensus_deserialize(
            &mut &stx_pc_bytes_bad_condition[..]
        )
        .is_err());

        // unknown asset info ID
        let mut bad_asset_id_bytes = stx_pc.serialize_to_vec();
        bad_asset_id_bytes[0] = 0xff;
        assert!(
            TransactionPostCondition::consensus_deserialize(&mut &bad_asset_id_bytes[..]).is_err()
        );

        // unknown principal type ID
        let standard = PostConditionPrincipal::Standard(addr);
        let mut bad_principal_bytes = standard.serialize_to_vec();
        bad_principal_bytes[0] = 0xff;
        assert!(
            PostConditionPrincipal::consensus_deserialize(&mut &bad_principal_bytes[..]).is_err()
        );
    }
}
