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

use crate::codec::{read_next, write_next, Error as codec_error, StacksMessageCodec};
use crate::tx::{
    Error, StacksPrivateKey, StacksPublicKey, StacksTransaction, TransactionAnchorMode,
    TransactionAuth, TransactionAuthFlags, TransactionPayload, TransactionPostCondition,
    TransactionPostConditionMode, TransactionPublicKeyEncoding, TransactionSpendingCondition,
    TransactionVersion, Txid,
};

impl StacksMessageCodec for StacksTransaction {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &(self.version as u8))?;
        write_next(fd, &self.chain_id)?;
        write_next(fd, &self.auth)?;
        write_next(fd, &(self.anchor_mode as u8))?;
        write_next(fd, &(self.post_condition_mode as u8))?;
        write_next(fd, &self.post_conditions)?;
        write_next(fd, &self.payload)?;
        Ok(())
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<StacksTransaction, codec_error> {
        StacksTransaction::consensus_deserialize_with_len(fd).map(|(result, _)| result)
    }
}

impl StacksTransaction {
    /// Create a new, unsigned transaction and an empty STX fee with no post-conditions.
    pub fn new(
        version: TransactionVersion,
        auth: TransactionAuth,
        payload: TransactionPayload,
    ) -> StacksTransaction {
        let anchor_mode = match payload {
            TransactionPayload::Coinbase(..) => TransactionAnchorMode::OnChainOnly,
            _ => TransactionAnchorMode::Any,
        };

        StacksTransaction {
            version,
            chain_id: 0,
            auth,
            anchor_mode,
            post_condition_mode: TransactionPostConditionMode::Deny,
            post_conditions: vec![],
            payload,
        }
    }

    /// Deserialize a transaction, returning the number of bytes read
    fn consensus_deserialize_with_len<R: Read>(
        fd: &mut R,
    ) -> Result<(StacksTransaction, u64), codec_error> {
        let mut bound_read = crate::util::retry::BoundReader::from_reader(
            fd,
            crate::codec::MAX_MESSAGE_LEN as u64,
        );
        let fd = &mut bound_read;

        let version_u8: u8 = read_next(fd)?;
        let chain_id: u32 = read_next(fd)?;
        let auth: TransactionAuth = read_next(fd)?;
        let anchor_mode_u8: u8 = read_next(fd)?;
        let post_condition_mode_u8: u8 = read_next(fd)?;
        let post_conditions: Vec<TransactionPostCondition> = read_next(fd)?;

        let payload: TransactionPayload = read_next(fd)?;

        let version = TransactionVersion::from_u8(version_u8).ok_or(
            codec_error::DeserializeError(format!(
                "Failed to parse transaction: unknown version {version_u8}"
            )),
        )?;

        let anchor_mode = match TransactionAnchorMode::from_u8(anchor_mode_u8) {
            Some(m) => m,
            None => {
                return Err(codec_error::DeserializeError(format!(
                    "Failed to parse transaction: invalid anchor mode {anchor_mode_u8}"
                )));
            }
        };

        // a coinbase can only be mined on-chain
        if let TransactionPayload::Coinbase(..) = payload {
            if anchor_mode != TransactionAnchorMode::OnChainOnly {
                return Err(codec_error::DeserializeError(format!(
                    "Failed to parse transaction: invalid anchor mode {anchor_mode_u8} for coinbase"
                )));
            }
        }

        let post_condition_mode = match TransactionPostConditionMode::from_u8(
            post_condition_mode_u8,
        ) {
            Some(m) => m,
            None => {
                return Err(codec_error::DeserializeError(format!(
                    "Failed to parse transaction: invalid post-condition mode {post_condition_mode_u8}"
                )));
            }
        };

        Ok((
            StacksTransaction {
                version,
                chain_id,
                auth,
                anchor_mode,
                post_condition_mode,
                post_conditions,
                payload,
            },
            fd.num_read(),
        ))
    }

    /// Get the serialized length of this transaction, in bytes
    pub fn tx_len(&self) -> u64 {
        let mut tx_bytes = vec![];
        self.consensus_serialize(&mut tx_bytes)
            .expect("BUG: Failed to serialize to vector");
        tx_bytes.len() as u64
    }

    /// Get an upper bound on the serialized length of this transaction once all outstanding
    /// signatures are in place.  Each missing multisig signature field costs 66 bytes (one
    /// field ID byte and a 65-byte signature).
    pub fn estimated_len(&self) -> u64 {
        let mut len = self.tx_len();
        let mut conditions = vec![self.auth.origin()];
        if let Some(sponsor) = self.auth.sponsor() {
            conditions.push(sponsor);
        }
        for condition in conditions {
            match condition {
                TransactionSpendingCondition::Multisig(..)
                | TransactionSpendingCondition::OrderIndependentMultisig(..) => {
                    let missing = condition
                        .signatures_required()
                        .saturating_sub(condition.num_signatures());
                    len = len.saturating_add(u64::from(missing) * 66);
                }
                TransactionSpendingCondition::Singlesig(..) => {}
            }
        }
        len
    }

    /// Set the transaction fee in STX
    pub fn set_tx_fee(&mut self, tx_fee: u64) {
        self.auth.set_tx_fee(tx_fee);
    }

    /// Get the transaction fee in STX
    pub fn get_tx_fee(&self) -> u64 {
        self.auth.get_tx_fee()
    }

    /// Set the transaction's origin nonce
    pub fn set_origin_nonce(&mut self, n: u64) {
        self.auth.set_origin_nonce(n);
    }

    /// Set the transaction's sponsor nonce
    pub fn set_sponsor_nonce(&mut self, n: u64) -> Result<(), Error> {
        self.auth.set_sponsor_nonce(n)
    }

    /// Set the transaction sponsor's spending condition
    pub fn set_sponsor(
        &mut self,
        sponsor_spending_cond: TransactionSpendingCondition,
    ) -> Result<(), Error> {
        self.auth.set_sponsor(sponsor_spending_cond)
    }

    /// Set anchor mode
    pub fn set_anchor_mode(&mut self, anchor_mode: TransactionAnchorMode) {
        self.anchor_mode = anchor_mode;
    }

    /// Set post-condition mode
    pub fn set_post_condition_mode(&mut self, postcond_mode: TransactionPostConditionMode) {
        self.post_condition_mode = postcond_mode;
    }

    /// Add a post-condition
    pub fn add_post_condition(&mut self, post_condition: TransactionPostCondition) {
        self.post_conditions.push(post_condition);
    }

    /// A txid of a stacks transaction is its sha512/256 hash
    pub fn txid(&self) -> Txid {
        let mut bytes = vec![];
        self.consensus_serialize(&mut bytes)
            .expect("BUG: failed to serialize to a vec");
        Txid::from_stacks_tx(&bytes)
    }

    /// Get a mutable reference to the internal auth structure
    pub fn borrow_auth(&mut self) -> &mut TransactionAuth {
        &mut self.auth
    }

    /// Get an immutable reference to the internal auth structure
    pub fn auth(&self) -> &TransactionAuth {
        &self.auth
    }

    /// begin signing the transaction.
    /// If this is a sponsored transaction, then the origin only commits to knowing that it is
    /// sponsored.  It does _not_ commit to the sponsored fields, so set them all to sentinel
    /// values.
    /// Return the initial sighash.
    pub fn sign_begin(&self) -> Txid {
        let mut tx = self.clone();
        tx.auth = tx.auth.into_initial_sighash_auth();
        tx.txid()
    }

    /// begin verifying a transaction.
    /// return the initial sighash
    pub fn verify_begin(&self) -> Txid {
        let mut tx = self.clone();
        tx.auth = tx.auth.into_initial_sighash_auth();
        tx.txid()
    }

    /// Sign a sighash and append the signature and public key to the given spending condition.
    /// Returns the next sighash
    fn sign_and_append(
        condition: &mut TransactionSpendingCondition,
        cur_sighash: &Txid,
        auth_flag: &TransactionAuthFlags,
        privk: &StacksPrivateKey,
    ) -> Result<Txid, Error> {
        let (next_sig, next_sighash) = TransactionSpendingCondition::next_signature(
            cur_sighash,
            auth_flag,
            condition.tx_fee(),
            condition.nonce(),
            privk,
        )?;
        let pubk = StacksPublicKey::from_private(privk);
        let key_encoding = if pubk.compressed() {
            TransactionPublicKeyEncoding::Compressed
        } else {
            TransactionPublicKeyEncoding::Uncompressed
        };
        match condition {
            TransactionSpendingCondition::Singlesig(ref mut cond) => {
                cond.set_signature(next_sig);
                Ok(next_sighash)
            }
            TransactionSpendingCondition::Multisig(ref mut cond) => {
                cond.push_signature(key_encoding, next_sig);
                Ok(next_sighash)
            }
            TransactionSpendingCondition::OrderIndependentMultisig(ref mut cond) => {
                // each signer covers the same initial sighash, so the chain does not advance
                cond.push_signature(key_encoding, next_sig);
                Ok(cur_sighash.clone())
            }
        }
    }

    /// Append a public key to a multisig condition
    fn append_pubkey(
        condition: &mut TransactionSpendingCondition,
        cur_sighash: &Txid,
        pubkey: &StacksPublicKey,
    ) -> Result<Txid, Error> {
        match condition {
            TransactionSpendingCondition::Multisig(ref mut cond) => {
                cond.push_public_key(pubkey.clone());
                Ok(cur_sighash.clone())
            }
            TransactionSpendingCondition::OrderIndependentMultisig(ref mut cond) => {
                cond.push_public_key(pubkey.clone());
                Ok(cur_sighash.clone())
            }
            _ => Err(Error::SigningError(
                "Not a multisig condition".to_string(),
            )),
        }
    }

    /// Sign the next sighash for the origin, and update the origin spending condition.
    /// Returns the next sighash.
    pub fn sign_next_origin(
        &mut self,
        cur_sighash: &Txid,
        privk: &StacksPrivateKey,
    ) -> Result<Txid, Error> {
        let next_sighash = match self.auth {
            TransactionAuth::Standard(ref mut origin_condition)
            | TransactionAuth::Sponsored(ref mut origin_condition, _) => {
                StacksTransaction::sign_and_append(
                    origin_condition,
                    cur_sighash,
                    &TransactionAuthFlags::AuthStandard,
                    privk,
                )?
            }
        };
        Ok(next_sighash)
    }

    /// Append the next public key to the origin account authorization.
    pub fn append_next_origin(
        &mut self,
        cur_sighash: &Txid,
        pubk: &StacksPublicKey,
    ) -> Result<Txid, Error> {
        let next_sighash = match self.auth {
            TransactionAuth::Standard(ref mut origin_condition)
            | TransactionAuth::Sponsored(ref mut origin_condition, _) => {
                StacksTransaction::append_pubkey(origin_condition, cur_sighash, pubk)?
            }
        };
        Ok(next_sighash)
    }

    /// Sign the next sighash for the sponsor, and update the sponsor spending condition.
    /// Returns the next sighash
    pub fn sign_next_sponsor(
        &mut self,
        cur_sighash: &Txid,
        privk: &StacksPrivateKey,
    ) -> Result<Txid, Error> {
        let next_sighash = match self.auth {
            TransactionAuth::Standard(_) => {
                // invalid
                return Err(Error::SigningError(
                    "Cannot sign standard authorization with a sponsoring private key".to_string(),
                ));
            }
            TransactionAuth::Sponsored(_, ref mut sponsor_condition) => {
                StacksTransaction::sign_and_append(
                    sponsor_condition,
                    cur_sighash,
                    &TransactionAuthFlags::AuthSponsored,
                    privk,
                )?
            }
        };
        Ok(next_sighash)
    }

    /// Append the next public key to the sponsor account authorization.
    pub fn append_next_sponsor(
        &mut self,
        cur_sighash: &Txid,
        pubk: &StacksPublicKey,
    ) -> Result<Txid, Error> {
        match self.auth {
            TransactionAuth::Standard(_) => Err(Error::SigningError(
                "Cannot append a public key to the sponsor of a standard auth condition"
                    .to_string(),
            )),
            TransactionAuth::Sponsored(_, ref mut sponsor_condition) => {
                StacksTransaction::append_pubkey(sponsor_condition, cur_sighash, pubk)
            }
        }
    }

    /// Verify the transaction's origin signatures only.
    /// Used by sponsors to get the next sig-hash to sign.
    pub fn verify_origin(&self) -> Result<Txid, Error> {
        self.auth.verify_origin(&self.verify_begin())
    }

    /// Verify this transaction's signatures
    pub fn verify(&self) -> Result<(), Error> {
        self.auth.verify(&self.verify_begin())
    }

    /// Get the origin account's address
    pub fn origin_address(&self) -> crate::address::StacksAddress {
        match (&self.version, &self.auth) {
            (TransactionVersion::Mainnet, TransactionAuth::Standard(origin_condition)) => {
                origin_condition.address_mainnet()
            }
            (TransactionVersion::Testnet, TransactionAuth::Standard(origin_condition)) => {
                origin_condition.address_testnet()
            }
            (
                TransactionVersion::Mainnet,
                TransactionAuth::Sponsored(origin_condition, _unused),
            ) => origin_condition.address_mainnet(),
            (
                TransactionVersion::Testnet,
                TransactionAuth::Sponsored(origin_condition, _unused),
            ) => origin_condition.address_testnet(),
        }
    }

    /// Get the sponsor account's address, if this transaction is sponsored
    pub fn sponsor_address(&self) -> Option<crate::address::StacksAddress> {
        match (&self.version, &self.auth) {
            (TransactionVersion::Mainnet, TransactionAuth::Sponsored(_unused, sponsor_condition)) => {
                Some(sponsor_condition.address_mainnet())
            }
            (TransactionVersion::Testnet, TransactionAuth::Sponsored(_unused, sponsor_condition)) => {
                Some(sponsor_condition.address_testnet())
            }
            (_, TransactionAuth::Standard(_)) => None,
        }
    }

    /// Get a copy of the origin spending condition
    pub fn get_origin(&self) -> TransactionSpendingCondition {
        self.auth.origin().clone()
    }

    /// Get a copy of the sending condition that will pay the tx fee
    pub fn get_payer(&self) -> TransactionSpendingCondition {
        match self.auth.sponsor() {
            Some(tsc) => tsc.clone(),
            None => self.auth.origin().clone(),
        }
    }

    /// Is this a mainnet transaction?  false means 'testnet'
    pub fn is_mainnet(&self) -> bool {
        matches!(self.version, TransactionVersion::Mainnet)
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod test {
    use super::*;
    use crate::clarity::{PrincipalData, StandardPrincipalData};
    use crate::codec::test::check_codec_and_corruption;
    use crate::tx::{
        CoinbasePayload, StacksPrivateKey, TokenTransferMemo, CHAIN_ID_MAINNET, CHAIN_ID_TESTNET,
    };

    fn make_token_transfer_tx(privk: &StacksPrivateKey) -> StacksTransaction {
        let auth = TransactionAuth::from_p2pkh(privk).unwrap();
        let recipient =
            PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());
        let mut tx = StacksTransaction::new(
            TransactionVersion::Mainnet,
            auth,
            TransactionPayload::TokenTransfer(recipient, 123, TokenTransferMemo([0u8; 34])),
        );
        tx.chain_id = CHAIN_ID_MAINNET;
        tx
    }

    #[test]
    fn tx_stacks_transaction_codec() {
        let privk = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let tx = make_token_transfer_tx(&privk);

        let mut tx_bytes = vec![
            // version
            TransactionVersion::Mainnet as u8,
            // chain id
            0x00, 0x00, 0x00, 0x01,
        ];
        tx.auth.consensus_serialize(&mut tx_bytes).unwrap();
        // anchor mode
        tx_bytes.push(TransactionAnchorMode::Any as u8);
        // post-condition mode
        tx_bytes.push(TransactionPostConditionMode::Deny as u8);
        // post-conditions (none)
        tx_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        tx.payload.consensus_serialize(&mut tx_bytes).unwrap();

        check_codec_and_corruption::<StacksTransaction>(&tx, &tx_bytes);
    }

    #[test]
    fn tx_stacks_transaction_codec_invalid_bytes() {
        let privk = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let tx = make_token_transfer_tx(&privk);
        let tx_bytes = tx.serialize_to_vec();

        // unknown version byte
        let mut bad_version = tx_bytes.clone();
        bad_version[0] = 0x7f;
        assert!(StacksTransaction::consensus_deserialize(&mut &bad_version[..]).is_err());

        // unknown anchor mode
        let anchor_index = tx_bytes.len() - tx.payload.serialize_to_vec().len() - 6;
        assert_eq!(tx_bytes[anchor_index], TransactionAnchorMode::Any as u8);
        let mut bad_anchor = tx_bytes.clone();
        bad_anchor[anchor_index] = 0x7f;
        assert!(StacksTransaction::consensus_deserialize(&mut &bad_anchor[..]).is_err());

        // unknown post-condition mode
        let mut bad_pc_mode = tx_bytes.clone();
        assert_eq!(tx_bytes[anchor_index + 1], TransactionPostConditionMode::Deny as u8);
        bad_pc_mode[anchor_index + 1] = 0x7f;
        assert!(StacksTransaction::consensus_deserialize(&mut &bad_pc_mode[..]).is_err());
    }

    #[test]
    fn tx_stacks_transaction_coinbase_anchor_mode() {
        let privk = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let auth = TransactionAuth::from_p2pkh(&privk).unwrap();
        let mut tx = StacksTransaction::new(
            TransactionVersion::Testnet,
            auth,
            TransactionPayload::Coinbase(CoinbasePayload([0x12; 32]), None),
        );
        tx.chain_id = CHAIN_ID_TESTNET;

        // defaults to on-chain-only
        assert_eq!(tx.anchor_mode, TransactionAnchorMode::OnChainOnly);
        let tx_bytes = tx.serialize_to_vec();
        StacksTransaction::consensus_deserialize(&mut &tx_bytes[..]).unwrap();

        // a coinbase that is not on-chain-only must not parse
        tx.set_anchor_mode(TransactionAnchorMode::Any);
        let tx_bytes = tx.serialize_to_vec();
        assert!(StacksTransaction::consensus_deserialize(&mut &tx_bytes[..]).is_err());
    }

    #[test]
    fn tx_stacks_transaction_txid_commits_to_fee_and_nonce() {
        let privk = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let mut tx = make_token_transfer_tx(&privk);
        let txid_before = tx.txid();

        tx.set_tx_fee(456);
        let txid_fee = tx.txid();
        assert!(txid_before != txid_fee);

        tx.set_origin_nonce(7);
        let txid_nonce = tx.txid();
        assert!(txid_fee != txid_nonce);
    }

    #[test]
    fn tx_stacks_transaction_sign_verify_standard() {
        let privk = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let mut tx = make_token_transfer_tx(&privk);
        tx.set_tx_fee(456);
        tx.set_origin_nonce(123);

        let initial_sighash = tx.sign_begin();
        tx.sign_next_origin(&initial_sighash, &privk).unwrap();

        tx.verify().unwrap();

        // serialized and parsed copies also verify
        let tx_bytes = tx.serialize_to_vec();
        let parsed = StacksTransaction::consensus_deserialize(&mut &tx_bytes[..]).unwrap();
        assert_eq!(parsed, tx);
        parsed.verify().unwrap();

        // changing the fee after signing breaks the signature
        tx.set_tx_fee(789);
        assert!(tx.verify().is_err());
    }

    #[test]
    fn tx_stacks_transaction_estimated_len() {
        let privk_1 = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let privk_2 = StacksPrivateKey::from_hex(
            "7e3ee1f2a0ae11b785a1f0e725a9b3ab0a5fd6c6674a5b8a36f5a5e36a1f853601",
        )
        .unwrap();

        let auth = TransactionAuth::from_p2sh(&[privk_1.clone(), privk_2], 2).unwrap();
        let recipient =
            PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());
        let mut tx = StacksTransaction::new(
            TransactionVersion::Mainnet,
            auth,
            TransactionPayload::TokenTransfer(recipient, 123, TokenTransferMemo([0u8; 34])),
        );
        tx.chain_id = CHAIN_ID_MAINNET;

        // unsigned 2-of-2: two missing 66-byte signature fields
        assert_eq!(tx.estimated_len(), tx.tx_len() + 2 * 66);

        // after one signature, one missing field remains
        let initial_sighash = tx.sign_begin();
        tx.sign_next_origin(&initial_sighash, &privk_1).unwrap();
        assert_eq!(tx.estimated_len(), tx.tx_len() + 66);
    }

    #[test]
    fn tx_stacks_transaction_token_transfer_known_bytes() {
        let privk = StacksPrivateKey::from_hex(
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
        )
        .unwrap();
        let auth = TransactionAuth::from_p2pkh(&privk).unwrap();
        let recipient =
            PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());
        let mut memo_bytes = [0u8; 34];
        memo_bytes[0..9].copy_from_slice(b"test memo");

        let mut tx = StacksTransaction::new(
            TransactionVersion::Mainnet,
            auth,
            TransactionPayload::TokenTransfer(recipient, 12345, TokenTransferMemo(memo_bytes)),
        );
        tx.chain_id = CHAIN_ID_MAINNET;

        let initial_sighash = tx.sign_begin();
        tx.sign_next_origin(&initial_sighash, &privk).unwrap();
        tx.verify().unwrap();

        // RFC 6979 signing is deterministic, so this transaction has exactly one
        // serialization
        let tx_bytes = vec![
            // version (mainnet)
            0x00,
            // chain id
            0x00, 0x00, 0x00, 0x01,
            // auth (standard)
            0x04,
            // hash mode (p2pkh)
            0x00,
            // signer (hash160 of the compressed public key)
            0x14, 0x3e, 0x54, 0x32, 0x43, 0xdf, 0xcd, 0x8c, 0x02, 0xa1,
            0x2a, 0xd7, 0xea, 0x37, 0x1b, 0xd0, 0x7b, 0xc9, 0x1d, 0xf9,
            // nonce
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // tx fee
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // key encoding (compressed)
            0x00,
            // recoverable signature
            0x01,
            0xb8, 0xcb, 0xff, 0x7a, 0xa5, 0x9d, 0x8d, 0xb4, 0x83, 0xba,
            0x92, 0x64, 0xde, 0xb1, 0x0f, 0xf7, 0xb5, 0x1a, 0x78, 0xb0,
            0x10, 0x22, 0xc5, 0xdb, 0xce, 0x12, 0x8a, 0x36, 0x80, 0xd5,
            0x29, 0xa4, 0x49, 0xb2, 0xa8, 0x29, 0x11, 0x23, 0xec, 0xe1,
            0x1c, 0xdf, 0x1a, 0xb0, 0xca, 0x58, 0xb8, 0x30, 0x8d, 0x3a,
            0xb9, 0x6f, 0x93, 0xf1, 0x13, 0x38, 0xd3, 0x47, 0x66, 0x90,
            0x1f, 0x59, 0xb9, 0x0f,
            // anchor mode (any)
            0x03,
            // post-condition mode (deny)
            0x02,
            // post-conditions (none)
            0x00, 0x00, 0x00, 0x00,
            // payload ID (token transfer)
            0x00,
            // recipient (standard principal, version 1)
            0x05, 0x01,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            // amount (12,345 microSTX)
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x39,
            // memo ("test memo", zero-padded)
            0x74, 0x65, 0x73, 0x74, 0x20, 0x6d, 0x65, 0x6d, 0x6f, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        assert_eq!(tx.serialize_to_vec(), tx_bytes);
        assert_eq!(
            tx.txid().to_hex(),
            "5f9718f8ebfad75ba979be81040138e5dca39fffbd637e4f60c8023281ba279c"
        );
    }
}
