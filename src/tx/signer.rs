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

use crate::tx::{
    Error, StacksPrivateKey, StacksPublicKey, StacksTransaction, StacksTransactionSigner,
    TransactionAuth, TransactionAuthField, TransactionAuthFlags, TransactionSpendingCondition,
};

impl StacksTransactionSigner {
    /// Begin signing the given transaction.
    /// If the origin condition already carries signatures, the signer resumes from where the
    /// last signer left off by replaying them into the running sighash.  A multisig origin
    /// that already has all of its signatures cannot accept another one.
    pub fn new(tx: &StacksTransaction) -> Result<StacksTransactionSigner, Error> {
        let origin = tx.auth().origin();
        match origin {
            TransactionSpendingCondition::Multisig(..)
            | TransactionSpendingCondition::OrderIndependentMultisig(..) => {
                if origin.num_signatures() >= origin.signatures_required() {
                    return Err(Error::SigningError(
                        "Origin condition already has enough signatures".to_string(),
                    ));
                }
            }
            TransactionSpendingCondition::Singlesig(..) => {}
        }

        let initial_sighash = tx.sign_begin();
        let sighash =
            origin.resume_sighash(&initial_sighash, &TransactionAuthFlags::AuthStandard)?;

        Ok(StacksTransactionSigner {
            tx: tx.clone(),
            sighash,
            origin_done: false,
            check_oversign: true,
            check_overlap: true,
        })
    }

    /// Make a signer for an already-signed origin, so the sponsor can sign.
    /// Sets the new sponsor spending condition on the transaction.
    pub fn new_sponsor(
        tx: &StacksTransaction,
        spending_condition: TransactionSpendingCondition,
    ) -> Result<StacksTransactionSigner, Error> {
        if !tx.auth().is_sponsored() {
            return Err(Error::IncompatibleSpendingConditionError);
        }
        let mut new_tx = tx.clone();
        new_tx.set_sponsor(spending_condition)?;
        let origin_sighash = new_tx.verify_origin()?;

        Ok(StacksTransactionSigner {
            tx: new_tx,
            sighash: origin_sighash,
            origin_done: true,
            check_oversign: true,
            check_overlap: true,
        })
    }

    pub fn resume(&mut self, tx: &StacksTransaction) {
        self.tx = tx.clone()
    }

    pub fn disable_checks(&mut self) {
        self.check_oversign = false;
        self.check_overlap = false;
    }

    pub fn sign_origin(&mut self, privk: &StacksPrivateKey) -> Result<(), Error> {
        if self.check_overlap && self.origin_done {
            // can't sign another origin key; we've already transitioned to sponsors
            return Err(Error::SigningError(
                "Cannot sign origin after sponsor key".to_string(),
            ));
        }

        match self.tx.auth() {
            TransactionAuth::Standard(ref origin_condition)
            | TransactionAuth::Sponsored(ref origin_condition, _) => {
                if self.check_oversign
                    && origin_condition.num_signatures() >= origin_condition.signatures_required()
                {
                    return Err(Error::SigningError(
                        "Origin would have too many signatures".to_string(),
                    ));
                }
            }
        }

        let next_sighash = self.tx.sign_next_origin(&self.sighash, privk)?;
        self.sighash = next_sighash;
        Ok(())
    }

    pub fn append_origin(&mut self, pubk: &StacksPublicKey) -> Result<(), Error> {
        if self.check_overlap && self.origin_done {
            // can't append another origin key
            return Err(Error::SigningError(
                "Cannot append public key to origin after sponsor key".to_string(),
            ));
        }

        let next_sighash = self.tx.append_next_origin(&self.sighash, pubk)?;
        self.sighash = next_sighash;
        Ok(())
    }

    pub fn sign_sponsor(&mut self, privk: &StacksPrivateKey) -> Result<(), Error> {
        if let TransactionAuth::Sponsored(_, ref sponsor_condition) = self.tx.auth() {
            if self.check_oversign
                && sponsor_condition.num_signatures() >= sponsor_condition.signatures_required()
            {
                return Err(Error::SigningError(
                    "Sponsor would have too many signatures".to_string(),
                ));
            }
        }

        let next_sighash = self.tx.sign_next_sponsor(&self.sighash, privk)?;
        self.sighash = next_sighash;
        self.origin_done = true;
        Ok(())
    }

    pub fn append_sponsor(&mut self, pubk: &StacksPublicKey) -> Result<(), Error> {
        let next_sighash = self.tx.append_next_sponsor(&self.sighash, pubk)?;
        self.sighash = next_sighash;
        Ok(())
    }

    pub fn pop_origin_auth_field(&mut self) -> Option<TransactionAuthField> {
        match self.tx.borrow_auth() {
            TransactionAuth::Standard(ref mut origin_condition)
            | TransactionAuth::Sponsored(ref mut origin_condition, _) => {
                StacksTransactionSigner::pop_auth_field(origin_condition)
            }
        }
    }

    pub fn pop_sponsor_auth_field(&mut self) -> Option<TransactionAuthField> {
        match self.tx.borrow_auth() {
            TransactionAuth::Sponsored(_, ref mut sponsor_condition) => {
                StacksTransactionSigner::pop_auth_field(sponsor_condition)
            }
            _ => None,
        }
    }

    fn pop_auth_field(
        condition: &mut TransactionSpendingCondition,
    ) -> Option<TransactionAuthField> {
        match condition {
            TransactionSpendingCondition::Singlesig(ref mut cond) => cond.pop_signature(),
            TransactionSpendingCondition::Multisig(ref mut cond) => cond.pop_auth_field(),
            TransactionSpendingCondition::OrderIndependentMultisig(ref mut cond) => {
                cond.pop_auth_field()
            }
        }
    }

    pub fn complete(&self) -> bool {
        match self.tx.auth() {
            TransactionAuth::Standard(ref origin_condition) => {
                origin_condition.num_signatures() >= origin_condition.signatures_required()
            }
            TransactionAuth::Sponsored(ref origin_condition, ref sponsored_condition) => {
                origin_condition.num_signatures() >= origin_condition.signatures_required()
                    && sponsored_condition.num_signatures()
                        >= sponsored_condition.signatures_required()
                    && self.origin_done
            }
        }
    }

    /// Get the final transaction, but only if it has a complete set of signatures
    pub fn get_tx(&self) -> Option<StacksTransaction> {
        if self.complete() {
            Some(self.tx.clone())
        } else {
            None
        }
    }

    /// Get the transaction in whatever signing state it's in
    pub fn get_tx_incomplete(&self) -> StacksTransaction {
        self.tx.clone()
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod test {
    use super::*;
    use crate::clarity::{PrincipalData, StandardPrincipalData};
    use crate::codec::StacksMessageCodec;
    use crate::tx::{
        TokenTransferMemo, TransactionPayload, TransactionVersion, CHAIN_ID_MAINNET,
    };

    fn make_keys(n: usize) -> Vec<StacksPrivateKey> {
        let fixtures = [
            "6d430bb91222408e7706c9001cfaeb91b08c2be6d5ac95779ab52c6b431950e001",
            "7e3ee1f2a0ae11b785a1f0e725a9b3ab0a5fd6c6674a5b8a36f5a5e36a1f853601",
            "f67c7437f948ca1834602b28595c12ac744f287a4efaf70d437042a6afed81bc01",
        ];
        fixtures
            .iter()
            .take(n)
            .map(|hex| StacksPrivateKey::from_hex(hex).unwrap())
            .collect()
    }

    fn make_token_transfer_tx(auth: TransactionAuth) -> StacksTransaction {
        let recipient =
            PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());
        let mut tx = StacksTransaction::new(
            TransactionVersion::Mainnet,
            auth,
            TransactionPayload::TokenTransfer(recipient, 123, TokenTransferMemo([0u8; 34])),
        );
        tx.chain_id = CHAIN_ID_MAINNET;
        tx.set_tx_fee(456);
        tx
    }

    #[test]
    fn tx_stacks_signer_singlesig() {
        let privk = &make_keys(1)[0];
        let tx = make_token_transfer_tx(TransactionAuth::from_p2pkh(privk).unwrap());

        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        assert!(!signer.complete());
        assert!(signer.get_tx().is_none());

        signer.sign_origin(privk).unwrap();
        assert!(signer.complete());

        let signed_tx = signer.get_tx().unwrap();
        signed_tx.verify().unwrap();

        // signing twice is an oversign
        assert!(signer.sign_origin(privk).is_err());
    }

    #[test]
    fn tx_stacks_signer_sequential_multisig() {
        let privks = make_keys(3);
        let tx = make_token_transfer_tx(TransactionAuth::from_p2sh(&privks, 2).unwrap());

        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        signer.sign_origin(&privks[0]).unwrap();
        signer.sign_origin(&privks[1]).unwrap();
        // all keys must be represented, so the third appends its public key
        signer
            .append_origin(&StacksPublicKey::from_private(&privks[2]))
            .unwrap();

        let signed_tx = signer.get_tx().unwrap();
        signed_tx.verify().unwrap();

        // a third signature is an oversign
        assert!(signer.sign_origin(&privks[2]).is_err());
    }

    #[test]
    fn tx_stacks_signer_resumes_partial_multisig() {
        let privks = make_keys(3);
        let tx = make_token_transfer_tx(TransactionAuth::from_p2sh(&privks, 2).unwrap());

        // first signer signs and hands the serialized transaction off
        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        signer.sign_origin(&privks[0]).unwrap();
        let partial_bytes = signer.get_tx_incomplete().serialize_to_vec();

        // second signer parses the partial transaction and picks up the chain
        let partial_tx =
            StacksTransaction::consensus_deserialize(&mut &partial_bytes[..]).unwrap();
        let mut signer_2 = StacksTransactionSigner::new(&partial_tx).unwrap();
        signer_2.sign_origin(&privks[1]).unwrap();
        signer_2
            .append_origin(&StacksPublicKey::from_private(&privks[2]))
            .unwrap();

        let signed_tx = signer_2.get_tx().unwrap();
        signed_tx.verify().unwrap();
    }

    #[test]
    fn tx_stacks_signer_order_independent_multisig() {
        let privks = make_keys(3);
        let tx = make_token_transfer_tx(
            TransactionAuth::from_order_independent_p2sh(&privks, 2).unwrap(),
        );

        // sign with keys 3 and 1, in that order, with key 2 as a bare public key.
        // the key order in the fields must still match the committed key order,
        // but the signatures themselves may arrive in any order.
        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        signer.sign_origin(&privks[2]).unwrap();
        signer
            .append_origin(&StacksPublicKey::from_private(&privks[1]))
            .unwrap();
        signer.sign_origin(&privks[0]).unwrap();

        // fields were pushed out of key order, so reorder them to match the address commitment
        let mut signed_tx = signer.get_tx().unwrap();
        if let TransactionAuth::Standard(TransactionSpendingCondition::OrderIndependentMultisig(
            ref mut cond,
        )) = signed_tx.auth
        {
            cond.fields.swap(0, 2);
        }
        // fields are now [sig(key 1), pubkey(key 2), sig(key 3)]
        if let TransactionAuth::Standard(TransactionSpendingCondition::OrderIndependentMultisig(
            ref cond,
        )) = signed_tx.auth
        {
            assert!(cond.fields[0].is_signature());
            assert!(cond.fields[1].is_public_key());
            assert!(cond.fields[2].is_signature());
        }

        signed_tx.verify().unwrap();
    }

    #[test]
    fn tx_stacks_signer_sponsored() {
        let privks = make_keys(2);
        let origin_privk = &privks[0];
        let sponsor_privk = &privks[1];

        let auth = TransactionAuth::from_p2pkh(origin_privk)
            .unwrap()
            .into_sponsored(TransactionAuth::from_p2pkh(sponsor_privk).unwrap())
            .unwrap();
        let mut tx = make_token_transfer_tx(auth);
        tx.set_sponsor_nonce(7).unwrap();

        // the origin signs first
        let mut origin_signer = StacksTransactionSigner::new(&tx).unwrap();
        origin_signer.sign_origin(origin_privk).unwrap();
        assert!(!origin_signer.complete());
        let presigned_tx = origin_signer.get_tx_incomplete();

        // then the sponsor fills in its own condition and signs
        let mut sponsor_condition = TransactionSpendingCondition::new_singlesig_p2pkh(
            StacksPublicKey::from_private(sponsor_privk),
        )
        .unwrap();
        sponsor_condition.set_nonce(7);
        sponsor_condition.set_tx_fee(456);

        let mut sponsor_signer =
            StacksTransactionSigner::new_sponsor(&presigned_tx, sponsor_condition).unwrap();
        sponsor_signer.sign_sponsor(sponsor_privk).unwrap();

        let signed_tx = sponsor_signer.get_tx().unwrap();
        signed_tx.verify().unwrap();

        // the origin cannot sign once the sponsor has
        assert!(sponsor_signer.sign_origin(origin_privk).is_err());
    }

    #[test]
    fn tx_stacks_signer_rejects_fully_signed_multisig() {
        let privks = make_keys(2);
        let tx = make_token_transfer_tx(TransactionAuth::from_p2sh(&privks, 2).unwrap());

        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        signer.sign_origin(&privks[0]).unwrap();
        signer.sign_origin(&privks[1]).unwrap();
        let signed_tx = signer.get_tx().unwrap();

        // no more signatures fit, so a new signer can't be made for it
        assert!(StacksTransactionSigner::new(&signed_tx).is_err());
    }

    #[test]
    fn tx_stacks_signer_sequential_multisig_known_bytes() {
        let privks = make_keys(3);
        let recipient =
            PrincipalData::from(StandardPrincipalData::new(1, [0xff; 20]).unwrap());
        let mut memo_bytes = [0u8; 34];
        memo_bytes[0..9].copy_from_slice(b"test memo");

        let mut tx = StacksTransaction::new(
            TransactionVersion::Mainnet,
            TransactionAuth::from_p2sh(&privks, 2).unwrap(),
            TransactionPayload::TokenTransfer(
                recipient,
                2_500_000,
                TokenTransferMemo(memo_bytes),
            ),
        );
        tx.chain_id = CHAIN_ID_MAINNET;

        // keys 1 and 2 sign in order, key 3 appends its public key
        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        signer.sign_origin(&privks[0]).unwrap();
        signer.sign_origin(&privks[1]).unwrap();
        signer
            .append_origin(&StacksPublicKey::from_private(&privks[2]))
            .unwrap();

        let signed_tx = signer.get_tx().unwrap();
        signed_tx.verify().unwrap();

        // RFC 6979 signing is deterministic, so this transaction has exactly one
        // serialization
        let tx_bytes = vec![
            // version (mainnet)
            0x00,
            // chain id
            0x00, 0x00, 0x00, 0x01,
            // auth (standard)
            0x04,
            // hash mode (p2sh sequential multisig)
            0x01,
            // signer (hash160 of the 2-of-3 redeem script)
            0x12, 0x1a, 0xd1, 0x7c, 0x0a, 0x71, 0x2a, 0x80, 0x28, 0x3a,
            0x1b, 0xc0, 0xc0, 0x16, 0x1d, 0xdf, 0x4d, 0xa0, 0xaf, 0x9f,
            // nonce
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // tx fee
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // fields (3)
            0x00, 0x00, 0x00, 0x03,
            // field 1: signature, compressed key
            0x02,
            0x00, 0x32, 0x14, 0x5c, 0x2f, 0xa9, 0xdc, 0x36, 0x4d, 0xf5,
            0xf7, 0x26, 0xc7, 0xd7, 0xc3, 0xa7, 0xe8, 0x81, 0x20, 0x1b,
            0x9f, 0x2c, 0x72, 0xc5, 0x45, 0xfd, 0x2f, 0x9d, 0xe8, 0x0d,
            0xf5, 0x05, 0x32, 0x11, 0x97, 0xe9, 0x26, 0xd2, 0x85, 0x14,
            0xfb, 0xa7, 0xd9, 0x68, 0x83, 0x1b, 0xa0, 0x82, 0xb4, 0x38,
            0xdc, 0x4e, 0xc9, 0xee, 0x6a, 0xbd, 0x15, 0xdf, 0x32, 0x89,
            0x60, 0x5d, 0x4f, 0xe9, 0x89,
            // field 2: signature, compressed key
            0x02,
            0x00, 0xff, 0x19, 0x98, 0xf1, 0xa2, 0x46, 0x99, 0x77, 0x6c,
            0x3e, 0x30, 0xdf, 0xbb, 0x96, 0x89, 0x32, 0x52, 0x21, 0xfe,
            0xa2, 0x10, 0xa5, 0xa0, 0xf1, 0xed, 0xac, 0xdb, 0x32, 0x66,
            0xbc, 0xb9, 0x8f, 0x42, 0x86, 0x5e, 0xaa, 0xb4, 0xe8, 0xd9,
            0xb8, 0xa0, 0xc1, 0x94, 0xbc, 0xc0, 0x4f, 0xe5, 0xd2, 0xb6,
            0x92, 0xb3, 0xdf, 0xf4, 0x11, 0x81, 0xdf, 0x0e, 0x7f, 0x37,
            0x48, 0xa5, 0x22, 0xce, 0xf3,
            // field 3: compressed public key
            0x00,
            0x02, 0xc4, 0x1c, 0x02, 0x65, 0x1b, 0x1b, 0x27, 0x93, 0x25,
            0x1d, 0x7b, 0x3b, 0x99, 0xd5, 0x43, 0xda, 0x30, 0x3a, 0x59,
            0x67, 0x2c, 0x56, 0x9e, 0xed, 0x67, 0x28, 0x5b, 0xa5, 0xc4,
            0x50, 0x2f, 0xd7,
            // signatures required
            0x00, 0x02,
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
            // amount (2,500,000 microSTX)
            0x00, 0x00, 0x00, 0x00, 0x00, 0x26, 0x25, 0xa0,
            // memo ("test memo", zero-padded)
            0x74, 0x65, 0x73, 0x74, 0x20, 0x6d, 0x65, 0x6d, 0x6f, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        assert_eq!(signed_tx.serialize_to_vec(), tx_bytes);
        assert_eq!(
            signed_tx.txid().to_hex(),
            "33e433c871b64a7b2771674c1814f6ba2d99910c9df5e221e07b8b732ff46794"
        );
    }

    #[test]
    fn tx_stacks_signer_pop_auth_field() {
        let privks = make_keys(2);
        let tx = make_token_transfer_tx(TransactionAuth::from_p2sh(&privks, 2).unwrap());

        let mut signer = StacksTransactionSigner::new(&tx).unwrap();
        signer.sign_origin(&privks[0]).unwrap();

        let popped = signer.pop_origin_auth_field().unwrap();
        assert!(popped.is_signature());
        assert!(signer.pop_origin_auth_field().is_none());
    }
}
