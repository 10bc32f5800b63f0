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

use std::io::prelude::*;
use std::ops::{Deref, DerefMut};
use std::{fmt, str};

use crate::codec::{
    read_next_at_most, write_next, Error as codec_error, StacksMessageCodec,
};

/// maximum length of a contract code body, in bytes
pub const MAX_CODE_BODY_LEN: u32 = 100_000;

/// printable-ASCII-only string, but encodable.
/// Note that it cannot be longer than MAX_CODE_BODY_LEN (100,000 bytes)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StacksString(Vec<u8>);

impl fmt::Display for StacksString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // guaranteed to be a valid UTF-8 string by construction
        String::from_utf8_lossy(&self.0).fmt(f)
    }
}

impl fmt::Debug for StacksString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        String::from_utf8_lossy(&self.0).fmt(f)
    }
}

impl str::FromStr for StacksString {
    type Err = String;
    fn from_str(s: &str) -> Result<StacksString, String> {
        StacksString::from_string(&String::from(s)).ok_or("Invalid string".into())
    }
}

impl Deref for StacksString {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl DerefMut for StacksString {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

impl StacksMessageCodec for StacksString {
    fn consensus_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.0)
    }

    fn consensus_deserialize<R: Read>(fd: &mut R) -> Result<StacksString, codec_error> {
        let bytes: Vec<u8> = read_next_at_most(fd, MAX_CODE_BODY_LEN)?;

        // must encode a valid string
        let s = String::from_utf8(bytes.clone()).map_err(|_e| {
            codec_error::DeserializeError("Invalid Stacks string: could not build from utf8".into())
        })?;

        if !StacksString::is_valid_string(&s) {
            return Err(codec_error::DeserializeError(
                "Invalid Stacks string: non-printable or non-ASCII string".to_string(),
            ));
        }

        Ok(StacksString(bytes))
    }
}

impl StacksString {
    /// Is the given string a valid Clarity string?
    pub fn is_valid_string(s: &String) -> bool {
        s.is_ascii() && StacksString::is_printable(s)
    }

    pub fn is_printable(s: &String) -> bool {
        if !s.is_ascii() {
            return false;
        }
        // all characters must be ASCII "printable" characters, excluding all
        // control characters, which include newlines and tabs.
        for c in s.as_bytes().iter() {
            if (*c < 0x20 && *c != 0x09 && *c != 0x0a && *c != 0x0d) || (*c > 0x7e) {
                return false;
            }
        }
        true
    }

    pub fn from_string(s: &String) -> Option<StacksString> {
        if s.len() > MAX_CODE_BODY_LEN as usize {
            return None;
        }
        if !StacksString::is_valid_string(s) {
            return None;
        }
        Some(StacksString(s.as_bytes().to_vec()))
    }

    pub fn from_str(s: &str) -> Option<StacksString> {
        if s.len() > MAX_CODE_BODY_LEN as usize {
            return None;
        }
        if !StacksString::is_valid_string(&String::from(s)) {
            return None;
        }
        Some(StacksString(s.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;
    use crate::codec::test::check_codec_and_corruption;

    #[test]
    fn tx_stacks_strings_codec() {
        let s = "hello-world";
        let stacks_str = StacksString::from_str(s).unwrap();

        assert_eq!(stacks_str[..], s.as_bytes().to_vec()[..]);

        // stacks strings have a 4-byte length prefix
        let mut bytes = vec![0x00, 0x00, 0x00, 0x0b];
        bytes.extend_from_slice(s.as_bytes());

        check_codec_and_corruption::<StacksString>(&stacks_str, &bytes);
    }

    #[test]
    fn tx_stacks_string_code_body_len() {
        let at_limit = "a".repeat(MAX_CODE_BODY_LEN as usize);
        let over_limit = "a".repeat((MAX_CODE_BODY_LEN as usize) + 1);

        assert!(StacksString::from_string(&at_limit).is_some());
        assert!(StacksString::from_str(&at_limit).is_some());
        assert!(StacksString::from_string(&over_limit).is_none());
        assert!(StacksString::from_str(&over_limit).is_none());

        let mut at_limit_bytes = vec![];
        StacksString::from_string(&at_limit)
            .unwrap()
            .consensus_serialize(&mut at_limit_bytes)
            .unwrap();
        let decoded = StacksString::consensus_deserialize(&mut &at_limit_bytes[..]).unwrap();
        assert_eq!(decoded.len(), MAX_CODE_BODY_LEN as usize);

        // length prefix one past the limit must be rejected before any body read
        let mut over_limit_bytes = (MAX_CODE_BODY_LEN + 1).to_be_bytes().to_vec();
        over_limit_bytes.extend_from_slice(over_limit.as_bytes());
        assert!(StacksString::consensus_deserialize(&mut &over_limit_bytes[..]).is_err());
    }

    #[test]
    fn tx_stacks_string_invalid() {
        let s = "hello\u{0001}world";
        assert!(StacksString::from_string(&String::from(s)).is_none());

        // non-ascii
        let s = "hello\u{1f600}world";
        assert!(StacksString::from_string(&String::from(s)).is_none());
    }
}
