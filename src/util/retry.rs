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

use std::io;
use std::io::prelude::*;

/// Wrap a Read so that we refuse to read more than a given number of bytes
pub struct BoundReader<'a, R: Read> {
    fd: &'a mut R,
    max_len: u64,
    read_so_far: u64,
}

impl<'a, R: Read> BoundReader<'a, R> {
    pub fn from_reader(reader: &'a mut R, max_len: u64) -> BoundReader<'a, R> {
        BoundReader {
            fd: reader,
            max_len,
            read_so_far: 0,
        }
    }

    pub fn num_read(&self) -> u64 {
        self.read_so_far
    }
}

impl<R: Read> Read for BoundReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let intended_read = self
            .read_so_far
            .checked_add(buf.len() as u64)
            .ok_or(io::Error::new(
                io::ErrorKind::Other,
                "Read would overflow u64",
            ))?;
        let max_read = if intended_read > self.max_len {
            self.max_len - self.read_so_far
        } else {
            buf.len() as u64
        };

        let nr = self.fd.read(&mut buf[0..(max_read as usize)])?;
        self.read_so_far += nr as u64;
        Ok(nr)
    }
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use super::BoundReader;

    #[test]
    fn test_bound_reader() {
        let tests = [
            (vec![1u8, 2, 3, 4, 5], 5, vec![1u8, 2, 3, 4, 5]),
            (vec![1u8, 2, 3, 4, 5], 3, vec![1u8, 2, 3]),
            (vec![1u8, 2, 3, 4, 5], 0, vec![]),
        ];
        for (data, bound, expected) in tests.iter() {
            let mut cursor = std::io::Cursor::new(data);
            let mut reader = BoundReader::from_reader(&mut cursor, *bound);
            let mut buf = vec![];
            reader.read_to_end(&mut buf).unwrap();
            assert_eq!(buf, *expected);
            assert_eq!(reader.num_read(), *bound);
        }
    }
}
