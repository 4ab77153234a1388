use super::ReedSolomonEncoder;
use crate::common::error::QRResult;

// Block
//------------------------------------------------------------------------------

/// One error correction block: data codewords followed by their error
/// correction codewords.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Block {
    codewords: Vec<u8>,
    // Data length
    dlen: usize,
}

impl Block {
    /// Builds the block for `data`, appending `ec_len` error correction codewords.
    pub fn new(data: &[u8], ec_len: usize) -> QRResult<Self> {
        let dlen = data.len();
        let mut codewords = Vec::with_capacity(dlen + ec_len);
        codewords.extend_from_slice(data);
        codewords.resize(dlen + ec_len, 0);
        ReedSolomonEncoder::qr().encode(&mut codewords, ec_len)?;
        Ok(Self { codewords, dlen })
    }

    pub fn data(&self) -> &[u8] {
        &self.codewords[..self.dlen]
    }

    pub fn ecc(&self) -> &[u8] {
        &self.codewords[self.dlen..]
    }
}

#[cfg(test)]
mod block_tests {
    use super::Block;
    use crate::common::error::QRError;

    // Version 1-M
    const DATA: [u8; 16] = [32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17];
    const ECC: [u8; 10] = [196, 35, 39, 119, 235, 215, 231, 226, 93, 23];

    #[test]
    fn test_new() {
        let block = Block::new(&DATA, 10).unwrap();
        assert_eq!(block.data(), DATA);
        assert_eq!(block.ecc(), ECC);
    }

    #[test]
    fn test_invalid_block() {
        assert_eq!(
            Block::new(&DATA, 0),
            Err(QRError::InvalidArgument("no error correction codewords"))
        );
        assert_eq!(Block::new(&[], 10), Err(QRError::InvalidArgument("no data codewords")));
    }
}
