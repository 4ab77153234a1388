mod qr;

pub use qr::{Color, EncRegionIter, Module, QR};

use std::borrow::Cow;
use std::ops::Deref;

use encoding_rs::mem::{encode_latin1_lossy, is_str_latin1};
use encoding_rs::Encoding;
use tracing::{debug, debug_span};

use crate::common::{
    bit_utils::BitArray,
    codec::{eci_for_encoding, encode, encode_with_version, is_only_double_byte_kanji},
    ec::Block,
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};
use crate::symbol::QRCode;

#[derive(Debug, Clone, Copy)]
enum Content<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

pub struct QRBuilder<'a> {
    content: Content<'a>,
    encoding: Option<&'static Encoding>,
    version: Option<&'static Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    /// Raw bytes, encoded as they are.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_content(Content::Bytes(data))
    }

    /// Text, converted with the builder's encoding when building.
    pub fn from_text(text: &'a str) -> Self {
        Self::with_content(Content::Text(text))
    }

    fn with_content(content: Content<'a>) -> Self {
        Self { content, encoding: None, version: None, ec_level: ECLevel::L, mask: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.content = Content::Bytes(data);
        self
    }

    pub fn text(&mut self, text: &'a str) -> &mut Self {
        self.content = Content::Text(text);
        self
    }

    /// Character set of the content, announced with an ECI header. Without
    /// one, text must fit ISO-8859-1 and no header is written.
    pub fn encoding(&mut self, encoding: &'static Encoding) -> &mut Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn version(&mut self, version: &'static Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }

    pub fn metadata(&self) -> String {
        let encoding = self.encoding.map_or("ISO-8859-1", Encoding::name);
        match self.version {
            Some(v) => format!(
                "{{ Version: {}, Ec level: {:?}, Encoding: {} }}",
                v.number(),
                self.ec_level,
                encoding
            ),
            None => {
                format!("{{ Version: None, Ec level: {:?}, Encoding: {} }}", self.ec_level, encoding)
            }
        }
    }

    // Content bytes in the target encoding, with the ECI value announcing it
    fn content_bytes(&self) -> QRResult<(Cow<'a, [u8]>, Option<u32>)> {
        let Some(encoding) = self.encoding else {
            return match self.content {
                Content::Bytes(data) => Ok((Cow::Borrowed(data), None)),
                Content::Text(text) if is_str_latin1(text) => Ok((encode_latin1_lossy(text), None)),
                Content::Text(_) => Err(QRError::InvalidChar),
            };
        };

        let eci = eci_for_encoding(encoding)?;
        match self.content {
            Content::Bytes(data) => Ok((Cow::Borrowed(data), Some(eci))),
            Content::Text(text) => {
                if is_only_double_byte_kanji(text) {
                    debug!("Kanji content is encoded in byte mode");
                }
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    return Err(QRError::InvalidChar);
                }
                Ok((bytes, Some(eci)))
            }
        }
    }
}


impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QRCode> {
        let _span = debug_span!("qr_build", ec_level = ?self.ec_level).entered();
        debug!(metadata = %self.metadata(), "Generating QR");

        let (data, eci) = self.content_bytes()?;
        if data.is_empty() {
            return Err(QRError::EmptyData);
        }

        let ec_level = self.ec_level;
        debug!(len = data.len(), ?eci, "Encoding data");
        let (encoded_data, mode, version) = match self.version {
            Some(v) => {
                let (encoded, mode) = encode_with_version(&data, ec_level, eci, v)?;
                (encoded, mode, v)
            }
            None => {
                debug!("Finding best version");
                encode(&data, ec_level, eci)?
            }
        };

        debug!("Constructing payload with ecc & interleaving");
        let data_codewords = encoded_data.to_bytes();
        let blocks = Self::compute_ecc(&data_codewords, version, ec_level)?;
        let data_blocks = blocks.iter().map(Block::data).collect::<Vec<_>>();
        let ecc_blocks = blocks.iter().map(Block::ecc).collect::<Vec<_>>();
        let mut payload = BitArray::new();
        payload.extend_bytes(&Self::interleave(&data_blocks));
        payload.extend_bytes(&Self::interleave(&ecc_blocks));
        debug_assert_eq!(
            payload.len(),
            version.total_codewords() << 3,
            "Payload doesn't fill the symbol's codewords"
        );

        debug!("Drawing functional patterns");
        let mut qr = QR::new(version, ec_level);
        qr.draw_all_function_patterns();

        debug!("Drawing encoding region");
        qr.draw_encoding_region(&payload);

        let mask = match self.mask {
            Some(m) => {
                debug!(mask = *m, "Applying mask");
                qr.apply_mask(m);
                m
            }
            None => {
                debug!("Finding & applying best mask");
                apply_best_mask(&mut qr)
            }
        };

        let total_modules = qr.width() * qr.width();
        let dark_modules = qr.count_dark_modules();
        debug!(
            version = version.number(),
            %mode,
            mask = *mask,
            data_capacity = version.data_codewords(ec_level),
            ec_capacity = Self::ec_capacity(version, ec_level),
            dark_modules,
            balance = dark_modules * 100 / total_modules,
            "QR generated"
        );

        Ok(QRCode::new(mode, ec_level, version, mask, qr.to_matrix()?))
    }

    // ECC: Error Correction Codeword generator
    fn compute_ecc(data: &[u8], version: &Version, ec_level: ECLevel) -> QRResult<Vec<Block>> {
        let ec_len = version.ec_blocks(ec_level).ec_codewords_per_block();
        Self::blockify(data, version, ec_level).into_iter().map(|b| Block::new(b, ec_len)).collect()
    }

    /// Splits data codewords into blocks in table order, shorter blocks first.
    pub(crate) fn blockify<'d>(data: &'d [u8], version: &Version, ec_level: ECLevel) -> Vec<&'d [u8]> {
        let ec_blocks = version.ec_blocks(ec_level);
        debug_assert!(
            ec_blocks.total_data_codewords() == data.len(),
            "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
            data.len(),
            ec_blocks.total_data_codewords()
        );

        let mut rest = data;
        let mut data_blocks = Vec::with_capacity(ec_blocks.num_blocks());
        for size in ec_blocks.data_codewords_per_block() {
            let (block, tail) = rest.split_at(size.min(rest.len()));
            data_blocks.push(block);
            rest = tail;
        }
        data_blocks
    }

    /// Number of codeword errors the symbol can correct, less the codewords
    /// small symbols hold back against misdecoding.
    pub fn ec_capacity(version: &Version, ec_level: ECLevel) -> usize {
        let p = match (version.number(), ec_level) {
            (1, ECLevel::L) => 3,
            (2, ECLevel::L) | (1, ECLevel::M) => 2,
            (1, _) | (3, ECLevel::L) => 1,
            _ => 0,
        };

        let ec_bytes = version.ec_blocks(ec_level).total_ec_codewords();
        (ec_bytes - p) / 2
    }

    pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}
