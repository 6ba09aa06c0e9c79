//! Block-based posting list storage
//!
//! Each posting list is a sequence of fixed-size blocks:
//! - docno deltas: bitpacked
//! - term frequencies: bitpacked
//! - positions: vbyte delta stream per posting
//! - skip data per block (max docno + block offset)
//!
//! Postings within a list are strictly docno-ordered; delta bases carry
//! across block boundaries, so a block jump resumes from the previous
//! block's max docno.

use std::io;

use super::types::{DocNo, Posting, PostingBlock, PostingListMeta};

/// Variable-byte encoding for integers
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80); // high bit marks the last byte
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> io::Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        if *pos >= input.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected end of vbyte",
            ));
        }

        let byte = input[*pos];
        *pos += 1;

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "vbyte value too large",
            ));
        }
    }
}

/// Bitpack a block of integers using the minimum width for the max value
pub fn bitpack_encode(values: &[u32], output: &mut Vec<u8>) {
    if values.is_empty() {
        output.push(0);
        return;
    }

    let max_val = values.iter().copied().max().unwrap_or(0);
    let bits_needed = if max_val == 0 {
        1
    } else {
        32 - max_val.leading_zeros()
    } as u8;

    output.push(bits_needed);

    let mut current: u64 = 0;
    let mut bits_in_current = 0;

    for &value in values {
        current |= (value as u64) << bits_in_current;
        bits_in_current += bits_needed as u32;

        while bits_in_current >= 8 {
            output.push(current as u8);
            current >>= 8;
            bits_in_current -= 8;
        }
    }

    if bits_in_current > 0 {
        output.push(current as u8);
    }
}

/// Decode bitpacked integers
pub fn bitpack_decode(input: &[u8], pos: &mut usize, count: usize) -> io::Result<Vec<u32>> {
    if *pos >= input.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "unexpected end of bitpack",
        ));
    }

    let bits_needed = input[*pos] as u32;
    *pos += 1;

    if bits_needed == 0 {
        return Ok(vec![0; count]);
    }

    let total_bits = count as u32 * bits_needed;
    let bytes_needed = ((total_bits + 7) / 8) as usize;

    if *pos + bytes_needed > input.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "not enough bytes for bitpack",
        ));
    }

    let mut values = Vec::with_capacity(count);
    let mut current: u64 = 0;
    let mut bits_available = 0;
    let mask = (1u64 << bits_needed) - 1;

    for _ in 0..count {
        while bits_available < bits_needed {
            if *pos < input.len() {
                current |= (input[*pos] as u64) << bits_available;
                *pos += 1;
            }
            bits_available += 8;
        }

        values.push((current & mask) as u32);
        current >>= bits_needed;
        bits_available -= bits_needed;
    }

    Ok(values)
}

/// Skip entry for block-level seeking
#[derive(Clone, Debug, Default)]
struct SkipEntry {
    max_docno: DocNo,
    block_offset: u64,
}

/// Writer for posting lists
pub struct PostingsWriter {
    /// Encoded blocks of the list under construction
    block_data: Vec<u8>,
    skip_entries: Vec<SkipEntry>,
    current_block: PostingBlock,
    /// Delta base carried across blocks within one list
    prev_docno: u32,
    /// Final output data, all posting lists concatenated
    data: Vec<u8>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self {
            block_data: Vec::new(),
            skip_entries: Vec::new(),
            current_block: PostingBlock::new(),
            prev_docno: 0,
            data: Vec::new(),
        }
    }

    /// Start writing a new posting list
    pub fn start_posting_list(&mut self) {
        self.block_data.clear();
        self.skip_entries.clear();
        self.current_block = PostingBlock::new();
        self.prev_docno = 0;
    }

    /// Add a posting; postings MUST arrive in ascending docno order.
    pub fn add_posting(&mut self, posting: Posting) {
        self.current_block.push(posting);

        if self.current_block.is_full() {
            self.flush_block();
        }
    }

    /// Finish the current posting list and return its metadata
    pub fn finish_posting_list(
        &mut self,
        doc_frequency: u32,
        total_term_frequency: u64,
    ) -> PostingListMeta {
        if !self.current_block.is_empty() {
            self.flush_block();
        }

        let offset = self.data.len() as u64;

        encode_vbyte(self.skip_entries.len() as u32, &mut self.data);
        for skip in &self.skip_entries {
            encode_vbyte(skip.max_docno.0, &mut self.data);
            self.data.extend_from_slice(&skip.block_offset.to_le_bytes());
        }
        self.data.extend_from_slice(&self.block_data);

        let length = self.data.len() as u64 - offset;

        PostingListMeta {
            offset,
            length,
            doc_frequency,
            total_term_frequency,
        }
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn flush_block(&mut self) {
        if self.current_block.is_empty() {
            return;
        }

        self.skip_entries.push(SkipEntry {
            max_docno: self.current_block.max_docno,
            block_offset: self.block_data.len() as u64,
        });

        encode_vbyte(self.current_block.len() as u32, &mut self.block_data);

        let mut deltas = Vec::with_capacity(self.current_block.len());
        let mut tfs = Vec::with_capacity(self.current_block.len());
        for posting in &self.current_block.postings {
            deltas.push(posting.docno.0 - self.prev_docno);
            self.prev_docno = posting.docno.0;
            tfs.push(posting.term_frequency);
        }
        bitpack_encode(&deltas, &mut self.block_data);
        bitpack_encode(&tfs, &mut self.block_data);

        // Positions: per posting, count followed by delta-vbyte values
        for posting in &self.current_block.postings {
            encode_vbyte(posting.positions.len() as u32, &mut self.block_data);
            let mut prev = 0u32;
            for &p in &posting.positions {
                encode_vbyte(p - prev, &mut self.block_data);
                prev = p;
            }
        }

        self.current_block = PostingBlock::new();
    }
}

impl Default for PostingsWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader over a postings file
pub struct PostingsReader {
    data: Vec<u8>,
}

impl PostingsReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get an iterator over postings for one term
    pub fn get_postings(&self, meta: &PostingListMeta) -> io::Result<PostingIterator<'_>> {
        let start = meta.offset as usize;
        let end = (meta.offset + meta.length) as usize;

        if end > self.data.len() || start > end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "posting list extends beyond data",
            ));
        }

        PostingIterator::new(&self.data[start..end])
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Iterator over the postings of one term
pub struct PostingIterator<'a> {
    data: &'a [u8],
    /// Position where blocks start (after skip entries)
    blocks_start: usize,
    pos: usize,
    block_count: usize,
    skip_entries: Vec<SkipEntry>,
    current_block_idx: usize,
    current_block: Vec<Posting>,
    block_pos: usize,
    last_docno: u32,
}

impl<'a> PostingIterator<'a> {
    fn new(data: &'a [u8]) -> io::Result<Self> {
        let mut pos = 0;
        let block_count = if data.is_empty() {
            0
        } else {
            decode_vbyte(data, &mut pos)? as usize
        };

        let mut skip_entries = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            let max_docno = decode_vbyte(data, &mut pos)?;
            if pos + 8 > data.len() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated skip entry",
                ));
            }
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&data[pos..pos + 8]);
            pos += 8;
            skip_entries.push(SkipEntry {
                max_docno: DocNo(max_docno),
                block_offset: u64::from_le_bytes(bytes),
            });
        }

        Ok(Self {
            data,
            blocks_start: pos,
            pos,
            block_count,
            skip_entries,
            current_block_idx: 0,
            current_block: Vec::new(),
            block_pos: 0,
            last_docno: 0,
        })
    }

    /// Advance to the first posting with docno >= target
    pub fn skip_to(&mut self, target: DocNo) -> Option<Posting> {
        // Jump over blocks whose max docno is below the target. Only valid
        // before the block has been entered, so check the loaded block first.
        if let Some(p) = self.current_block.get(self.block_pos) {
            if p.docno >= target {
                let posting = p.clone();
                self.block_pos += 1;
                return Some(posting);
            }
        }

        while self.block_pos >= self.current_block.len()
            && self.current_block_idx < self.skip_entries.len()
            && self.skip_entries[self.current_block_idx].max_docno < target
        {
            let skipped = self.current_block_idx;
            self.current_block_idx += 1;
            if self.current_block_idx < self.skip_entries.len() {
                self.pos = self.blocks_start
                    + self.skip_entries[self.current_block_idx].block_offset as usize;
                self.last_docno = self.skip_entries[skipped].max_docno.0;
            }
            self.current_block.clear();
            self.block_pos = 0;
        }

        for posting in self.by_ref() {
            if posting.docno >= target {
                return Some(posting);
            }
        }
        None
    }

    fn load_next_block(&mut self) -> bool {
        if self.current_block_idx >= self.block_count || self.pos >= self.data.len() {
            return false;
        }

        let count = match decode_vbyte(self.data, &mut self.pos) {
            Ok(c) => c as usize,
            Err(_) => return false,
        };
        if count == 0 {
            return false;
        }

        let deltas = match bitpack_decode(self.data, &mut self.pos, count) {
            Ok(d) => d,
            Err(_) => return false,
        };
        let tfs = match bitpack_decode(self.data, &mut self.pos, count) {
            Ok(t) => t,
            Err(_) => return false,
        };

        self.current_block.clear();
        let mut docno = self.last_docno;
        for i in 0..count {
            docno += deltas[i];
            self.current_block.push(Posting::new(DocNo(docno), tfs[i]));
        }
        self.last_docno = docno;

        // Positions stream
        for posting in self.current_block.iter_mut() {
            let npos = match decode_vbyte(self.data, &mut self.pos) {
                Ok(n) => n as usize,
                Err(_) => return false,
            };
            let mut prev = 0u32;
            let mut positions = Vec::with_capacity(npos);
            for _ in 0..npos {
                match decode_vbyte(self.data, &mut self.pos) {
                    Ok(delta) => {
                        prev += delta;
                        positions.push(prev);
                    }
                    Err(_) => return false,
                }
            }
            posting.positions = positions;
        }

        self.block_pos = 0;
        self.current_block_idx += 1;
        true
    }
}

impl<'a> Iterator for PostingIterator<'a> {
    type Item = Posting;

    fn next(&mut self) -> Option<Self::Item> {
        if self.block_pos >= self.current_block.len() && !self.load_next_block() {
            return None;
        }

        let result = self.current_block.get(self.block_pos).cloned();
        self.block_pos += 1;
        result
    }
}
