// Read input for clustering using bio::io::{fasta, fastq}
//
// The format is sniffed from the first byte ('>' FASTA, '@' FASTQ). Files
// ending in .gz are decompressed on the fly. Sequences are upper-cased and
// numbered in input order.

use crate::utils::xzopen;
use bio::io::{fasta, fastq};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// One read to seed a cluster from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceWorkItem {
    /// Position in the input, starting at 0
    pub idx: usize,
    pub id: String,
    pub seq: String,
}

impl SequenceWorkItem {
    pub fn new(idx: usize, id: impl Into<String>, seq: impl Into<String>) -> Self {
        SequenceWorkItem {
            idx,
            id: id.into(),
            seq: seq.into(),
        }
    }
}

enum Records {
    Fasta(fasta::Records<BufReader<Box<dyn Read>>>),
    Fastq(fastq::Records<BufReader<Box<dyn Read>>>),
    Empty,
}

/// FASTA/FASTQ reader yielding `SequenceWorkItem`s
pub struct SeqReader {
    records: Records,
    next_idx: usize,
}

impl SeqReader {
    /// Open a read file; "-" reads stdin
    pub fn new(path: &Path) -> io::Result<Self> {
        const BUFFER_SIZE: usize = 4 * 1024 * 1024;

        let input = BufReader::with_capacity(BUFFER_SIZE, xzopen(path)?);
        Self::from_reader(input)
    }

    pub fn from_reader<R: Read + 'static>(input: R) -> io::Result<Self> {
        let mut buffered = BufReader::new(input);
        let first = buffered.fill_buf()?.first().copied();
        let input: Box<dyn Read> = Box::new(buffered);

        let records = match first {
            Some(b'>') => {
                log::debug!("Reading reads as FASTA");
                Records::Fasta(fasta::Reader::new(input).records())
            }
            Some(b'@') => {
                log::debug!("Reading reads as FASTQ");
                Records::Fastq(fastq::Reader::new(input).records())
            }
            None => Records::Empty,
            Some(other) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "unrecognized read format: expected '>' or '@', found '{}'",
                        other.escape_ascii()
                    ),
                ));
            }
        };

        Ok(SeqReader {
            records,
            next_idx: 0,
        })
    }

    fn next_record(&mut self) -> Option<io::Result<(String, Vec<u8>)>> {
        match &mut self.records {
            Records::Fasta(records) => records.next().map(|r| {
                r.map(|record| (record.id().to_string(), record.seq().to_vec()))
            }),
            Records::Fastq(records) => records.next().map(|r| {
                r.map(|record| (record.id().to_string(), record.seq().to_vec()))
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }),
            Records::Empty => None,
        }
    }

    /// Read up to `batch_size` items; an empty batch means end of input
    pub fn read_batch(&mut self, batch_size: usize) -> io::Result<Vec<SequenceWorkItem>> {
        let mut batch = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.next() {
                Some(item) => batch.push(item?),
                None => break,
            }
        }
        Ok(batch)
    }
}

impl Iterator for SeqReader {
    type Item = io::Result<SequenceWorkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.next_record()?;
        Some(record.map(|(id, seq)| {
            let item = SequenceWorkItem {
                idx: self.next_idx,
                id,
                seq: String::from_utf8_lossy(&seq).to_ascii_uppercase(),
            };
            self.next_idx += 1;
            item
        }))
    }
}
