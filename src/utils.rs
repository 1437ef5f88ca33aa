use flate2::read::MultiGzDecoder;
use std::fs::OpenOptions;
use std::io::{self, BufReader, Read, stdin};
use std::path::Path;

#[path = "utils_test.rs"]
mod utils_test;

#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        other => other,
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Reverse complement of a DNA string (non-ACGT symbols are kept as-is)
pub fn reverse_complement_str(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}

/// Open a file for reading; "-" is stdin
pub fn xopen(path: &Path) -> Result<Box<dyn Read>, io::Error> {
    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::new(stdin())));
    }

    let file = OpenOptions::new().read(true).open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

/// Like `xopen`, transparently decompressing `.gz` files
pub fn xzopen(path: &Path) -> Result<Box<dyn Read>, io::Error> {
    let input = xopen(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Ok(Box::new(MultiGzDecoder::new(input)))
    } else {
        Ok(input)
    }
}
