pub mod seq_reader;

pub use seq_reader::{SeqReader, SequenceWorkItem};
