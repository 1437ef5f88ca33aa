// Cluster file reading and writing
//
// One record per line:
//
//   <cluster-id> TAB <cluster-size> TAB <sequence> TAB <lower> TAB <upper>
//
// Records of one cluster are written consecutively, so the reader groups
// adjacent lines sharing an id.

use crate::error::ClusterError;
use crate::index::Interval;
use std::fmt;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub cluster_id: String,
    pub cluster_size: usize,
    pub sequence: String,
    pub interval: Interval,
}

pub type ClusterVector = Vec<ClusterRecord>;

impl ClusterRecord {
    /// Parse one line (without its terminator). `line_no` is used in errors.
    pub fn parse(line: &str, line_no: usize) -> Result<Self, ClusterError> {
        let malformed = |reason: String| ClusterError::MalformedRecord {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 5 {
            return Err(malformed(format!(
                "expected 5 tab-separated fields, found {}",
                fields.len()
            )));
        }

        let cluster_size = fields[1]
            .parse::<usize>()
            .map_err(|e| malformed(format!("bad cluster size '{}': {}", fields[1], e)))?;
        let lower = fields[3]
            .parse::<i64>()
            .map_err(|e| malformed(format!("bad interval lower '{}': {}", fields[3], e)))?;
        let upper = fields[4]
            .parse::<i64>()
            .map_err(|e| malformed(format!("bad interval upper '{}': {}", fields[4], e)))?;

        if fields[0].is_empty() {
            return Err(malformed("empty cluster id".to_string()));
        }

        Ok(ClusterRecord {
            cluster_id: fields[0].to_string(),
            cluster_size,
            sequence: fields[2].to_string(),
            interval: Interval::new(lower, upper),
        })
    }
}

impl fmt::Display for ClusterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.cluster_id,
            self.cluster_size,
            self.sequence,
            self.interval.lower,
            self.interval.upper
        )
    }
}

/// Reads a cluster file one cluster at a time
pub struct ClusterReader<R: BufRead> {
    reader: R,
    line_no: usize,
    // first record of the next cluster, read while closing the previous one
    pending: Option<ClusterRecord>,
}

impl<R: BufRead> ClusterReader<R> {
    pub fn new(reader: R) -> Self {
        ClusterReader {
            reader,
            line_no: 0,
            pending: None,
        }
    }

    /// Next group of records sharing a cluster id, or `None` at end of input.
    /// Blank lines are skipped.
    pub fn read_cluster(&mut self) -> Result<Option<ClusterVector>, ClusterError> {
        let mut cluster: ClusterVector = self.pending.take().into_iter().collect();
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            self.line_no += 1;

            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.trim().is_empty() {
                continue;
            }

            let record = ClusterRecord::parse(trimmed, self.line_no)?;
            if let Some(first) = cluster.first() {
                if first.cluster_id != record.cluster_id {
                    self.pending = Some(record);
                    break;
                }
            }
            cluster.push(record);
        }

        Ok(if cluster.is_empty() {
            None
        } else {
            Some(cluster)
        })
    }
}

impl<R: BufRead> Iterator for ClusterReader<R> {
    type Item = Result<ClusterVector, ClusterError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_cluster().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_and_display_agree() {
        let line = "cluster-3\t2\tACGTAC\t5\t6";
        let record = ClusterRecord::parse(line, 1).unwrap();
        assert_eq!(record.cluster_id, "cluster-3");
        assert_eq!(record.cluster_size, 2);
        assert_eq!(record.sequence, "ACGTAC");
        assert_eq!(record.interval, Interval::new(5, 6));
        assert_eq!(record.to_string(), line);
    }

    #[test]
    fn test_parse_invalid_interval() {
        let record = ClusterRecord::parse("c\t1\tACGT\t0\t-1", 1).unwrap();
        assert!(!record.interval.is_valid());
    }

    #[test]
    fn test_parse_errors_carry_line_number() {
        for bad in ["c\t1\tACGT\t0", "c\tx\tACGT\t0\t1", "c\t1\tACGT\ta\t1", "\t1\tACGT\t0\t1"] {
            match ClusterRecord::parse(bad, 7) {
                Err(ClusterError::MalformedRecord { line, .. }) => assert_eq!(line, 7),
                other => panic!("expected MalformedRecord for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_groups_consecutive_records() {
        let input = "a\t2\tAAAA\t1\t1\n\
                     a\t2\tCCCC\t2\t2\n\
                     \n\
                     b\t1\tGGGG\t3\t3\r\n\
                     c\t1\tTTTT\t4\t4";
        let reader = ClusterReader::new(Cursor::new(input));
        let clusters: Vec<ClusterVector> = reader.map(|c| c.unwrap()).collect();

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1][0].sequence, "GGGG");
        assert_eq!(clusters[2][0].cluster_id, "c");
    }

    #[test]
    fn test_empty_input() {
        let mut reader = ClusterReader::new(Cursor::new(""));
        assert!(reader.read_cluster().unwrap().is_none());
    }

    #[test]
    fn test_error_reports_physical_line() {
        let mut reader = ClusterReader::new(Cursor::new("a\t1\tAAAA\t1\t1\n\nbroken\n"));
        match reader.read_cluster() {
            Err(ClusterError::MalformedRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }
}
