//! Record source
//!
//! Turns a comma-separated input stream into [`UpdateRecord`]s, one row at a
//! time. There is no header row; the first line is data. A bad row is handed
//! back as an error and reading carries on with the next one.

use limitsync_common::{RecordError, UpdateRecord};
use std::fs::File;
use std::io;
use std::path::Path;

/// Lazily reads update records from delimited text
pub struct RecordSource<R> {
    reader: csv::Reader<R>,
    row: csv::StringRecord,
    finished: bool,
}

impl RecordSource<File> {
    /// Open an input file
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(file))
    }
}

impl<R: io::Read> RecordSource<R> {
    pub fn from_reader(reader: R) -> Self {
        // Field counts are checked per row by UpdateRecord, not by the reader
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        Self {
            reader,
            row: csv::StringRecord::new(),
            finished: false,
        }
    }

    fn read_next(&mut self) -> Option<Result<UpdateRecord, RecordError>> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.row) {
            Ok(false) => {
                self.finished = true;
                None
            }
            Ok(true) => {
                let line = self.row.position().map(|p| p.line()).unwrap_or_default();
                Some(UpdateRecord::from_fields(line, self.row.iter()))
            }
            Err(e) => Some(Err(self.classify(e))),
        }
    }

    fn classify(&mut self, err: csv::Error) -> RecordError {
        let line = err.position().map(|p| p.line()).unwrap_or_default();

        match err.into_kind() {
            csv::ErrorKind::Io(e) => {
                // A failed read leaves nothing to resume from
                self.finished = true;
                RecordError::Io(e.to_string())
            }
            csv::ErrorKind::Utf8 { err, .. } => RecordError::Malformed {
                line,
                message: format!("invalid UTF-8 in field {}", err.field() + 1),
            },
            other => RecordError::Malformed {
                line,
                message: format!("{:?}", other),
            },
        }
    }
}

impl<R: io::Read> Iterator for RecordSource<R> {
    type Item = Result<UpdateRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};

    fn read_all(input: &str) -> Vec<Result<UpdateRecord, RecordError>> {
        RecordSource::from_reader(input.as_bytes()).collect()
    }

    #[test]
    fn test_reads_rows_in_order() {
        let results = read_all("checkout,prod,500m,256Mi\nbilling,prod,1,1Gi\n");
        assert_eq!(results.len(), 2);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.workload_name, "checkout");
        assert_eq!(first.namespace, "prod");
        assert_eq!(first.cpu_limit, "500m");
        assert_eq!(first.memory_limit, "256Mi");
        assert_eq!(first.line, 1);

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.workload_name, "billing");
        assert_eq!(second.line, 2);
    }

    #[test]
    fn test_first_row_is_data() {
        let results = read_all("name,namespace,cpu,memory\n");
        let record = results[0].as_ref().unwrap();
        assert_eq!(record.workload_name, "name");
    }

    #[test]
    fn test_wrong_field_count_does_not_stop_reading() {
        let results = read_all("billing,prod,500m\na,ns,1,1Gi,extra\ncheckout,prod,500m,256Mi\n");
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[0],
            Err(RecordError::WrongFieldCount { line: 1, found: 3, .. })
        ));
        assert!(matches!(
            results[1],
            Err(RecordError::WrongFieldCount { line: 2, found: 5, .. })
        ));
        assert_eq!(results[2].as_ref().unwrap().workload_name, "checkout");
    }

    #[test]
    fn test_last_row_without_newline() {
        let results = read_all("a,ns,1,1Gi");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let results = read_all("a,ns,1,1Gi\n\nb,ns,2,2Gi\n");
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].as_ref().unwrap().line, 3);
    }

    #[test]
    fn test_quoted_fields() {
        let results = read_all("\"api\",\"prod\",\"1.5\",\"2Gi\"\n");
        let record = results[0].as_ref().unwrap();
        assert_eq!(record.workload_name, "api");
        assert_eq!(record.cpu_limit, "1.5");
    }

    #[test]
    fn test_invalid_utf8_is_per_row() {
        let mut input = b"a,ns,1,1Gi\n".to_vec();
        input.extend_from_slice(b"b\xff,ns,1,1Gi\n");
        input.extend_from_slice(b"c,ns,1,1Gi\n");

        let results: Vec<_> = RecordSource::from_reader(Cursor::new(input)).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(RecordError::Malformed { line: 2, .. })));
        assert_eq!(results[2].as_ref().unwrap().workload_name, "c");
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("").is_empty());
    }

    /// Hands out its data, then fails every read after that
    struct BrokenReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_io_error_ends_the_sequence() {
        let reader = BrokenReader {
            data: Cursor::new(b"a,ns,1,1Gi\n".to_vec()),
        };
        let results: Vec<_> = RecordSource::from_reader(reader).collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(&results[1], Err(RecordError::Io(msg)) if msg.contains("device went away")));
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "checkout,prod,500m,256Mi").unwrap();

        let results: Vec<_> = RecordSource::open(file.path()).unwrap().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().target().name, "checkout");
    }

    #[test]
    fn test_open_missing_file() {
        assert!(RecordSource::open("/nonexistent/metrics.csv").is_err());
    }
}
