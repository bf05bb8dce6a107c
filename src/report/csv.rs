use std::fs::File;
use std::path::Path;

/// `csv::Writer` that counts data rows and checks their width against the header.
pub struct CsvWriter {
    inner: csv::Writer<File>,
    n_cols: usize,
    rows: usize,
}

impl CsvWriter {
    pub fn create(path: &Path, header: &[&str]) -> std::io::Result<Self> {
        let mut inner = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        inner.write_record(header)?;
        Ok(Self {
            inner,
            n_cols: header.len(),
            rows: 0,
        })
    }

    pub fn write_row<I, S>(&mut self, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let record: csv::ByteRecord = fields.into_iter().collect();
        debug_assert_eq!(record.len(), self.n_cols);
        self.inner.write_byte_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes and returns the number of data rows written.
    pub fn finish(mut self) -> std::io::Result<usize> {
        self.inner.flush()?;
        Ok(self.rows)
    }
}
