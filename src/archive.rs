use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

/// A thin, ordered append-only writer over a compressed container. Paths
/// are fixed: `dump/schema.sql`, `dump/sequences.sql`,
/// `dump/data/<table>.csv`. Writing a duplicate path is a programming
/// error, not a recoverable condition, so it surfaces as
/// `ArchiveError::DuplicatePath` rather than being silently overwritten.
pub struct ArchiveWriter {
    zip: ZipWriter<File>,
    written_paths: HashSet<String>,
}

impl ArchiveWriter {
    pub fn create(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::create(path)?;
        Ok(ArchiveWriter {
            zip: ZipWriter::new(file),
            written_paths: HashSet::new(),
        })
    }

    pub fn write_schema(&mut self, sql: &[u8]) -> Result<(), ArchiveError> {
        self.write_entry("dump/schema.sql", sql)
    }

    pub fn write_sequences(&mut self, sql: &[u8]) -> Result<(), ArchiveError> {
        self.write_entry("dump/sequences.sql", sql)
    }

    pub fn write_table_csv(&mut self, table: &str, csv: &[u8]) -> Result<(), ArchiveError> {
        self.write_entry(&format!("dump/data/{table}.csv"), csv)
    }

    fn write_entry(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        if !self.written_paths.insert(path.to_string()) {
            return Err(ArchiveError::DuplicatePath(path.to_string()));
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(path, options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), ArchiveError> {
        self.zip.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_entries_in_fixed_path_layout_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.zip");

        let mut writer = ArchiveWriter::create(&path).unwrap();
        writer.write_schema(b"CREATE TABLE groups (id int);").unwrap();
        writer.write_sequences(b"SELECT setval('groups_id_seq', 2);").unwrap();
        writer.write_table_csv("groups", b"id,name\n1,Admin\n").unwrap();
        writer.finish().unwrap();

        let file = File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();

        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "dump/data/groups.csv".to_string(),
                "dump/schema.sql".to_string(),
                "dump/sequences.sql".to_string(),
            ]
        );

        let mut csv = String::new();
        archive
            .by_name("dump/data/groups.csv")
            .unwrap()
            .read_to_string(&mut csv)
            .unwrap();
        assert_eq!(csv, "id,name\n1,Admin\n");
    }

    #[test]
    fn duplicate_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.zip");
        let mut writer = ArchiveWriter::create(&path).unwrap();
        writer.write_table_csv("groups", b"id\n").unwrap();
        let err = writer.write_table_csv("groups", b"id\n").unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicatePath(p) if p == "dump/data/groups.csv"));
    }
}
