//! Reader for music catalog (`.cat`) files.
//!
//! A catalog starts with a table of 8 byte entry headers, each a little
//! endian data offset and data length. The offset of the first entry is
//! also the size of that table. At the data offset of an entry is a length
//! prefixed name followed by the song data.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

const ENTRY_HEADER_LEN: u32 = 8;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("catalog header is truncated")]
    TruncatedHeader,
    #[error("entry {index} requested, the catalog has {count} entries")]
    EntryOutOfRange { index: usize, count: usize },
    #[error("catalog entry {index} is truncated")]
    Truncated { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    /// Offset of the name length byte.
    pub offset: u32,
    /// Length of the song data, the name excluded.
    pub length: u32,
}

impl CatalogEntry {
    fn data_offset(&self) -> u64 {
        self.offset as u64 + 1 + self.name.chars().count() as u64
    }
}

pub struct Catalog<R: Read + Seek> {
    reader: R,
    entries: Vec<CatalogEntry>,
}

impl Catalog<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Catalog<BufReader<File>>, CatalogError> {
        let file = File::open(path)?;
        Catalog::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> Catalog<R> {
    /// Reads the entry table and the entry names.
    pub fn new(mut reader: R) -> Result<Catalog<R>, CatalogError> {
        reader.seek(SeekFrom::Start(0))?;
        let first_offset = reader
            .read_u32::<LittleEndian>()
            .map_err(eof_as(CatalogError::TruncatedHeader))?;
        let count = (first_offset / ENTRY_HEADER_LEN) as usize;

        let mut headers = Vec::with_capacity(count);
        reader.seek(SeekFrom::Start(0))?;
        for _ in 0..count {
            let offset = reader
                .read_u32::<LittleEndian>()
                .map_err(eof_as(CatalogError::TruncatedHeader))?;
            let length = reader
                .read_u32::<LittleEndian>()
                .map_err(eof_as(CatalogError::TruncatedHeader))?;
            headers.push((offset, length));
        }

        let mut entries = Vec::with_capacity(count);
        for (index, (offset, length)) in headers.into_iter().enumerate() {
            reader.seek(SeekFrom::Start(offset as u64))?;
            let name_len = reader
                .read_u8()
                .map_err(eof_as(CatalogError::Truncated { index }))?;
            let mut name = vec![0; name_len as usize];
            reader
                .read_exact(&mut name)
                .map_err(eof_as(CatalogError::Truncated { index }))?;
            entries.push(CatalogEntry {
                // names are Latin-1
                name: name.iter().map(|&b| b as char).collect(),
                offset,
                length,
            });
        }
        log::debug!("catalog with {} entries", entries.len());

        Ok(Catalog { reader, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Result<&CatalogEntry, CatalogError> {
        self.entries.get(index).ok_or(CatalogError::EntryOutOfRange {
            index,
            count: self.entries.len(),
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Reads the song data of entry `index`.
    pub fn read_data(&mut self, index: usize) -> Result<Vec<u8>, CatalogError> {
        let entry = self.entry(index)?;
        let (start, length) = (entry.data_offset(), entry.length);

        self.reader.seek(SeekFrom::Start(start))?;
        let mut data = Vec::new();
        (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut data)?;
        if data.len() != length as usize {
            return Err(CatalogError::Truncated { index });
        }
        Ok(data)
    }
}

/// Song data of entry `index` in the catalog file at `path`.
pub fn load_entry(path: &Path, index: usize) -> Result<Vec<u8>, CatalogError> {
    Catalog::open(path)?.read_data(index)
}

fn eof_as(err: CatalogError) -> impl FnOnce(io::Error) -> CatalogError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            err
        } else {
            CatalogError::Io(e)
        }
    }
}

#[cfg(test)]
#[path = "./catalog_test.rs"]
mod catalog_test;
