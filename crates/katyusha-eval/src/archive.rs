//! Named-array containers holding network parameters.
//!
//! The on-disk format is NumPy's `.npz`: a zip file with one `<name>.npy`
//! entry per array, stored or deflated.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::EvalError;
use crate::npy::NpyArray;

const ENTRY_SUFFIX: &str = ".npy";

/// Largest buffer reserved up front from an entry's declared size.
const PREALLOC_LIMIT: u64 = 1 << 20;

/// Source of named arrays for the loader.
pub trait WeightArchive {
    /// Fetch `name`, `Ok(None)` if the archive has no such array.
    fn array(&mut self, name: &str) -> Result<Option<NpyArray>, EvalError>;
}

/// Arrays held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryArchive {
    arrays: BTreeMap<String, NpyArray>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, array: NpyArray) {
        self.arrays.insert(name.into(), array);
    }

    /// Store `values` as a little-endian `f32` array of the given shape.
    pub fn insert_f32(
        &mut self,
        name: impl Into<String>,
        shape: Vec<usize>,
        values: &[f32],
    ) -> Result<(), EvalError> {
        let name = name.into();
        let array = NpyArray::from_f32(&name, shape, values)?;
        self.arrays.insert(name, array);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<NpyArray> {
        self.arrays.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&NpyArray> {
        self.arrays.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Write every array into a new `.npz` file at `path`.
    pub fn save_npz(&self, path: impl AsRef<Path>, compress: bool) -> Result<(), EvalError> {
        let mut writer = NpzWriter::create(path)?.compressed(compress);
        for (name, array) in &self.arrays {
            writer.add(name, array)?;
        }
        writer.finish()?;
        Ok(())
    }
}

impl WeightArchive for MemoryArchive {
    fn array(&mut self, name: &str) -> Result<Option<NpyArray>, EvalError> {
        Ok(self.arrays.get(name).cloned())
    }
}

/// A `.npz` file opened for reading.
pub struct NpzArchive<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl NpzArchive<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EvalError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let archive = Self::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), entries = archive.zip.len(), "opened npz archive");
        Ok(archive)
    }
}

impl<R: Read + Seek> NpzArchive<R> {
    pub fn from_reader(reader: R) -> Result<Self, EvalError> {
        Ok(Self { zip: ZipArchive::new(reader)? })
    }

    /// Array names, without the `.npy` suffix.
    pub fn names(&self) -> Vec<String> {
        self.zip
            .file_names()
            .filter_map(|entry| entry.strip_suffix(ENTRY_SUFFIX))
            .map(str::to_string)
            .collect()
    }
}

impl<R: Read + Seek> WeightArchive for NpzArchive<R> {
    fn array(&mut self, name: &str) -> Result<Option<NpyArray>, EvalError> {
        let mut entry = match self.zip.by_name(&format!("{name}{ENTRY_SUFFIX}")) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut bytes = Vec::with_capacity(entry.size().min(PREALLOC_LIMIT) as usize);
        entry.read_to_end(&mut bytes)?;
        let array = NpyArray::parse(name, &bytes)?;
        debug!(
            name,
            shape = ?array.shape(),
            descr = %array.dtype().descr(),
            compressed = entry.compression() != CompressionMethod::Stored,
            "read array"
        );
        Ok(Some(array))
    }
}

/// Builds a `.npz` file one array at a time.
pub struct NpzWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl NpzWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, EvalError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Seek> NpzWriter<W> {
    /// Entries are stored uncompressed, like `numpy.savez`.
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        }
    }

    /// Deflate entries, like `numpy.savez_compressed`.
    pub fn compressed(mut self, compress: bool) -> Self {
        let method = if compress { CompressionMethod::Deflated } else { CompressionMethod::Stored };
        self.options = self.options.compression_method(method);
        self
    }

    pub fn add(&mut self, name: &str, array: &NpyArray) -> Result<(), EvalError> {
        self.zip.start_file(format!("{name}{ENTRY_SUFFIX}"), self.options)?;
        array.write_to(&mut self.zip)?;
        Ok(())
    }

    pub fn add_f32(&mut self, name: &str, shape: Vec<usize>, values: &[f32]) -> Result<(), EvalError> {
        self.add(name, &NpyArray::from_f32(name, shape, values)?)
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W, EvalError> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::npy::Dtype;

    fn sample() -> MemoryArchive {
        let mut archive = MemoryArchive::new();
        archive.insert_f32("a", vec![2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        archive.insert_f32("b", vec![3], &[0.5, 0.25, 0.125]).unwrap();
        archive
    }

    fn to_npz(archive: &MemoryArchive, compress: bool) -> Vec<u8> {
        let mut writer = NpzWriter::new(Cursor::new(Vec::new())).compressed(compress);
        for name in archive.names() {
            writer.add(name, archive.get(name).unwrap()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn memory_archive_lookup() {
        let mut archive = sample();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.array("a").unwrap().unwrap().shape(), &[2, 2]);
        assert!(archive.array("missing").unwrap().is_none());
        assert!(archive.insert_f32("bad", vec![2, 2], &[1.0]).is_err());
    }

    #[test]
    fn npz_roundtrip_stored_and_deflated() {
        let original = sample();
        for compress in [false, true] {
            let bytes = to_npz(&original, compress);
            let mut npz = NpzArchive::from_reader(Cursor::new(bytes)).unwrap();
            let mut names = npz.names();
            names.sort();
            assert_eq!(names, vec!["a", "b"]);
            for name in ["a", "b"] {
                assert_eq!(npz.array(name).unwrap().as_ref(), original.get(name));
            }
            assert!(npz.array("c").unwrap().is_none());
        }
    }

    #[test]
    fn npz_keeps_foreign_dtypes() {
        let mut archive = MemoryArchive::new();
        let doubles = NpyArray::new(
            "d",
            vec![1],
            Dtype { endian: crate::npy::Endian::Little, kind: 'f', width: 8 },
            2.0f64.to_le_bytes().to_vec(),
        )
        .unwrap();
        archive.insert("d", doubles);
        let mut npz = NpzArchive::from_reader(Cursor::new(to_npz(&archive, false))).unwrap();
        let array = npz.array("d").unwrap().unwrap();
        assert!(matches!(array.to_f32("d"), Err(EvalError::UnsupportedElementWidth { .. })));
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = NpzArchive::from_reader(Cursor::new(b"not a zip".to_vec())).err().unwrap();
        assert!(matches!(err, EvalError::Zip { .. }));
    }

    #[test]
    fn save_and_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrays.npz");
        sample().save_npz(&path, true).unwrap();
        let mut npz = NpzArchive::open(&path).unwrap();
        assert_eq!(npz.array("b").unwrap().unwrap().to_f32("b").unwrap(), vec![0.5, 0.25, 0.125]);
    }
}
