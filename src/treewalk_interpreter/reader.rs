use std::collections::HashMap;
use std::{fs, io};

/// Where `import` gets module source from.
pub trait SourceReader {
    fn read(&self, path: &str) -> io::Result<String>;
}

/// Reads modules from disk. Relative paths resolve against the process's
/// working directory, not the importing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Serves modules from memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    files: HashMap<String, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        MemoryReader::default()
    }

    pub fn with_file(mut self, path: &str, source: &str) -> Self {
        self.files.insert(path.to_owned(), source.to_owned());
        self
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &str) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no module at {}", path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reader() {
        let reader = MemoryReader::new().with_file("lib.plgd", "a = 1;");
        assert_eq!(reader.read("lib.plgd").unwrap(), "a = 1;");
        assert_eq!(
            reader.read("other.plgd").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_fs_reader_missing_file() {
        assert!(FsReader.read("does/not/exist.plgd").is_err());
    }
}
