// src/system/os.rs

//! Operating-system capability.
//!
//! The core only needs a filesystem able to tell whether a path exists and to
//! mount a directory as a tree of named files. Everything else about the OS is
//! passed opaquely to command and service factories.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Capability bundle handed to commands and services.
pub trait OperatingSystem {
    /// The filesystem of this operating system.
    fn filesystem(&self) -> Rc<dyn Filesystem>;
}

impl fmt::Debug for dyn OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatingSystem").finish_non_exhaustive()
    }
}

/// Lookup and mounting of directories.
pub trait Filesystem {
    /// Whether `path` exists.
    fn contains(&self, path: &Path) -> bool;

    /// Mounts the directory at `path` as a tree of files.
    fn mount(&self, path: &Path) -> io::Result<Rc<dyn Directory>>;
}

/// A mounted directory whose files are addressed by name.
pub trait Directory {
    /// Whether a file called `name` exists.
    fn contains(&self, name: &str) -> bool;
    /// Reads the whole content of file `name`.
    fn read(&self, name: &str) -> io::Result<String>;
}

// --- Local implementation ---

/// The operating system the process runs on.
#[derive(Debug, Default)]
pub struct LocalOperatingSystem {
    filesystem: Rc<LocalFilesystem>,
}

impl LocalOperatingSystem {
    /// The local operating system with its real filesystem.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OperatingSystem for LocalOperatingSystem {
    fn filesystem(&self) -> Rc<dyn Filesystem> {
        self.filesystem.clone()
    }
}

/// The real filesystem.
#[derive(Debug, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn contains(&self, path: &Path) -> bool {
        path.exists()
    }

    fn mount(&self, path: &Path) -> io::Result<Rc<dyn Directory>> {
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not a directory", path.display()),
            ));
        }
        Ok(Rc::new(LocalDirectory {
            root: dunce::simplified(path).to_path_buf(),
        }))
    }
}

/// A real directory, files being read on demand.
#[derive(Debug)]
pub struct LocalDirectory {
    root: PathBuf,
}

impl Directory for LocalDirectory {
    fn contains(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }

    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(name))
    }
}

// --- In-memory implementation ---

/// An operating system whose filesystem only holds the directories given to it.
#[derive(Debug, Default)]
pub struct InMemoryOperatingSystem {
    filesystem: Rc<InMemoryFilesystem>,
}

impl InMemoryOperatingSystem {
    /// An operating system with an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// An operating system backed by `filesystem`.
    pub fn with_filesystem(filesystem: InMemoryFilesystem) -> Self {
        Self {
            filesystem: Rc::new(filesystem),
        }
    }
}

impl OperatingSystem for InMemoryOperatingSystem {
    fn filesystem(&self) -> Rc<dyn Filesystem> {
        self.filesystem.clone()
    }
}

/// A filesystem made of the directories registered on it.
#[derive(Debug, Default)]
pub struct InMemoryFilesystem {
    directories: BTreeMap<PathBuf, Rc<InMemoryDirectory>>,
}

impl InMemoryFilesystem {
    /// An empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `directory` mountable at `path`.
    pub fn with_directory(mut self, path: impl Into<PathBuf>, directory: InMemoryDirectory) -> Self {
        self.directories.insert(path.into(), Rc::new(directory));
        self
    }
}

impl Filesystem for InMemoryFilesystem {
    fn contains(&self, path: &Path) -> bool {
        self.directories.contains_key(path)
    }

    fn mount(&self, path: &Path) -> io::Result<Rc<dyn Directory>> {
        match self.directories.get(path) {
            Some(directory) => Ok(directory.clone()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not mounted", path.display()),
            )),
        }
    }
}

/// A directory of named in-memory files.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    files: RefCell<BTreeMap<String, String>>,
}

impl InMemoryDirectory {
    /// An empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, builder style.
    pub fn with_file(self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.add(name, content);
        self
    }

    /// Adds or replaces the file `name`.
    pub fn add(&self, name: impl Into<String>, content: impl Into<String>) {
        self.files.borrow_mut().insert(name.into(), content.into());
    }
}

impl Directory for InMemoryDirectory {
    fn contains(&self, name: &str) -> bool {
        self.files.borrow().contains_key(name)
    }

    fn read(&self, name: &str) -> io::Result<String> {
        self.files.borrow().get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no file named '{name}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_filesystem_mounts_directory() {
        // --- Setup ---
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "FOO=bar").unwrap();
        let os = LocalOperatingSystem::new();

        // --- Execute ---
        let filesystem = os.filesystem();
        let mounted = filesystem.mount(dir.path()).unwrap();

        // --- Assert ---
        assert!(filesystem.contains(dir.path()));
        assert!(mounted.contains(".env"));
        assert!(!mounted.contains("missing"));
        assert_eq!(mounted.read(".env").unwrap(), "FOO=bar");
    }

    #[test]
    fn test_local_filesystem_refuses_to_mount_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "content").unwrap();

        let result = LocalFilesystem.mount(&file);
        assert!(result.is_err());
        assert!(!LocalFilesystem.contains(&dir.path().join("nowhere")));
    }

    #[test]
    fn test_in_memory_filesystem() {
        let filesystem = InMemoryFilesystem::new().with_directory(
            "/somewhere",
            InMemoryDirectory::new().with_file(".env", "A=b"),
        );

        assert!(filesystem.contains(Path::new("/somewhere")));
        assert!(!filesystem.contains(Path::new("/elsewhere")));
        assert!(filesystem.mount(Path::new("/elsewhere")).is_err());

        let mounted = filesystem.mount(Path::new("/somewhere")).unwrap();
        assert_eq!(mounted.read(".env").unwrap(), "A=b");
        assert_eq!(
            mounted.read("other").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
