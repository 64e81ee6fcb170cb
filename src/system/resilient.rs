// src/system/resilient.rs

//! An [`OperatingSystem`] decorator that retries transient filesystem failures.

use std::io::{self, ErrorKind};
use std::path::Path;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use super::os::{Directory, Filesystem, OperatingSystem};
use crate::constants::{RESILIENT_ATTEMPTS, RESILIENT_BACKOFF_MS};

/// Wraps an operating system so that mounting directories and reading files
/// survive `Interrupted`, `WouldBlock` and `TimedOut` errors.
#[derive(Debug)]
pub struct ResilientOperatingSystem {
    inner: Rc<dyn OperatingSystem>,
}

impl ResilientOperatingSystem {
    /// Decorates `inner`.
    pub fn new(inner: Rc<dyn OperatingSystem>) -> Self {
        Self { inner }
    }
}

impl OperatingSystem for ResilientOperatingSystem {
    fn filesystem(&self) -> Rc<dyn Filesystem> {
        Rc::new(ResilientFilesystem {
            inner: self.inner.filesystem(),
        })
    }
}

struct ResilientFilesystem {
    inner: Rc<dyn Filesystem>,
}

impl Filesystem for ResilientFilesystem {
    fn contains(&self, path: &Path) -> bool {
        self.inner.contains(path)
    }

    fn mount(&self, path: &Path) -> io::Result<Rc<dyn Directory>> {
        let directory = retry("mount", || self.inner.mount(path))?;
        Ok(Rc::new(ResilientDirectory { inner: directory }))
    }
}

struct ResilientDirectory {
    inner: Rc<dyn Directory>,
}

impl Directory for ResilientDirectory {
    fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    fn read(&self, name: &str) -> io::Result<String> {
        retry("read", || self.inner.read(name))
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

fn retry<T>(operation: &str, mut attempt: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut tries = 1;
    loop {
        match attempt() {
            Err(e) if is_transient(&e) && tries < RESILIENT_ATTEMPTS => {
                log::debug!(
                    "Transient failure on {} (attempt {}/{}): {}",
                    operation,
                    tries,
                    RESILIENT_ATTEMPTS,
                    e
                );
                tries += 1;
                thread::sleep(Duration::from_millis(RESILIENT_BACKOFF_MS));
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// A directory failing `failures` times with `kind` before answering.
    struct FlakyDirectory {
        failures: Cell<u32>,
        kind: ErrorKind,
        reads: Cell<u32>,
    }

    impl Directory for FlakyDirectory {
        fn contains(&self, _name: &str) -> bool {
            true
        }

        fn read(&self, _name: &str) -> io::Result<String> {
            self.reads.set(self.reads.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(io::Error::new(self.kind, "flaky"));
            }
            Ok("FOO=bar".to_string())
        }
    }

    struct FlakyFilesystem {
        directory: Rc<FlakyDirectory>,
    }

    impl Filesystem for FlakyFilesystem {
        fn contains(&self, _path: &Path) -> bool {
            true
        }

        fn mount(&self, _path: &Path) -> io::Result<Rc<dyn Directory>> {
            Ok(self.directory.clone())
        }
    }

    struct FlakyOs {
        filesystem: Rc<FlakyFilesystem>,
    }

    impl OperatingSystem for FlakyOs {
        fn filesystem(&self) -> Rc<dyn Filesystem> {
            self.filesystem.clone()
        }
    }

    fn flaky(failures: u32, kind: ErrorKind) -> (Rc<FlakyDirectory>, ResilientOperatingSystem) {
        let directory = Rc::new(FlakyDirectory {
            failures: Cell::new(failures),
            kind,
            reads: Cell::new(0),
        });
        let os = FlakyOs {
            filesystem: Rc::new(FlakyFilesystem {
                directory: directory.clone(),
            }),
        };
        (directory, ResilientOperatingSystem::new(Rc::new(os)))
    }

    #[test]
    fn test_retries_transient_read_failures() {
        let (directory, os) = flaky(2, ErrorKind::Interrupted);

        let mounted = os.filesystem().mount(Path::new("/config")).unwrap();
        assert_eq!(mounted.read(".env").unwrap(), "FOO=bar");
        assert_eq!(directory.reads.get(), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let (directory, os) = flaky(10, ErrorKind::TimedOut);

        let mounted = os.filesystem().mount(Path::new("/config")).unwrap();
        let error = mounted.read(".env").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TimedOut);
        assert_eq!(directory.reads.get(), RESILIENT_ATTEMPTS);
    }

    #[test]
    fn test_does_not_retry_permanent_failures() {
        let (directory, os) = flaky(1, ErrorKind::PermissionDenied);

        let mounted = os.filesystem().mount(Path::new("/config")).unwrap();
        assert!(mounted.read(".env").is_err());
        assert_eq!(directory.reads.get(), 1);
    }
}
