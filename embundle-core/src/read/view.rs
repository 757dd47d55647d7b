use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::container::record::EntryLoc;
use crate::error::{BundleError, Result};
use crate::vfs::{Metadata, NodeKind, READ_ONLY_MODE, base_name};

/// A file-like handle confined to `[base, base + size)` of a host file.
///
/// All reads are positioned reads on the descriptor, so the view's cursor
/// is its own and never depends on the descriptor's offset.
#[derive(Debug)]
pub struct BoundedFile {
    f: File,
    name: String,
    base: u64,
    size: u64,
    pos: u64,
}

impl BoundedFile {
    pub fn new(f: File, name: impl Into<String>, base: u64, size: u64) -> Self {
        Self {
            f,
            name: name.into(),
            base,
            size,
            pos: 0,
        }
    }

    /// Open an independent descriptor on `host` scoped to one entry.
    pub fn open(host: &Path, loc: &EntryLoc) -> Result<Self> {
        let f = File::open(host)?;
        Ok(Self::new(f, loc.name.clone(), loc.offset, loc.size))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Absolute offset of the first byte of the view in the host file.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Current cursor, relative to the view start.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Positioned read at `off` (relative). Fails for `off < 0` or
    /// `off >= size`; the length is clamped at the entry end. The cursor
    /// is not moved.
    pub fn read_at(&self, buf: &mut [u8], off: i64) -> Result<usize> {
        if off < 0 || off as u64 >= self.size {
            return Err(BundleError::OutOfRange {
                offset: off,
                size: self.size,
            });
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let off = off as u64;
        let want = buf.len().min((self.size - off) as usize);
        self.fill_at(&mut buf[..want], self.base + off)?;
        Ok(want)
    }

    pub fn stat(&self) -> Metadata {
        Metadata {
            name: base_name(&self.name).to_string(),
            kind: NodeKind::File,
            size: self.size,
            mode: READ_ONLY_MODE,
            modified: None,
        }
    }

    fn fill_at(&self, buf: &mut [u8], abs: u64) -> io::Result<()> {
        let mut done = 0;
        while done < buf.len() {
            match pread(&self.f, &mut buf[done..], abs + done as u64) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("host file ends inside entry {}", self.name),
                    ));
                }
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl Read for BoundedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.size || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min((self.size - self.pos) as usize);
        let n = pread(&self.f, &mut buf[..want], self.base + self.pos)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("host file ends inside entry {}", self.name),
            ));
        }
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for BoundedFile {
    /// Seeking outside `[0, size]` fails and leaves the cursor untouched.
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let target = match from {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(d) => i128::from(self.pos) + i128::from(d),
            SeekFrom::End(d) => i128::from(self.size) + i128::from(d),
        };
        if target < 0 || target > i128::from(self.size) {
            return Err(BundleError::OutOfRange {
                offset: i64::try_from(target).unwrap_or(i64::MAX),
                size: self.size,
            }
            .into());
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

#[cfg(unix)]
fn pread(f: &File, buf: &mut [u8], off: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    f.read_at(buf, off)
}

#[cfg(windows)]
fn pread(f: &File, buf: &mut [u8], off: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    f.seek_read(buf, off)
}

#[cfg(not(any(unix, windows)))]
fn pread(mut f: &File, buf: &mut [u8], off: u64) -> io::Result<usize> {
    f.seek(SeekFrom::Start(off))?;
    f.read(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Host: "HEAD" + "abcdefgh" + "TAIL"; the view covers "abcdefgh".
    fn view() -> (tempfile::NamedTempFile, BoundedFile) {
        let mut host = tempfile::NamedTempFile::new().unwrap();
        host.write_all(b"HEADabcdefghTAIL").unwrap();
        host.flush().unwrap();
        let loc = EntryLoc {
            name: "dir/letters.txt".into(),
            offset: 4,
            size: 8,
        };
        let v = BoundedFile::open(host.path(), &loc).unwrap();
        (host, v)
    }

    #[test]
    fn read_at_bounds() {
        let (_host, v) = view();
        let mut buf = [0u8; 32];

        assert!(matches!(v.read_at(&mut buf, 8), Err(BundleError::OutOfRange { .. })));
        assert!(matches!(v.read_at(&mut buf, -1), Err(BundleError::OutOfRange { .. })));
        assert_eq!(v.read_at(&mut buf, 7).unwrap(), 1);
        assert_eq!(buf[0], b'h');
        assert_eq!(v.read_at(&mut buf, 5).unwrap(), 3);
        assert_eq!(&buf[..3], b"fgh");
        assert_eq!(v.position(), 0);
    }

    #[test]
    fn sequential_read_stops_at_entry_end() {
        let (_host, mut v) = view();
        let mut out = Vec::new();
        v.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abcdefgh");
        let mut buf = [0u8; 4];
        assert_eq!(v.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_is_relative_and_bounded() {
        let (_host, mut v) = view();
        assert_eq!(v.seek(SeekFrom::End(0)).unwrap(), 8);
        let mut buf = [0u8; 4];
        assert_eq!(v.read(&mut buf).unwrap(), 0);

        assert_eq!(v.seek(SeekFrom::Start(2)).unwrap(), 2);
        assert_eq!(v.seek(SeekFrom::Current(3)).unwrap(), 5);
        assert_eq!(v.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"fgh");

        let err = v.seek(SeekFrom::End(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(v.seek(SeekFrom::Current(-100)).is_err());
        assert_eq!(v.position(), 8);
    }

    #[test]
    fn short_host_fails_instead_of_truncating() {
        let mut host = tempfile::NamedTempFile::new().unwrap();
        host.write_all(b"HEADabc").unwrap();
        host.flush().unwrap();
        let mut v = BoundedFile::new(host.reopen().unwrap(), "x", 4, 8);

        let mut out = Vec::new();
        let err = v.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut buf = [0u8; 8];
        assert!(v.read_at(&mut buf, 0).is_err());
    }

    #[test]
    fn stat_is_read_only_without_mtime() {
        let (_host, v) = view();
        let md = v.stat();
        assert_eq!(md.name, "letters.txt");
        assert_eq!(md.size, 8);
        assert_eq!(md.mode, 0o444);
        assert!(md.modified.is_none());
        assert!(!md.is_dir());
    }
}
