use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use time::OffsetDateTime;
use walkdir::WalkDir;

use crate::container::header::{Header, PAYLOAD_SIZE_OFF};
use crate::container::record::write_record;
use crate::container::section::DEFAULT_SECTION;
use crate::container::trailer::{TRAILER_MAGIC, write_magic, write_pointer};
use crate::error::{BundleError, Result};

/// How the container is attached to the host executable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Embedding {
    /// Host bytes, magic tag, container, 32-bit pointer to the tag
    #[default]
    Trailer,
    /// Container injected as a named object-file section
    Section,
}

#[derive(Clone, Debug, Default)]
pub struct BundleOptions {
    pub embedding: Embedding,
    /// Executable that receives the bundle; defaults to the running one.
    pub host: Option<PathBuf>,
    /// When true, write `created_at = 0` for reproducible output.
    pub deterministic: bool,
    /// Section name for [`Embedding::Section`]; defaults to `.embundle-assets`.
    pub section_name: Option<String>,
}

impl BundleOptions {
    pub fn section_name(&self) -> &str {
        self.section_name.as_deref().unwrap_or(DEFAULT_SECTION)
    }
}

/// Copies `host` to `out` with `container` added as section `section`.
pub trait SectionInjector {
    fn inject(&self, host: &Path, container: &Path, section: &str, out: &Path) -> Result<()>;
}

/// Injects through binutils `objcopy`, stripping symbols on the way.
#[derive(Clone, Debug)]
pub struct ObjcopyInjector {
    pub program: PathBuf,
}

impl Default for ObjcopyInjector {
    fn default() -> Self {
        Self {
            program: PathBuf::from("objcopy"),
        }
    }
}

impl SectionInjector for ObjcopyInjector {
    fn inject(&self, host: &Path, container: &Path, section: &str, out: &Path) -> Result<()> {
        let mut add = std::ffi::OsString::from(format!("{section}="));
        add.push(container);
        let output = Command::new(&self.program)
            .arg("--add-section")
            .arg(add)
            .arg("--set-section-flags")
            .arg(format!("{section}=contents,readonly"))
            .arg("--strip-all")
            .arg(host)
            .arg(out)
            .output()
            .map_err(|e| BundleError::Inject(format!("{}: {e}", self.program.display())))?;
        if !output.status.success() {
            return Err(BundleError::Inject(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// What a finished bundle holds.
#[derive(Clone, Debug)]
pub struct BundleReport {
    pub header: Header,
    pub entries: usize,
    /// Header plus records, in bytes
    pub container_len: u64,
}

/// Write header and records at the stream's current position, then patch
/// the header's payload size. Leaves the stream positioned after the last
/// record.
pub fn write_container<W: Write + Seek>(
    mut w: W,
    source: &Path,
    description: &str,
    created_at: i64,
) -> Result<BundleReport> {
    let start = w.stream_position()?;
    let mut header = Header::new(created_at, description);
    header.write_to(&mut w)?;

    let mut payload_size = 0u64;
    let mut entries = 0usize;
    for e in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let e = e.map_err(std::io::Error::from)?;
        let p = e.path();
        if e.file_type().is_dir() {
            continue;
        }
        // Symlinks count only when they resolve to a regular file.
        let md = fs::metadata(p)?;
        if !md.is_file() {
            tracing::debug!(path = %p.display(), "skipping non-regular file");
            continue;
        }
        let name = entry_name(source, p)?;
        let f = File::open(p)?;
        payload_size += write_record(&mut w, &name, md.len(), f)?;
        entries += 1;
        tracing::debug!(%name, size = md.len(), "record written");
    }

    let end = w.stream_position()?;
    header.payload_size = i64::try_from(payload_size)
        .map_err(|_| BundleError::Format("payload size overflows i64".into()))?;
    w.seek(SeekFrom::Start(start + PAYLOAD_SIZE_OFF))?;
    w.write_all(&header.payload_size.to_le_bytes())?;
    w.seek(SeekFrom::Start(end))?;

    Ok(BundleReport {
        header,
        entries,
        container_len: end - start,
    })
}

/// Bundle every regular file under `source` into a copy of the host
/// executable at `out`. Section embedding goes through `objcopy`.
pub fn bundle(source: &Path, out: &Path, description: &str, opts: &BundleOptions) -> Result<BundleReport> {
    bundle_with_injector(source, out, description, opts, &ObjcopyInjector::default())
}

pub fn bundle_with_injector(
    source: &Path,
    out: &Path,
    description: &str,
    opts: &BundleOptions,
    injector: &dyn SectionInjector,
) -> Result<BundleReport> {
    if !source.is_dir() {
        return Err(BundleError::InvalidPath(format!(
            "{} is not a directory",
            source.display()
        )));
    }
    let host = match &opts.host {
        Some(h) => h.clone(),
        None => std::env::current_exe()?,
    };
    if same_file(&host, out) {
        return Err(BundleError::InvalidPath(format!(
            "output {} would overwrite the host executable",
            out.display()
        )));
    }
    let created_at = if opts.deterministic {
        0
    } else {
        OffsetDateTime::now_utc().unix_timestamp()
    };

    let report = match opts.embedding {
        Embedding::Trailer => append_trailer(&host, source, out, description, created_at)?,
        Embedding::Section => {
            let mut tmp = tempfile::Builder::new().prefix("embundle-").tempfile()?;
            let report = write_container(tmp.as_file_mut(), source, description, created_at)?;
            tmp.as_file_mut().sync_all()?;
            injector.inject(&host, tmp.path(), opts.section_name(), out)?;
            report
        }
    };

    tracing::info!(
        out = %out.display(),
        embedding = ?opts.embedding,
        entries = report.entries,
        bytes = report.container_len,
        "bundle written"
    );
    Ok(report)
}

fn append_trailer(
    host: &Path,
    source: &Path,
    out: &Path,
    description: &str,
    created_at: i64,
) -> Result<BundleReport> {
    let host_md = fs::metadata(host)?;
    if u32::try_from(host_md.len()).is_err() {
        return Err(BundleError::Format(format!(
            "host executable of {} bytes is beyond the 32-bit trailer pointer",
            host_md.len()
        )));
    }

    let mut out_f = File::create(out)?;
    let magic_off = std::io::copy(&mut File::open(host)?, &mut out_f)?;
    write_magic(&mut out_f)?;
    let report = write_container(&mut out_f, source, description, created_at)?;
    write_pointer(&mut out_f, magic_off)?;
    out_f.sync_all()?;
    drop(out_f);
    fs::set_permissions(out, host_md.permissions())?;

    tracing::debug!(magic_off, magic = ?TRAILER_MAGIC, "trailer attached");
    Ok(report)
}

/// Slash-separated name of `p` relative to `root`.
fn entry_name(root: &Path, p: &Path) -> Result<String> {
    let rel = p
        .strip_prefix(root)
        .map_err(|_| BundleError::InvalidPath(p.display().to_string()))?;
    let mut parts = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(s) => parts.push(s.to_str().ok_or_else(|| {
                BundleError::Format(format!("non UTF-8 file name: {}", p.display()))
            })?),
            _ => return Err(BundleError::InvalidPath(p.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
