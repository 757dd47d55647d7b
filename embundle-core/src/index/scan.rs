use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::container::header::Header;
use crate::container::record::{EntryLoc, decode_next_record};
use crate::error::{BundleError, Result};
use crate::locate::ContainerSpan;
use crate::read::view::BoundedFile;

#[derive(Clone, Copy, Debug, Default)]
pub struct IndexOptions {
    /// Fail on a truncated or malformed record instead of keeping the
    /// entries parsed before it.
    pub strict: bool,
}

/// Header plus the ordered offset table of one container.
#[derive(Clone, Debug)]
pub struct ContainerIndex {
    pub header: Header,
    pub entries: Vec<EntryLoc>,
}

/// Scan the container once, reading only fixed fields and names; payloads
/// are skipped by seeking.
pub fn build_index(host: &Path, span: ContainerSpan, opts: &IndexOptions) -> Result<ContainerIndex> {
    let f = File::open(host)?;
    let mut r = BufReader::new(BoundedFile::new(f, "<container>", span.start, span.len()));

    let header = Header::read_from(&mut r, span.len())?;
    let mut entries = Vec::new();
    let mut consumed = 0u64;

    loop {
        match decode_next_record(&mut r, span.start, span.len()) {
            Ok(Some(loc)) => {
                tracing::debug!(name = %loc.name, offset = loc.offset, size = loc.size, "record");
                consumed += 8 + loc.name.len() as u64 + loc.size;
                entries.push(loc);
            }
            Ok(None) => break,
            Err(BundleError::CorruptContainer { offset, reason }) if !opts.strict => {
                tracing::warn!(
                    offset = span.start + offset,
                    %reason,
                    kept = entries.len(),
                    "container truncated; keeping entries parsed so far"
                );
                break;
            }
            Err(BundleError::CorruptContainer { offset, reason }) => {
                return Err(BundleError::CorruptContainer {
                    offset: span.start + offset,
                    reason,
                });
            }
            Err(e) => return Err(e),
        }
    }

    if header.payload_size != consumed as i64 {
        if opts.strict {
            return Err(BundleError::CorruptContainer {
                offset: span.start,
                reason: format!(
                    "header declares {} payload bytes, records hold {consumed}",
                    header.payload_size
                ),
            });
        }
        tracing::warn!(declared = header.payload_size, consumed, "payload size mismatch");
    }

    Ok(ContainerIndex { header, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::record::write_record;
    use std::io::Write;

    fn host_with(records: &[(&str, &[u8])], cut: usize) -> (tempfile::NamedTempFile, ContainerSpan) {
        host_declaring(records, cut, 0)
    }

    /// Like `host_with`, but the header's payload size is off by `skew`.
    fn host_declaring(
        records: &[(&str, &[u8])],
        cut: usize,
        skew: i64,
    ) -> (tempfile::NamedTempFile, ContainerSpan) {
        let mut body = Vec::new();
        let mut size = 0;
        for (name, data) in records {
            size += write_record(&mut body, name, data.len() as u64, *data).unwrap();
        }
        let mut header = Header::new(7, "test");
        header.payload_size = size as i64 + skew;
        let mut container = Vec::new();
        header.write_to(&mut container).unwrap();
        container.extend(body);
        container.truncate(container.len() - cut);

        let mut host = tempfile::NamedTempFile::new().unwrap();
        host.write_all(b"prefix").unwrap();
        host.write_all(&container).unwrap();
        host.flush().unwrap();
        let span = ContainerSpan {
            start: 6,
            end: 6 + container.len() as u64,
        };
        (host, span)
    }

    #[test]
    fn indexes_every_record_in_order() {
        let (host, span) = host_with(&[("index.html", b"hi"), ("css/app.css", b"body{}")], 0);
        let idx = build_index(host.path(), span, &IndexOptions::default()).unwrap();
        assert_eq!(idx.header.description, "test");
        let names: Vec<_> = idx.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["index.html", "css/app.css"]);
        // 6 (prefix) + 24 (header) + 4 + 10 + 4
        assert_eq!(idx.entries[0].offset, 48);
        assert_eq!(idx.entries[1].size, 6);
    }

    #[test]
    fn truncated_tail_is_lenient_by_default_and_fatal_when_strict() {
        let (host, span) = host_with(&[("a", b"aaaa"), ("b", b"bbbb")], 2);

        let idx = build_index(host.path(), span, &IndexOptions::default()).unwrap();
        assert_eq!(idx.entries.len(), 1);
        assert_eq!(idx.entries[0].name, "a");

        let err = build_index(host.path(), span, &IndexOptions { strict: true }).unwrap_err();
        assert!(matches!(err, BundleError::CorruptContainer { .. }));
    }

    #[test]
    fn payload_size_mismatch_is_lenient_by_default_and_fatal_when_strict() {
        let records: &[(&str, &[u8])] = &[("a", b"aaaa"), ("b/c", b"cc")];
        for skew in [-3, 5] {
            let (host, span) = host_declaring(records, 0, skew);

            let idx = build_index(host.path(), span, &IndexOptions::default()).unwrap();
            let names: Vec<_> = idx.entries.iter().map(|e| e.name.as_str()).collect();
            assert_eq!(names, ["a", "b/c"]);

            let err = build_index(host.path(), span, &IndexOptions { strict: true }).unwrap_err();
            match err {
                BundleError::CorruptContainer { offset, reason } => {
                    assert_eq!(offset, span.start);
                    assert!(reason.contains("payload"), "{reason}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
