use std::io::{self, Read, Seek, SeekFrom, Write};

use serde::Serialize;

use crate::error::{BundleError, Result};

/// name_len (u32) + payload_len (u32)
pub const RECORD_OVERHEAD: u64 = 8;

/// Where one record's payload lives in the host file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryLoc {
    pub name: String,
    /// Absolute offset of the first payload byte in the host file
    pub offset: u64,
    pub size: u64,
}

/// Write one record: `[name_len][name][payload_len][payload]`, no padding.
/// Copies exactly `payload_len` bytes from `payload`; returns bytes written.
pub fn write_record<W: Write, R: Read>(
    mut w: W,
    name: &str,
    payload_len: u64,
    payload: R,
) -> Result<u64> {
    let name_len = u32::try_from(name.len())
        .map_err(|_| BundleError::Format(format!("name too long: {name}")))?;
    let data_len = u32::try_from(payload_len).map_err(|_| {
        BundleError::Format(format!("{name}: {payload_len} bytes exceeds the 4 GiB record limit"))
    })?;

    w.write_all(&name_len.to_le_bytes())?;
    w.write_all(name.as_bytes())?;
    w.write_all(&data_len.to_le_bytes())?;
    let copied = io::copy(&mut payload.take(payload_len), &mut w)?;
    if copied != payload_len {
        return Err(BundleError::Format(format!(
            "{name}: expected {payload_len} bytes, source yielded {copied}"
        )));
    }
    Ok(RECORD_OVERHEAD + name_len as u64 + payload_len)
}

/// Decode the record at the reader's position without buffering its payload.
///
/// `r` addresses the container (position 0 is the header start) and ends at
/// the container end; `base` is the container's absolute offset in the host.
/// Returns `Ok(None)` when the container ends exactly on a record boundary and
/// `CorruptContainer` when a record starts but cannot be completed.
pub fn decode_next_record<R: Read + Seek>(r: &mut R, base: u64, end: u64) -> Result<Option<EntryLoc>> {
    let start = r.stream_position()?;

    let mut len4 = [0u8; 4];
    match read_full(r, &mut len4)? {
        0 => return Ok(None),
        4 => {}
        n => return Err(corrupt(start, format!("record length cut after {n} bytes"))),
    }
    let name_len = u32::from_le_bytes(len4) as u64;
    if start + 4 + name_len + 4 > end {
        return Err(corrupt(start, format!("name of {name_len} bytes runs past container end")));
    }

    let mut name = vec![0u8; name_len as usize];
    if read_full(r, &mut name)? != name.len() {
        return Err(corrupt(start, "truncated name".into()));
    }
    let name = String::from_utf8(name).map_err(|_| corrupt(start, "name is not UTF-8".into()))?;

    if read_full(r, &mut len4)? != 4 {
        return Err(corrupt(start, format!("{name}: truncated payload length")));
    }
    let size = u32::from_le_bytes(len4) as u64;

    let payload_off = r.stream_position()?;
    if payload_off + size > end {
        return Err(corrupt(
            start,
            format!("{name}: payload of {size} bytes runs past container end"),
        ));
    }
    // Skip, do not buffer.
    r.seek(SeekFrom::Current(size as i64))?;

    Ok(Some(EntryLoc {
        name,
        offset: base + payload_off,
        size,
    }))
}

fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        match r.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(got)
}

fn corrupt(offset: u64, reason: String) -> BundleError {
    BundleError::CorruptContainer { offset, reason }
}
