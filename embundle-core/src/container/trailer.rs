use std::io::{Read, Seek, SeekFrom, Write};

use crate::container::header::FIXED_LEN;
use crate::error::{BundleError, Result};

pub const TRAILER_MAGIC: [u8; 6] = *b"EMBNDL";
/// The little-endian u32 pointer occupying the last bytes of the host file.
pub const POINTER_LEN: u64 = 4;

/// Container placement as found through the trailer pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerHit {
    /// Offset of the magic tag (the pointer's value)
    pub magic_off: u64,
    /// Header start, immediately after the tag
    pub start: u64,
    /// Container end (start of the pointer)
    pub end: u64,
}

pub fn write_magic<W: Write>(mut w: W) -> std::io::Result<()> {
    w.write_all(&TRAILER_MAGIC)
}

/// Append the pointer to the magic tag; the host prefix must fit in 32 bits.
pub fn write_pointer<W: Write>(mut w: W, magic_off: u64) -> Result<()> {
    let ptr = u32::try_from(magic_off).map_err(|_| {
        BundleError::Format(format!(
            "host executable of {magic_off} bytes is beyond the 32-bit trailer pointer"
        ))
    })?;
    w.write_all(&ptr.to_le_bytes())?;
    Ok(())
}

/// Follow the trailer pointer and check the tag it addresses.
/// `Ok(None)` means the file carries no trailer bundle.
pub fn read_trailer<F: Read + Seek>(f: &mut F) -> std::io::Result<Option<TrailerHit>> {
    let len = f.seek(SeekFrom::End(0))?;
    let magic_len = TRAILER_MAGIC.len() as u64;
    if len < magic_len + FIXED_LEN + POINTER_LEN {
        return Ok(None);
    }
    f.seek(SeekFrom::End(-(POINTER_LEN as i64)))?;
    let mut ptr = [0u8; 4];
    f.read_exact(&mut ptr)?;
    let magic_off = u32::from_le_bytes(ptr) as u64;
    let end = len - POINTER_LEN;
    if magic_off + magic_len + FIXED_LEN > end {
        return Ok(None);
    }

    f.seek(SeekFrom::Start(magic_off))?;
    let mut magic = [0u8; 6];
    f.read_exact(&mut magic)?;
    if magic != TRAILER_MAGIC {
        return Ok(None);
    }
    Ok(Some(TrailerHit {
        magic_off,
        start: magic_off + magic_len,
        end,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn pointer_addresses_magic() {
        let mut buf = b"\x7fELF-host-bytes".to_vec();
        let magic_off = buf.len() as u64;
        write_magic(&mut buf).unwrap();
        buf.extend_from_slice(&[0u8; FIXED_LEN as usize]);
        write_pointer(&mut buf, magic_off).unwrap();

        let hit = read_trailer(&mut Cursor::new(&buf)).unwrap().unwrap();
        assert_eq!(hit.magic_off, magic_off);
        assert_eq!(hit.start, magic_off + 6);
        assert_eq!(hit.end, buf.len() as u64 - 4);
    }

    #[test]
    fn plain_or_tiny_files_have_no_trailer() {
        assert!(read_trailer(&mut Cursor::new(Vec::<u8>::new())).unwrap().is_none());
        assert!(read_trailer(&mut Cursor::new(vec![0u8; 3])).unwrap().is_none());
        let plain = vec![0xAAu8; 4096];
        assert!(read_trailer(&mut Cursor::new(plain)).unwrap().is_none());
    }

    #[test]
    fn pointer_beyond_u32_is_rejected() {
        let err = write_pointer(Vec::new(), u32::MAX as u64 + 1).unwrap_err();
        assert!(matches!(err, BundleError::Format(_)));
    }
}
