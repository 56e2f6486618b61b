//! Video duration from the MP4 movie header
//!
//! Reads the `mvhd` box of an ISO-BMFF file: a timescale (ticks per
//! second) and a duration in ticks at fixed offsets after the box tag.
//! No decoder is involved, so probing a whole course folder stays cheap.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::task;

/// Bytes read from the start of the file before walking boxes
const HEAD_WINDOW: usize = 64 * 1024;

/// Box header: 32-bit size + 4-byte type
const BOX_HEADER_LEN: u64 = 8;

/// Probe the duration in whole seconds (rounded).
///
/// Runs on the blocking pool; any failure yields None.
pub async fn probe_duration(path: PathBuf) -> Option<u64> {
    let result = task::spawn_blocking(move || {
        let secs = probe_duration_blocking(&path);
        if secs.is_none() {
            log::debug!("⏱️  No movie header in {}", path.display());
        }
        secs
    })
    .await;

    result.ok().flatten()
}

/// Blocking implementation of duration probing
pub fn probe_duration_blocking(path: &Path) -> Option<u64> {
    let mut file = File::open(path).ok()?;

    // Fast path: fast-start files carry `moov` right after `ftyp`
    let mut head = Vec::with_capacity(HEAD_WINDOW);
    (&mut file).take(HEAD_WINDOW as u64).read_to_end(&mut head).ok()?;
    if let Some(secs) = find_mvhd(&head).and_then(parse_mvhd) {
        return Some(secs);
    }

    // Slow path: `moov` after `mdat`, seek box to box
    file.seek(SeekFrom::Start(0)).ok()?;
    let moov = read_moov(&mut file)?;
    find_mvhd(&moov).and_then(parse_mvhd)
}

/// Locate the `mvhd` tag and return the bytes following it
fn find_mvhd(data: &[u8]) -> Option<&[u8]> {
    let pos = data.windows(4).position(|w| w == b"mvhd")?;
    Some(&data[pos + 4..])
}

/// Parse the full-box payload after the `mvhd` tag into seconds
fn parse_mvhd(payload: &[u8]) -> Option<u64> {
    let version = *payload.first()?;

    // version(1) + flags(3), then creation/modification times
    let (timescale_at, duration) = match version {
        0 => (12, read_u32(payload, 16)? as u64),
        1 => (20, read_u64(payload, 24)?),
        _ => return None,
    };
    let timescale = read_u32(payload, timescale_at)? as u64;
    if timescale == 0 {
        return None;
    }

    Some((duration as f64 / timescale as f64).round() as u64)
}

/// Walk top-level boxes and return the body of `moov`
fn read_moov<R: Read + Seek>(reader: &mut R) -> Option<Vec<u8>> {
    loop {
        let mut header = [0u8; BOX_HEADER_LEN as usize];
        reader.read_exact(&mut header).ok()?;

        let size = read_u32(&header, 0)? as u64;
        let kind = &header[4..8];

        let (box_len, header_len) = match size {
            // Box extends to end of file
            0 => {
                let here = reader.stream_position().ok()?;
                let end = reader.seek(SeekFrom::End(0)).ok()?;
                reader.seek(SeekFrom::Start(here)).ok()?;
                (end - here + BOX_HEADER_LEN, BOX_HEADER_LEN)
            }
            // 64-bit largesize follows the type
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large).ok()?;
                (u64::from_be_bytes(large), BOX_HEADER_LEN + 8)
            }
            n => (n, BOX_HEADER_LEN),
        };
        if box_len < header_len {
            return None;
        }
        let body_len = box_len - header_len;

        if kind == b"moov" {
            let mut body = Vec::new();
            reader.take(body_len).read_to_end(&mut body).ok()?;
            return Some(body);
        }
        reader.seek(SeekFrom::Current(i64::try_from(body_len).ok()?)).ok()?;
    }
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn read_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes = data.get(at..at + 8)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    fn mp4_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out
    }

    fn mvhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
        let mut body = vec![0u8; 4]; // version 0, flags
        body.extend_from_slice(&[0u8; 8]); // creation, modification
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
        body.extend_from_slice(&[0u8; 80]);
        mp4_box(b"mvhd", &body)
    }

    fn mvhd_v1(timescale: u32, duration: u64) -> Vec<u8> {
        let mut body = vec![1u8, 0, 0, 0];
        body.extend_from_slice(&[0u8; 16]);
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
        body.extend_from_slice(&[0u8; 80]);
        mp4_box(b"mvhd", &body)
    }

    /// Minimal fast-start MP4 with the given duration
    pub(crate) fn fake_mp4(seconds: u32) -> Vec<u8> {
        let mut out = mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2");
        out.extend(mp4_box(b"moov", &mvhd_v0(1000, seconds * 1000)));
        out
    }

    #[test]
    fn test_parse_version_0() {
        let data = fake_mp4(125);
        assert_eq!(find_mvhd(&data).and_then(parse_mvhd), Some(125));
    }

    #[test]
    fn test_parse_version_1_rounds() {
        let data = mp4_box(b"moov", &mvhd_v1(90_000, 90_000 * 3_600 + 60_000));
        assert_eq!(find_mvhd(&data).and_then(parse_mvhd), Some(3_601));
    }

    #[test]
    fn test_zero_timescale_is_unknown() {
        let data = mp4_box(b"moov", &mvhd_v0(0, 1000));
        assert_eq!(find_mvhd(&data).and_then(parse_mvhd), None);
    }

    #[test]
    fn test_truncated_header_is_unknown() {
        let data = b"....mvhd\0\0\0\0\0\0".to_vec();
        assert_eq!(find_mvhd(&data).and_then(parse_mvhd), None);
    }

    #[test]
    fn test_moov_after_large_mdat() {
        let mut data = mp4_box(b"ftyp", b"isom");
        // 64-bit sized mdat
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&(16u64 + 1024).to_be_bytes());
        data.extend(std::iter::repeat(0xAB).take(1024));
        data.extend(mp4_box(b"moov", &mvhd_v0(600, 600 * 42)));

        let moov = read_moov(&mut Cursor::new(data)).unwrap();
        assert_eq!(find_mvhd(&moov).and_then(parse_mvhd), Some(42));
    }

    #[test]
    fn test_no_moov() {
        let data = mp4_box(b"ftyp", b"isom");
        assert!(read_moov(&mut Cursor::new(data)).is_none());
    }

    #[test]
    fn test_probe_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.mp4");
        let bad = dir.path().join("bad.mp4");
        std::fs::write(&good, fake_mp4(61)).unwrap();
        std::fs::write(&bad, b"not a video").unwrap();

        assert_eq!(probe_duration_blocking(&good), Some(61));
        assert_eq!(probe_duration_blocking(&bad), None);
        assert_eq!(probe_duration_blocking(&dir.path().join("missing.mp4")), None);
    }
}
