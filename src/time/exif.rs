//! EXIF capture metadata for images

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Capture metadata pulled from an image, used only while resolving a timestamp
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifSnapshot {
    /// `DateTimeOriginal` as embedded, without timezone
    pub capture_timestamp: Option<NaiveDateTime>,
    /// Camera model, lowercased
    pub device_model: Option<String>,
}

/// Read capture time and device model from an image's EXIF block.
///
/// Only `DateTimeOriginal` counts as the capture time; `DateTime` and
/// `DateTimeDigitized` are ignored. Fails when the file is not a container
/// kamadak-exif understands or carries no EXIF at all.
pub fn read_exif_snapshot(path: &Path) -> Result<ExifSnapshot> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let capture_timestamp = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .and_then(ascii_value)
        .and_then(|s| parse_exif_datetime(&s));

    let device_model = exif
        .get_field(Tag::Model, In::PRIMARY)
        .and_then(ascii_value)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    trace!(?path, ?capture_timestamp, ?device_model, "Read EXIF snapshot");

    Ok(ExifSnapshot {
        capture_timestamp,
        device_model,
    })
}

fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    // Some writers append subseconds or use dashes
    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Minimal JPEG fixtures with a hand-built EXIF APP1 segment
#[cfg(test)]
pub(crate) mod fixture {
    pub const DATE_TIME: u16 = 0x0132;
    pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
    pub const DATE_TIME_DIGITIZED: u16 = 0x9004;

    const ASCII: u16 = 2;
    const LONG: u16 = 4;
    const UNDEFINED: u16 = 7;

    struct Entry {
        tag: u16,
        kind: u16,
        count: u32,
        data: Vec<u8>,
    }

    fn ascii(tag: u16, s: &str) -> Entry {
        let mut data = s.as_bytes().to_vec();
        data.push(0);
        Entry {
            tag,
            kind: ASCII,
            count: data.len() as u32,
            data,
        }
    }

    /// Build a JPEG carrying `Model` (optional) and `DateTimeOriginal`
    pub fn jpeg_with_exif(date_time_original: &str, model: Option<&str>) -> Vec<u8> {
        jpeg_with_date_tag(DATE_TIME_ORIGINAL, date_time_original, model)
    }

    /// Build a JPEG whose only date is stored under `date_tag`.
    ///
    /// `DateTime` goes into IFD0, the other date tags into the Exif IFD.
    pub fn jpeg_with_date_tag(date_tag: u16, date: &str, model: Option<&str>) -> Vec<u8> {
        let tiff = tiff_block(date_tag, date, model);

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        let segment_len = (2 + 6 + tiff.len()) as u16;
        jpeg.extend_from_slice(&segment_len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn tiff_block(date_tag: u16, date: &str, model: Option<&str>) -> Vec<u8> {
        let mut ifd0 = Vec::new();
        if let Some(model) = model {
            ifd0.push(ascii(0x0110, model));
        }
        if date_tag == DATE_TIME {
            ifd0.push(ascii(DATE_TIME, date));
        }
        // Pointer value is filled in once the IFD0 size is known
        ifd0.push(Entry {
            tag: 0x8769,
            kind: LONG,
            count: 1,
            data: vec![0; 4],
        });

        let mut exif_ifd = vec![Entry {
            tag: 0x9000,
            kind: UNDEFINED,
            count: 4,
            data: b"0230".to_vec(),
        }];
        if date_tag != DATE_TIME {
            exif_ifd.push(ascii(date_tag, date));
        }

        let exif_ifd_offset = 8 + ifd_len(&ifd0);
        if let Some(pointer) = ifd0.last_mut() {
            pointer.data = exif_ifd_offset.to_le_bytes().to_vec();
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes());
        write_ifd(&mut out, &ifd0, 8);
        write_ifd(&mut out, &exif_ifd, exif_ifd_offset);
        out
    }

    fn padded(len: usize) -> u32 {
        (len as u32 + 1) & !1
    }

    fn ifd_len(entries: &[Entry]) -> u32 {
        let data: u32 = entries
            .iter()
            .filter(|e| e.data.len() > 4)
            .map(|e| padded(e.data.len()))
            .sum();
        2 + 12 * entries.len() as u32 + 4 + data
    }

    fn write_ifd(out: &mut Vec<u8>, entries: &[Entry], start: u32) {
        let mut data_offset = start + 2 + 12 * entries.len() as u32 + 4;
        let mut data = Vec::new();

        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for entry in entries {
            out.extend_from_slice(&entry.tag.to_le_bytes());
            out.extend_from_slice(&entry.kind.to_le_bytes());
            out.extend_from_slice(&entry.count.to_le_bytes());
            if entry.data.len() <= 4 {
                let mut inline = entry.data.clone();
                inline.resize(4, 0);
                out.extend_from_slice(&inline);
            } else {
                out.extend_from_slice(&data_offset.to_le_bytes());
                data.extend_from_slice(&entry.data);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
                data_offset += padded(entry.data.len());
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&data);
    }
}
