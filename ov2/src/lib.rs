use geo::{BoundingRect, Coord, MultiPoint, Point};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Coordinates are stored as degrees times this factor, rounded to an i32.
pub const SCALE: f64 = 100_000.0;

const DELETED: u8 = 0;
const SKIPPER: u8 = 1;
const SIMPLE_POI: u8 = 2;
const EXTENDED_POI: u8 = 3;

// type byte + i32 length
const HEADER_LEN: usize = 5;
// header + lon + lat
const POI_FIXED_LEN: usize = HEADER_LEN + 8;
// header + east, north, west, south
const SKIPPER_LEN: usize = HEADER_LEN + 16;

#[derive(Clone, Debug, PartialEq)]
pub struct Poi {
    pub name: Option<String>,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    pub points: Vec<Poi>,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{name:?} has a non-finite coordinate")]
    NonFinite { name: Option<String> },
    #[error("{name:?} is out of range at ({lon}, {lat})")]
    OutOfRange {
        name: Option<String>,
        lon: f64,
        lat: f64,
    },
    #[error("{name:?} contains a NUL byte")]
    NameContainsNul { name: String },
    #[error("a record of {0} bytes doesn't fit in an OV2 length field")]
    RecordTooLarge(usize),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record at byte {offset} is truncated")]
    Truncated { offset: usize },
    #[error("unknown record type {record_type} at byte {offset}")]
    UnknownRecordType { offset: usize, record_type: u8 },
    #[error("record at byte {offset} has invalid length {length}")]
    BadLength { offset: usize, length: i32 },
}

/// Encode every point of every route, in order, as simple POI records behind one skipper record
/// covering their bounding box. No points produces an empty buffer.
pub fn encode(routes: &[Route]) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::new();
    let mut fixed_points = Vec::new();
    for poi in routes.iter().flat_map(|route| &route.points) {
        let pt = to_fixed(poi)?;
        write_simple_poi(&mut body, poi.name.as_deref().unwrap_or(""), pt)?;
        fixed_points.push(Point(pt));
    }

    let Some(bbox) = MultiPoint::new(fixed_points).bounding_rect() else {
        return Ok(Vec::new());
    };

    let total = SKIPPER_LEN + body.len();
    let mut out = Vec::with_capacity(total);
    out.push(SKIPPER);
    out.extend_from_slice(&record_len(total)?.to_le_bytes());
    for value in [bbox.max().x, bbox.max().y, bbox.min().x, bbox.min().y] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend(body);
    Ok(out)
}

/// Read every POI from an OV2 buffer, in file order. Skipper records only group other records,
/// so their contents are read like top-level records. Deleted records are skipped.
pub fn decode(bytes: &[u8]) -> Result<Vec<Poi>, DecodeError> {
    let mut pois = Vec::new();
    let mut offset = 0;
    while let Some(&record_type) = bytes.get(offset) {
        match record_type {
            DELETED => {
                offset += read_record_len(bytes, offset, HEADER_LEN)?;
            }
            SKIPPER => {
                read_record_len(bytes, offset, SKIPPER_LEN)?;
                if bytes.len() < offset + SKIPPER_LEN {
                    return Err(DecodeError::Truncated { offset });
                }
                offset += SKIPPER_LEN;
            }
            SIMPLE_POI | EXTENDED_POI => {
                let len = read_record_len(bytes, offset, POI_FIXED_LEN + 1)?;
                let record = &bytes[offset..offset + len];
                let lon = read_i32(record, HEADER_LEN);
                let lat = read_i32(record, HEADER_LEN + 4);
                // Extended records continue with NUL-separated unique ID and phone number
                let text = &record[POI_FIXED_LEN..];
                let name_len = text.iter().position(|b| *b == 0).unwrap_or(text.len());
                let name = String::from_utf8_lossy(&text[..name_len]).into_owned();
                pois.push(Poi {
                    name: if name.is_empty() { None } else { Some(name) },
                    lon: f64::from(lon) / SCALE,
                    lat: f64::from(lat) / SCALE,
                });
                offset += len;
            }
            record_type => {
                return Err(DecodeError::UnknownRecordType {
                    offset,
                    record_type,
                });
            }
        }
    }
    Ok(pois)
}

fn to_fixed(poi: &Poi) -> Result<Coord<i32>, EncodeError> {
    if !poi.lon.is_finite() || !poi.lat.is_finite() {
        return Err(EncodeError::NonFinite {
            name: poi.name.clone(),
        });
    }
    if !(-180.0..=180.0).contains(&poi.lon) || !(-90.0..=90.0).contains(&poi.lat) {
        return Err(EncodeError::OutOfRange {
            name: poi.name.clone(),
            lon: poi.lon,
            lat: poi.lat,
        });
    }
    // In range, so these can't overflow
    Ok(Coord {
        x: (poi.lon * SCALE).round() as i32,
        y: (poi.lat * SCALE).round() as i32,
    })
}

fn write_simple_poi(out: &mut Vec<u8>, name: &str, pt: Coord<i32>) -> Result<(), EncodeError> {
    if name.contains('\0') {
        return Err(EncodeError::NameContainsNul {
            name: name.to_string(),
        });
    }
    let len = POI_FIXED_LEN + name.len() + 1;
    out.push(SIMPLE_POI);
    out.extend_from_slice(&record_len(len)?.to_le_bytes());
    out.extend_from_slice(&pt.x.to_le_bytes());
    out.extend_from_slice(&pt.y.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    Ok(())
}

fn record_len(len: usize) -> Result<i32, EncodeError> {
    i32::try_from(len).map_err(|_| EncodeError::RecordTooLarge(len))
}

/// Returns the declared length of the record at `offset`, checking it's at least `min_len` and,
/// except for skippers, fits in the buffer.
fn read_record_len(bytes: &[u8], offset: usize, min_len: usize) -> Result<usize, DecodeError> {
    if bytes.len() < offset + HEADER_LEN {
        return Err(DecodeError::Truncated { offset });
    }
    let length = read_i32(bytes, offset + 1);
    let len = usize::try_from(length).map_err(|_| DecodeError::BadLength { offset, length })?;
    if len < min_len {
        return Err(DecodeError::BadLength { offset, length });
    }
    // A skipper's length covers the records it groups, which are read separately
    if bytes[offset] != SKIPPER && bytes.len() < offset + len {
        return Err(DecodeError::Truncated { offset });
    }
    Ok(len)
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    let mut buf = [0; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(buf)
}
