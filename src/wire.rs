//! Big-endian primitive codec for persisted descriptors and metamorphs.
//!
//! Layout matches a Java `DataOutputStream`: `i32` and `f32` are written
//! big-endian, strings are an `i32` byte length followed by UTF-8 bytes.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Upper bound on speculative `Vec` preallocation while decoding counts.
const PREALLOC_LIMIT: usize = 4096;

pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_i32::<BigEndian>(value)?;
    Ok(())
}

pub fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<()> {
    writer.write_f32::<BigEndian>(value)?;
    Ok(())
}

pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    write_i32(writer, i32::from(value))
}

/// Writes a non-negative count or index. Fails if it does not fit in an `i32`.
pub fn write_usize<W: Write>(writer: &mut W, value: usize) -> Result<()> {
    let value = i32::try_from(value)
        .map_err(|_| Error::format(format!("value {value} does not fit the i32 wire format")))?;
    write_i32(writer, value)
}

pub fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    write_usize(writer, value.len())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

pub fn write_indexes<W: Write>(writer: &mut W, indexes: &[usize]) -> Result<()> {
    write_usize(writer, indexes.len())?;
    for &index in indexes {
        write_usize(writer, index)?;
    }
    Ok(())
}

pub fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    Ok(reader.read_i32::<BigEndian>()?)
}

pub fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    Ok(reader.read_f32::<BigEndian>()?)
}

/// Reads a 0/1 flag; any other value is a format error.
pub fn read_bool<R: Read>(reader: &mut R, what: &str) -> Result<bool> {
    match read_i32(reader)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::format(format!("{what}: expected 0 or 1, found {other}"))),
    }
}

/// Reads a count or index that must be non-negative.
pub fn read_usize<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let value = read_i32(reader)?;
    usize::try_from(value).map_err(|_| Error::format(format!("{what}: negative value {value}")))
}

pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_usize(reader, "string length")?;
    let mut bytes = Vec::with_capacity(capacity_hint(len));
    reader.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    String::from_utf8(bytes).map_err(|e| Error::format(format!("string is not UTF-8: {e}")))
}

pub fn read_indexes<R: Read>(reader: &mut R, what: &str) -> Result<Vec<usize>> {
    let len = read_usize(reader, what)?;
    let mut indexes = Vec::with_capacity(capacity_hint(len));
    for _ in 0..len {
        indexes.push(read_usize(reader, what)?);
    }
    Ok(indexes)
}

/// Capacity hint for a decoded count, capped so corrupt input cannot force a huge allocation.
pub const fn capacity_hint(len: usize) -> usize {
    if len < PREALLOC_LIMIT {
        len
    } else {
        PREALLOC_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_i32_is_big_endian() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 1).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = Vec::new();
        write_string(&mut buf, "door 2").unwrap();
        let s = read_string(&mut Cursor::new(buf)).unwrap();
        assert_eq!(s, "door 2");
    }

    #[test]
    fn test_truncated_string_is_io_error() {
        let mut buf = Vec::new();
        write_string(&mut buf, "wait").unwrap();
        buf.truncate(6);
        let err = read_string(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_bad_flag_is_format_error() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 7).unwrap();
        let err = read_bool(&mut Cursor::new(buf), "mask flag").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -3).unwrap();
        assert!(read_usize(&mut Cursor::new(buf), "count").is_err());
    }
}
