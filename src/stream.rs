use std::io::{Read, Seek, SeekFrom};

use binread::{BinRead, BinReaderExt, BinResult, ReadOptions};

/// Variable-width signed integer used for name, object and length fields.
///
/// The first byte carries the sign (bit 7), a continuation flag (bit 6) and six value bits.
/// Up to three following bytes carry seven value bits each plus a continuation flag, and a
/// fifth byte contributes its full eight bits.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CompactIndex(pub i32);

impl From<CompactIndex> for i32 {
    fn from(idx: CompactIndex) -> Self {
        idx.0
    }
}

impl BinRead for CompactIndex {
    type Args = ();
    fn read_options<R: Read + Seek>(
        reader: &mut R,
        options: &ReadOptions,
        _: Self::Args,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let first = u8::read_options(reader, options, ())?;

        let mut value = (first & 0x3f) as i64;
        let mut more = (first & 0x40) != 0;
        let mut shift = 6;
        while more {
            let byte = u8::read_options(reader, options, ())?;
            if shift == 27 {
                value |= (byte as i64) << shift;
                break;
            }
            value |= ((byte & 0x7f) as i64) << shift;
            more = (byte & 0x80) != 0;
            shift += 7;
        }

        if (first & 0x80) != 0 {
            value = -value;
        }

        match i32::try_from(value) {
            Ok(value) => BinResult::Ok(Self(value)),
            Err(_) => BinResult::Err(binread::Error::AssertFail {
                pos,
                message: format!("compact index out of range: {}", value),
            }),
        }
    }
}

/// Array index that follows the property header of array elements.
///
/// Stored big-end first in one, two or four bytes, selected by the top two bits of the
/// first byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ArrayIndex(pub u32);

impl BinRead for ArrayIndex {
    type Args = ();
    fn read_options<R: Read + Seek>(
        reader: &mut R,
        options: &ReadOptions,
        _: Self::Args,
    ) -> BinResult<Self> {
        let first = u8::read_options(reader, options, ())? as u32;
        let index = if (first & 0xc0) == 0xc0 {
            let mut index = first & 0x3f;
            for _ in 0..3 {
                index = (index << 8) | u8::read_options(reader, options, ())? as u32;
            }
            index
        } else if (first & 0x80) != 0 {
            ((first & 0x7f) << 8) | u8::read_options(reader, options, ())? as u32
        } else {
            first
        };
        BinResult::Ok(Self(index))
    }
}

/// Length-prefixed text. A negative length counts UCS-2 code units instead of bytes, and
/// the count includes the terminator.
///
/// The argument is the number of bytes the text may occupy, prefix included. A length
/// that does not fit fails before anything is allocated.
pub struct UString(pub String);

impl From<UString> for String {
    fn from(s: UString) -> Self {
        s.0
    }
}

impl BinRead for UString {
    type Args = (u64,);
    fn read_options<R: Read + Seek>(
        reader: &mut R,
        options: &ReadOptions,
        (limit,): Self::Args,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let len = CompactIndex::read_options(reader, options, ())?.0;
        let prefix_size = reader.stream_position()? - pos;

        let wide = len < 0;
        let units = len.unsigned_abs() as u64;
        let body_size = if wide { units * 2 } else { units };
        if body_size > limit.saturating_sub(prefix_size) {
            return BinResult::Err(binread::Error::AssertFail {
                pos,
                message: format!(
                    "text length {} does not fit in {} bytes",
                    len,
                    limit.saturating_sub(prefix_size)
                ),
            });
        }

        let text = if wide {
            let mut buf = Vec::with_capacity(units as usize);
            for _ in 0..units {
                buf.push(u16::read_options(reader, options, ())?);
            }
            let end = buf.iter().position(|&unit| unit == 0).unwrap_or(buf.len());
            let mut utf8_bytes = vec![0u8; end * 3];
            let utf8_len = ucs2::decode(&buf[..end], &mut utf8_bytes)
                .map_err(|err| binread::Error::Custom {
                    pos,
                    err: Box::new(err),
                })?;
            utf8_bytes.truncate(utf8_len);
            String::from_utf8_lossy(&utf8_bytes).into_owned()
        } else {
            let mut bytes = vec![0u8; units as usize];
            reader.read_exact(&mut bytes)?;
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        };

        BinResult::Ok(Self(text))
    }
}

/// Reads a fixed-size text field, dropping everything from the first NUL onward.
pub(crate) fn read_fixed_string<R: Read + Seek>(
    stream: &mut R,
    size: usize,
) -> std::io::Result<String> {
    let mut bytes = vec![0u8; size];
    stream.read_exact(&mut bytes)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

pub(crate) fn skip<R: Read + Seek>(stream: &mut R, count: u64) -> std::io::Result<()> {
    if count != 0 {
        stream.seek(SeekFrom::Current(count as i64))?;
    }
    Ok(())
}
