use std::io::{Read, Seek};
use std::rc::Rc;

use binread::BinReaderExt;
use slog::{trace, Logger};

use crate::config::ReaderConfig;
use crate::error::Error;
use crate::package::Package;
use crate::property::{
    ObjectRef, Properties, PropertyRecord, PropertyType, PropertyValue, Rotator, StructType,
    Vector,
};
use crate::stream::{read_fixed_string, skip, ArrayIndex, CompactIndex, UString};
use crate::Result;

/// Decodes a property block into [`Properties`].
///
/// Each record starts with a compact name index, an info byte (type tag in bits 0..3, size
/// code in bits 4..6, array flag or boolean value in bit 7), the struct name for struct
/// records, an optional explicit size, and the array index for array elements. The block
/// ends with a record named `None`.
pub struct PropertyReader<'s, 'p, R: Read + Seek> {
    stream: &'s mut R,
    pkg: &'p Rc<Package>,
    strict_sizes: bool,
    logger: Logger,
}

impl<'s, 'p, R: Read + Seek> PropertyReader<'s, 'p, R> {
    pub fn new(
        stream: &'s mut R,
        pkg: &'p Rc<Package>,
        config: &ReaderConfig,
        logger: &Logger,
    ) -> Self {
        Self {
            stream,
            pkg,
            strict_sizes: config.strict_sizes,
            logger: logger.clone(),
        }
    }

    /// Reads records up to and including the terminator.
    ///
    /// On error, `props` holds every record decoded before the failing one.
    pub fn read_properties(&mut self, props: &mut Properties) -> Result<()> {
        while let Some(record) = self.read_property()? {
            props.push(record);
        }
        trace!(self.logger, "Finished property block"; "count" => props.len());
        Ok(())
    }

    /// Reads the next record, or `None` once the terminator has been consumed.
    pub fn read_property(&mut self) -> Result<Option<PropertyRecord>> {
        let name = self.read_name()?;
        if name.eq_ignore_ascii_case(NAME_NONE) {
            return Ok(None);
        }

        let info: u8 = self.stream.read_le()?;
        let property_type = PropertyType::from_repr(info & INFO_TYPE_MASK).unwrap_or_default();
        let flag = (info & INFO_ARRAY_FLAG) != 0;

        let struct_type = if property_type == PropertyType::Struct {
            let idx = self.read_index()?;
            self.pkg.struct_type(idx)?
        } else {
            StructType::Invalid
        };

        let size = self.read_size(info)?;

        let (is_array, array_index) = if flag && property_type != PropertyType::Bool {
            (true, self.stream.read_le::<ArrayIndex>()?.0)
        } else {
            (false, 0)
        };

        trace!(
            self.logger,
            "Read property header";
            "name" => &name,
            "type" => property_type.as_ref(),
            "struct" => struct_type.as_ref(),
            "size" => size,
            "array_index" => if is_array { Some(array_index) } else { None }
        );

        let start = self.stream.stream_position()?;
        let (value, payload) = match property_type {
            PropertyType::Invalid => {
                return Err(Error::stream_desync(format!(
                    "property '{}' has no decodable type (info byte {:#04x})",
                    name, info
                )))
            }
            PropertyType::Byte => (PropertyValue::Byte(self.stream.read_le()?), Payload::Decoded),
            PropertyType::Int => (PropertyValue::Int(self.stream.read_le()?), Payload::Decoded),
            PropertyType::Bool => (PropertyValue::Bool(flag), Payload::Inline),
            PropertyType::Float => (PropertyValue::Float(self.stream.read_le()?), Payload::Decoded),
            PropertyType::Object | PropertyType::Class => {
                let idx = self.read_index()?;
                (
                    PropertyValue::Object(ObjectRef::new(self.pkg, idx)),
                    Payload::Decoded,
                )
            }
            PropertyType::Name => (PropertyValue::Text(self.read_name()?), Payload::Decoded),
            PropertyType::String => (
                PropertyValue::Text(read_fixed_string(self.stream, size as usize)?),
                Payload::Decoded,
            ),
            PropertyType::Str => (PropertyValue::Text(self.read_text(size)?), Payload::Decoded),
            PropertyType::Vector => (PropertyValue::Vector(self.read_vector()?), Payload::Decoded),
            PropertyType::Rotator => {
                (PropertyValue::Rotator(self.read_rotator()?), Payload::Decoded)
            }
            PropertyType::Struct => match struct_type {
                StructType::Vector => (PropertyValue::Vector(self.read_vector()?), Payload::Decoded),
                StructType::Rotator => {
                    (PropertyValue::Rotator(self.read_rotator()?), Payload::Decoded)
                }
                kind => (PropertyValue::Struct { kind, size }, Payload::Skipped),
            },
            PropertyType::Array => {
                let len = self.read_index()?;
                (PropertyValue::Array { len, size }, Payload::Skipped)
            }
            PropertyType::Map | PropertyType::FixedArray => {
                (PropertyValue::Opaque { size }, Payload::Skipped)
            }
        };

        if payload != Payload::Inline {
            self.finish_payload(&name, start, size, payload)?;
        }

        Ok(Some(PropertyRecord {
            name,
            property_type,
            is_array,
            array_index,
            value,
        }))
    }

    fn finish_payload(&mut self, name: &str, start: u64, size: u32, payload: Payload) -> Result<()> {
        let consumed = self.stream.stream_position()? - start;
        let size = size as u64;

        if consumed > size {
            return Err(Error::stream_desync(format!(
                "property '{}' read {} bytes past its declared size of {}",
                name,
                consumed - size,
                size
            )));
        }

        if consumed < size {
            if payload == Payload::Decoded {
                if self.strict_sizes {
                    return Err(Error::stream_desync(format!(
                        "property '{}' left {} of its {} bytes unread",
                        name,
                        size - consumed,
                        size
                    )));
                }
                trace!(self.logger, "Skipping unread payload bytes"; "name" => name, "count" => size - consumed);
            }
            skip(self.stream, size - consumed)?;
        }

        Ok(())
    }

    fn read_size(&mut self, info: u8) -> Result<u32> {
        Ok(match (info & INFO_SIZE_MASK) >> 4 {
            0 => 1,
            1 => 2,
            2 => 4,
            3 => 12,
            4 => 16,
            5 => self.stream.read_le::<u8>()?.into(),
            6 => self.stream.read_le::<u16>()?.into(),
            _ => self.stream.read_le::<u32>()?,
        })
    }

    fn read_index(&mut self) -> Result<i32> {
        Ok(self.stream.read_le::<CompactIndex>()?.into())
    }

    fn read_name(&mut self) -> Result<String> {
        let idx = self.read_index()?;
        Ok(self.pkg.name_at(idx)?.to_owned())
    }

    fn read_text(&mut self, size: u32) -> Result<String> {
        Ok(self.stream.read_le_args::<UString>((size.into(),))?.into())
    }

    fn read_vector(&mut self) -> Result<Vector> {
        Ok(self.stream.read_le()?)
    }

    fn read_rotator(&mut self) -> Result<Rotator> {
        Ok(self.stream.read_le()?)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Payload {
    Decoded,
    Skipped,
    Inline,
}

const NAME_NONE: &str = "None";

const INFO_TYPE_MASK: u8 = 0x0f;
const INFO_SIZE_MASK: u8 = 0x70;
const INFO_ARRAY_FLAG: u8 = 0x80;
