#![allow(dead_code)]

use std::io::Cursor;
use std::rc::Rc;

use slog::Logger;
use uprops::logger::create_discard_logger;
use uprops::{Package, PropertyType};

/// Assembles property blocks byte by byte, interning names as it goes.
pub struct BlockBuilder {
    names: Vec<String>,
    bytes: Vec<u8>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self {
            names: vec!["None".to_string()],
            bytes: Vec::new(),
        }
    }

    pub fn name_index(&mut self, text: &str) -> i32 {
        if let Some(idx) = self.names.iter().position(|name| name == text) {
            return idx as i32;
        }
        self.names.push(text.to_string());
        (self.names.len() - 1) as i32
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn compact(&mut self, value: i32) -> &mut Self {
        self.bytes.extend(compact(value));
        self
    }

    pub fn name(&mut self, text: &str) -> &mut Self {
        let idx = self.name_index(text);
        self.compact(idx)
    }

    pub fn end(&mut self) -> &mut Self {
        self.name("None")
    }

    /// Writes a full record, picking the shortest size code that fits the payload.
    pub fn property(
        &mut self,
        name: &str,
        property_type: PropertyType,
        struct_name: Option<&str>,
        array_index: Option<u32>,
        payload: &[u8],
    ) -> &mut Self {
        let (size_code, explicit_size) = match payload.len() {
            1 => (0, vec![]),
            2 => (1, vec![]),
            4 => (2, vec![]),
            12 => (3, vec![]),
            16 => (4, vec![]),
            len if len < 0x100 => (5, vec![len as u8]),
            len if len < 0x10000 => (6, (len as u16).to_le_bytes().to_vec()),
            len => (7, (len as u32).to_le_bytes().to_vec()),
        };
        self.property_with_size(
            name,
            property_type,
            struct_name,
            array_index,
            size_code,
            &explicit_size,
            payload,
        )
    }

    pub fn property_with_size(
        &mut self,
        name: &str,
        property_type: PropertyType,
        struct_name: Option<&str>,
        array_index: Option<u32>,
        size_code: u8,
        explicit_size: &[u8],
        payload: &[u8],
    ) -> &mut Self {
        let mut info = property_type as u8 | (size_code << 4);
        if array_index.is_some() {
            info |= 0x80;
        }
        self.name(name).raw(&[info]);
        if let Some(struct_name) = struct_name {
            self.name(struct_name);
        }
        self.raw(explicit_size);
        if let Some(idx) = array_index {
            self.raw(&array_index_bytes(idx));
        }
        self.raw(payload)
    }

    pub fn bool_property(&mut self, name: &str, value: bool) -> &mut Self {
        let info = PropertyType::Bool as u8 | if value { 0x80 } else { 0 };
        self.name(name).raw(&[info])
    }

    pub fn int_property(&mut self, name: &str, value: i32) -> &mut Self {
        self.property(name, PropertyType::Int, None, None, &value.to_le_bytes())
    }

    pub fn float_property(&mut self, name: &str, value: f32) -> &mut Self {
        self.property(name, PropertyType::Float, None, None, &value.to_le_bytes())
    }

    pub fn object_property(&mut self, name: &str, index: i32) -> &mut Self {
        self.property(name, PropertyType::Object, None, None, &compact(index))
    }

    pub fn vector_property(&mut self, name: &str, x: f32, y: f32, z: f32) -> &mut Self {
        let payload = [x.to_le_bytes(), y.to_le_bytes(), z.to_le_bytes()].concat();
        self.property(name, PropertyType::Struct, Some("Vector"), None, &payload)
    }

    pub fn package(&self, logger: &Logger) -> Rc<Package> {
        Package::new(logger, "TestPackage", self.names.clone())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn cursor(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes.clone())
    }
}

pub fn compact(value: i32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = value.unsigned_abs();

    let mut first = (rest & 0x3f) as u8;
    if value < 0 {
        first |= 0x80;
    }
    rest >>= 6;
    if rest > 0 {
        first |= 0x40;
    }
    out.push(first);

    while rest > 0 {
        if out.len() == 4 {
            out.push(rest as u8);
            break;
        }
        let mut byte = (rest & 0x7f) as u8;
        rest >>= 7;
        if rest > 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }

    out
}

pub fn array_index_bytes(idx: u32) -> Vec<u8> {
    if idx < 0x80 {
        vec![idx as u8]
    } else if idx < 0x4000 {
        vec![0x80 | (idx >> 8) as u8, idx as u8]
    } else {
        vec![
            0xc0 | (idx >> 24) as u8,
            (idx >> 16) as u8,
            (idx >> 8) as u8,
            idx as u8,
        ]
    }
}

pub fn logger() -> Logger {
    create_discard_logger()
}
