use std::fmt::Display;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use binread::BinRead;
use strum_macros::{AsRefStr, EnumCount, EnumIter, EnumString, FromRepr};

use crate::error::Error;
use crate::object::UObject;
use crate::package::Package;
use crate::Result;

/// Type tag stored in the low four bits of a property's info byte.
#[derive(AsRefStr, EnumCount, EnumIter, FromRepr, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum PropertyType {
    #[default]
    Invalid,
    Byte,
    Int,
    Bool,
    Float,
    Object,
    Name,
    String,
    Class,
    Array,
    Struct,
    Vector,
    Rotator,
    Str,
    Map,
    FixedArray,
}

/// Layout of a struct-typed property, resolved from the struct name that follows the info
/// byte.
#[derive(AsRefStr, EnumIter, EnumString, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[strum(ascii_case_insensitive)]
pub enum StructType {
    #[default]
    Invalid,
    Vector,
    Matrix,
    Plane,
    Sphere,
    Scale,
    Coords,
    ModelCoords,
    Rotator,
    Box,
    Color,
    Palette,
    Mipmap,
    PointRegion,
}

impl StructType {
    pub fn from_name(name: &str) -> Self {
        Self::from_str(name).unwrap_or_default()
    }
}

#[derive(BinRead, Debug, Default, PartialEq, Clone, Copy)]
#[br(little)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Orientation in engine angle units, where 65536 units make a full turn.
#[derive(BinRead, Debug, Default, PartialEq, Clone, Copy)]
#[br(little)]
pub struct Rotator {
    #[br(map = |v: i32| v as f32)]
    pub pitch: f32,
    #[br(map = |v: i32| v as f32)]
    pub yaw: f32,
    #[br(map = |v: i32| v as f32)]
    pub roll: f32,
}

impl Rotator {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn to_degrees(&self) -> (f32, f32, f32) {
        let scale = 360.0 / ROTATOR_FULL_TURN;
        (self.pitch * scale, self.yaw * scale, self.roll * scale)
    }

    pub fn to_radians(&self) -> (f32, f32, f32) {
        let scale = std::f32::consts::TAU / ROTATOR_FULL_TURN;
        (self.pitch * scale, self.yaw * scale, self.roll * scale)
    }
}

/// Unresolved reference to an object in a package's object table.
///
/// Only the package handle and the compact object index are kept. Every call to
/// [`resolve`](Self::resolve) consults the package again, so a reference that could not be
/// resolved earlier will succeed once the target gets registered.
#[derive(Debug, Clone)]
pub struct ObjectRef {
    package: Weak<Package>,
    index: i32,
}

impl ObjectRef {
    pub fn new(package: &Rc<Package>, index: i32) -> Self {
        Self {
            package: Rc::downgrade(package),
            index,
        }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn is_null(&self) -> bool {
        self.index == 0
    }

    pub fn package(&self) -> Option<Rc<Package>> {
        self.package.upgrade()
    }

    /// Looks up the referenced object.
    ///
    /// A null reference resolves to `None`. An index the package does not (yet) know fails
    /// with [`ErrorKind::UnresolvedReference`](crate::error::ErrorKind::UnresolvedReference).
    pub fn resolve(&self) -> Result<Option<Rc<dyn UObject>>> {
        if self.is_null() {
            return Ok(None);
        }

        let pkg = if let Some(pkg) = self.package.upgrade() {
            pkg
        } else {
            return Err(Error::unresolved_reference(format!(
                "package of object {} is no longer loaded",
                self.index
            )));
        };

        match pkg.object(self.index) {
            Some(obj) => Ok(Some(obj)),
            None => Err(Error::unresolved_reference(format!(
                "object {} is not registered in package {}",
                self.index,
                pkg.name()
            ))),
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Weak::ptr_eq(&self.package, &other.package)
    }
}

/// Decoded payload of one property record.
///
/// The variant always agrees with the record's [`PropertyType`]: `Name`, `String` and `Str`
/// records hold `Text`, `Object` and `Class` records hold `Object`, and `Vector`/`Rotator`
/// structs are flattened into their own variants. Payloads that are skipped keep only their
/// size metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Byte(u8),
    Int(i32),
    Bool(bool),
    Float(f32),
    Object(ObjectRef),
    Vector(Vector),
    Rotator(Rotator),
    Text(String),
    Array { len: i32, size: u32 },
    Struct { kind: StructType, size: u32 },
    Opaque { size: u32 },
}

impl PropertyValue {
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Self::Byte(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj_ref) => Some(obj_ref),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector> {
        match self {
            Self::Vector(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_rotator(&self) -> Option<Rotator> {
        match self {
            Self::Rotator(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Byte(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Object(obj_ref) => write!(f, "object#{}", obj_ref.index),
            Self::Vector(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Self::Rotator(r) => write!(f, "(P={}, Y={}, R={})", r.pitch, r.yaw, r.roll),
            Self::Text(value) => write!(f, "{:?}", value),
            Self::Array { len, size } => write!(f, "[{} elements, {} bytes]", len, size),
            Self::Struct { kind, size } => write!(f, "<{} struct, {} bytes>", kind.as_ref(), size),
            Self::Opaque { size } => write!(f, "<{} bytes>", size),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub name: String,
    pub property_type: PropertyType,
    pub is_array: bool,
    pub array_index: u32,
    pub value: PropertyValue,
}

impl Display for PropertyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_array {
            write!(f, "{}[{}]", self.name, self.array_index)?;
        } else {
            f.write_str(&self.name)?;
        }
        write!(f, ": {} = {}", self.property_type.as_ref(), self.value)
    }
}

/// Ordered property records of one object, in stream order.
///
/// Names are not unique: each element of an array property is its own record. Lookups by
/// name return the first matching record.
#[derive(Debug, Default, Clone)]
pub struct Properties {
    records: Vec<PropertyRecord>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_scalar(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn get_scalar(&self, name: &str) -> Result<&PropertyValue> {
        match self.find(name) {
            Some(record) => Ok(&record.value),
            None => Err(Error::not_found(format!("property '{}' not found", name))),
        }
    }

    /// Resolves an object-typed property through its package.
    pub fn get_object(&self, name: &str) -> Result<Option<Rc<dyn UObject>>> {
        match self.get_scalar(name)? {
            PropertyValue::Object(obj_ref) => obj_ref.resolve(),
            _ => Err(Error::type_mismatch(format!(
                "property '{}' is not an object reference",
                name
            ))),
        }
    }

    /// All records with the given name, i.e. every stored element of an array property.
    pub fn array<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s PropertyRecord> {
        self.records.iter().filter(move |record| record.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn push(&mut self, record: PropertyRecord) {
        self.records.push(record);
    }

    fn find(&self, name: &str) -> Option<&PropertyRecord> {
        self.records.iter().find(|record| record.name == name)
    }
}

impl<'p> IntoIterator for &'p Properties {
    type Item = &'p PropertyRecord;
    type IntoIter = std::slice::Iter<'p, PropertyRecord>;
    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

const ROTATOR_FULL_TURN: f32 = 65536.0;
