use std::any::Any;
use std::fmt::Debug;
use std::io::{Read, Seek};
use std::rc::{Rc, Weak};

use binread::BinReaderExt;
use slog::{debug, Logger};

use crate::config::ReaderConfig;
use crate::error::Error;
use crate::package::Package;
use crate::property::{ObjectRef, Properties, PropertyValue};
use crate::reader::PropertyReader;
use crate::stream::CompactIndex;
use crate::Result;

/// Runtime view of any object stored in a package.
pub trait UObject: Any + Debug {
    fn object(&self) -> &Object;

    /// Name of the concrete kind, as reported in cast failures.
    fn kind(&self) -> &'static str;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// The common object part as a shared handle of its own.
    fn into_object(self: Rc<Self>) -> Rc<Object>;

    /// Whether this object is of the given kind or derives from it.
    fn is_kind(&self, kind: &str) -> bool {
        kind == self.kind()
    }

    fn name(&self) -> &str {
        &self.object().name
    }

    fn properties(&self) -> &Properties {
        &self.object().properties
    }

    fn has_scalar(&self, name: &str) -> bool {
        self.object().properties.has_scalar(name)
    }

    fn get_scalar(&self, name: &str) -> Result<&PropertyValue> {
        self.object().properties.get_scalar(name)
    }

    fn get_object(&self, name: &str) -> Result<Option<Rc<dyn UObject>>> {
        self.object().properties.get_object(name)
    }
}

/// Object kinds that can be the target of [`cast`] and [`try_cast`].
pub trait ObjectClass: UObject {
    const KIND: &'static str;

    /// Converts a handle already known to satisfy `is_kind(Self::KIND)`.
    fn narrow(obj: Rc<dyn UObject>) -> Option<Rc<Self>>;
}

/// Narrows an object handle to the given kind or one of its bases.
///
/// An absent handle stays absent. A handle of an unrelated kind fails with
/// [`ErrorKind::TypeMismatch`](crate::error::ErrorKind::TypeMismatch). Narrowing to
/// [`Object`] always succeeds and yields the common object part.
pub fn cast<T: ObjectClass>(obj: Option<Rc<dyn UObject>>) -> Result<Option<Rc<T>>> {
    let obj = if let Some(obj) = obj {
        obj
    } else {
        return Ok(None);
    };

    let name = obj.name().to_owned();
    let kind = obj.kind();
    match narrow::<T>(obj) {
        Some(target) => Ok(Some(target)),
        None => Err(Error::type_mismatch(format!(
            "could not cast object {} of kind {} to {}",
            name,
            kind,
            T::KIND
        ))),
    }
}

pub fn try_cast<T: ObjectClass>(obj: Option<Rc<dyn UObject>>) -> Option<Rc<T>> {
    obj.and_then(narrow::<T>)
}

fn narrow<T: ObjectClass>(obj: Rc<dyn UObject>) -> Option<Rc<T>> {
    if obj.is_kind(T::KIND) {
        T::narrow(obj)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
enum BaseLink {
    Absent,
    Direct(Weak<Class>),
    Deferred(ObjectRef),
}

#[derive(Debug)]
pub struct Object {
    pub name: String,
    base: BaseLink,
    pub properties: Properties,
}

impl Object {
    /// Creates an object with no properties, e.g. a default or synthetic object.
    pub fn new<S: Into<String>>(name: S, base: Option<&Rc<Class>>) -> Self {
        Self {
            name: name.into(),
            base: match base {
                Some(class) => BaseLink::Direct(Rc::downgrade(class)),
                None => BaseLink::Absent,
            },
            properties: Properties::new(),
        }
    }

    /// Reads the object header (name index, class reference) followed by its property block.
    ///
    /// Any fatal error while reading the block is returned as is; the object must then be
    /// discarded, and the stream is no longer positioned at a record boundary.
    pub fn read<R: Read + Seek>(
        stream: &mut R,
        pkg: &Rc<Package>,
        config: &ReaderConfig,
        logger: &Logger,
    ) -> Result<Self> {
        let name = pkg.name_at(stream.read_le::<CompactIndex>()?.into())?.to_owned();
        let class_idx: i32 = stream.read_le::<CompactIndex>()?.into();
        let base = if class_idx == 0 {
            BaseLink::Absent
        } else {
            BaseLink::Deferred(ObjectRef::new(pkg, class_idx))
        };

        let logger = logger.new(slog::o!("object" => name.clone()));
        debug!(logger, "Reading object properties"; "class_idx" => class_idx);

        let mut properties = Properties::new();
        PropertyReader::new(stream, pkg, config, &logger).read_properties(&mut properties)?;

        Ok(Self {
            name,
            base,
            properties,
        })
    }

    /// The class this object was declared with, if it is known and currently loaded.
    pub fn base(&self) -> Option<Rc<Class>> {
        match &self.base {
            BaseLink::Absent => None,
            BaseLink::Direct(class) => class.upgrade(),
            BaseLink::Deferred(class_ref) => try_cast(class_ref.resolve().ok().flatten()),
        }
    }
}

impl UObject for Object {
    fn object(&self) -> &Object {
        self
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn into_object(self: Rc<Self>) -> Rc<Object> {
        self
    }
}

impl ObjectClass for Object {
    const KIND: &'static str = "Object";

    fn narrow(obj: Rc<dyn UObject>) -> Option<Rc<Self>> {
        Some(obj.into_object())
    }
}

/// Class object that other objects name as their base.
#[derive(Debug)]
pub struct Class {
    object: Rc<Object>,
    super_class: Option<ObjectRef>,
}

impl Class {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            object: Rc::new(Object::new(name, None)),
            super_class: None,
        }
    }

    /// Reads a class: the common object part, then the compact reference to its super class.
    pub fn read<R: Read + Seek>(
        stream: &mut R,
        pkg: &Rc<Package>,
        config: &ReaderConfig,
        logger: &Logger,
    ) -> Result<Self> {
        let object = Rc::new(Object::read(stream, pkg, config, logger)?);
        let super_idx: i32 = stream.read_le::<CompactIndex>()?.into();
        Ok(Self {
            object,
            super_class: if super_idx == 0 {
                None
            } else {
                Some(ObjectRef::new(pkg, super_idx))
            },
        })
    }

    pub fn super_class(&self) -> Result<Option<Rc<Class>>> {
        match &self.super_class {
            Some(super_ref) => cast(super_ref.resolve()?),
            None => Ok(None),
        }
    }
}

impl UObject for Class {
    fn object(&self) -> &Object {
        &self.object
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn into_object(self: Rc<Self>) -> Rc<Object> {
        Rc::clone(&self.object)
    }

    fn is_kind(&self, kind: &str) -> bool {
        kind == Self::KIND || self.object.is_kind(kind)
    }
}

impl ObjectClass for Class {
    const KIND: &'static str = "Class";

    fn narrow(obj: Rc<dyn UObject>) -> Option<Rc<Self>> {
        obj.into_any().downcast().ok()
    }
}
