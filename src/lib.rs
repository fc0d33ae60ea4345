//! Reader for the self-describing property blocks of legacy Unreal packages.
//!
//! A property block is a sequence of named, typed records ending with a record named
//! `None`. [`PropertyReader`] decodes such a block into [`Properties`], and objects built
//! from a stream ([`Object::read`]) carry the decoded table. Object references are kept as
//! package-local indices and resolved against the [`Package`] each time they are queried.

pub mod config;
pub mod error;
pub mod logger;
pub mod object;
pub mod package;
pub mod property;
mod reader;
pub mod stream;

pub use self::config::ReaderConfig;
pub use self::error::{Error, ErrorKind};
pub use self::object::{cast, try_cast, Class, Object, ObjectClass, UObject};
pub use self::package::Package;
pub use self::property::{
    ObjectRef, Properties, PropertyRecord, PropertyType, PropertyValue, Rotator, StructType,
    Vector,
};
pub use self::reader::PropertyReader;

pub type Result<T> = std::result::Result<T, Error>;
