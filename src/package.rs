use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::rc::Rc;

use slog::{trace, warn, Logger};

use crate::config::ReaderConfig;
use crate::error::Error;
use crate::object::{Object, UObject};
use crate::property::StructType;
use crate::Result;

/// Name table and object table shared by all objects of one package.
///
/// Objects are registered under their compact object index (positive for exports, negative
/// for imports) and may arrive in any order. Property values only hold the index, so
/// references to objects registered later still resolve once the target is present.
pub struct Package {
    logger: Logger,
    name: String,
    names: Vec<String>,
    objects: RefCell<HashMap<i32, Rc<dyn UObject>>>,
}

impl Package {
    pub fn new<S: Into<String>>(logger: &Logger, name: S, names: Vec<String>) -> Rc<Self> {
        let name = name.into();
        Rc::new(Self {
            logger: logger.new(slog::o!("package" => name.clone())),
            name,
            names,
            objects: RefCell::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name_at(&self, index: i32) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.names.get(index))
            .map(String::as_str)
            .ok_or_else(|| {
                Error::invalid_data(format!(
                    "name index {} out of range in package {} ({} names)",
                    index,
                    self.name,
                    self.names.len()
                ))
            })
    }

    pub fn name_index(&self, text: &str) -> Option<i32> {
        self.names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(text))
            .map(|index| index as i32)
    }

    pub fn struct_type(&self, index: i32) -> Result<StructType> {
        let name = self.name_at(index)?;
        let struct_type = StructType::from_name(name);
        if struct_type == StructType::Invalid {
            trace!(self.logger, "Unknown struct type"; "struct_name" => name);
        }
        Ok(struct_type)
    }

    pub fn object(&self, index: i32) -> Option<Rc<dyn UObject>> {
        self.objects.borrow().get(&index).cloned()
    }

    pub fn register(&self, index: i32, obj: Rc<dyn UObject>) {
        trace!(self.logger, "Registering object"; "index" => index, "name" => obj.name());
        if let Some(prev) = self.objects.borrow_mut().insert(index, obj) {
            warn!(self.logger, "Replaced registered object"; "index" => index, "prev" => prev.name());
        }
    }

    /// Reads an object from a stream positioned at its header and registers it.
    ///
    /// Nothing is registered when reading fails.
    pub fn load_object<R: Read + Seek>(
        self: &Rc<Self>,
        index: i32,
        stream: &mut R,
        config: &ReaderConfig,
    ) -> Result<Rc<Object>> {
        let obj = match Object::read(stream, self, config, &self.logger) {
            Ok(obj) => Rc::new(obj),
            Err(err) => {
                warn!(self.logger, "Failed to load object"; "index" => index, "error" => err.to_string());
                return Err(err);
            }
        };
        self.register(index, Rc::clone(&obj) as Rc<dyn UObject>);
        Ok(obj)
    }
}
