//! Default class registry
//!
//! [`DynamicRegistry`] maps every wire class onto a [`DynamicObject`]: the
//! class name plus an ordered property list. Externalizable classes need an
//! externalizer registered by name; the Flex collection and proxy wrappers
//! are registered out of the box.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{BoxError, ContentError};

use super::class::{
    ClassDescriptor, ClassRegistry, Encoding, Externalizer, Instance, ValueReader,
};
use super::value::Amf3Value;

/// `mx.collections.ArrayCollection` on the wire
pub const FLEX_ARRAY_COLLECTION: &str = "flex.messaging.io.ArrayCollection";

/// `mx.collections.ArrayList` on the wire
pub const FLEX_ARRAY_LIST: &str = "flex.messaging.io.ArrayList";

/// `mx.utils.ObjectProxy` on the wire
pub const FLEX_OBJECT_PROXY: &str = "flex.messaging.io.ObjectProxy";

/// Property under which wrapper externalizers store the wrapped value
pub const SOURCE_PROPERTY: &str = "source";

/// Generic decoded object: class name plus properties in wire order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicObject {
    class_name: Rc<str>,
    properties: Vec<(Rc<str>, Amf3Value)>,
}

impl DynamicObject {
    pub fn new(class_name: Rc<str>) -> Self {
        Self {
            class_name,
            properties: Vec::new(),
        }
    }

    /// Wire class name, empty for anonymous objects
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_anonymous(&self) -> bool {
        self.class_name.is_empty()
    }

    /// Set a property; an existing name keeps its position
    pub fn set(&mut self, name: Rc<str>, value: Amf3Value) {
        match self.properties.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Amf3Value> {
        self.properties
            .iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| v)
    }

    /// Get a string property
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    /// Get a number property
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_number()
    }

    /// Properties in the order they were set
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Amf3Value)> {
        self.properties.iter().map(|(k, v)| (&**k, v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Traits of one wire class, as decoded
pub struct DynamicDescriptor {
    class_name: Rc<str>,
    encoding: Encoding,
    properties: Vec<Rc<str>>,
    externalizer: Option<Rc<dyn Externalizer<DynamicObject>>>,
}

impl std::fmt::Debug for DynamicDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicDescriptor")
            .field("class_name", &self.class_name)
            .field("encoding", &self.encoding)
            .field("properties", &self.properties)
            .field("externalizer", &self.externalizer.is_some())
            .finish()
    }
}

impl ClassDescriptor for DynamicDescriptor {
    type Object = DynamicObject;

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn define_property(&mut self, name: Rc<str>) {
        self.properties.push(name);
    }

    fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn property_name(&self, index: usize) -> Option<&str> {
        self.properties.get(index).map(|n| &**n)
    }

    fn externalizer(&self) -> Option<Rc<dyn Externalizer<DynamicObject>>> {
        self.externalizer.clone()
    }

    fn new_instance(&self) -> Result<Instance<DynamicObject>, BoxError> {
        Ok(Instance::Ready(DynamicObject::new(self.class_name.clone())))
    }

    fn set_property(
        &self,
        instance: &mut DynamicObject,
        index: usize,
        value: Amf3Value,
    ) -> Result<(), BoxError> {
        let name = self
            .properties
            .get(index)
            .ok_or_else(|| format!("no sealed property at position {}", index))?;
        instance.set(name.clone(), value);
        Ok(())
    }

    fn set_dynamic_property(
        &self,
        instance: &mut DynamicObject,
        name: Rc<str>,
        value: Amf3Value,
    ) -> Result<(), BoxError> {
        instance.set(name, value);
        Ok(())
    }
}

/// Registry producing [`DynamicObject`]s for every class
pub struct DynamicRegistry {
    externalizers: HashMap<String, Rc<dyn Externalizer<DynamicObject>>>,
}

impl DynamicRegistry {
    /// Registry with the Flex wrapper externalizers installed
    pub fn new() -> Self {
        let wrapper: Rc<dyn Externalizer<DynamicObject>> = Rc::new(SourceExternalizer);
        let mut externalizers = HashMap::new();
        for class_name in [FLEX_ARRAY_COLLECTION, FLEX_ARRAY_LIST, FLEX_OBJECT_PROXY] {
            externalizers.insert(class_name.to_string(), wrapper.clone());
        }
        Self { externalizers }
    }

    /// Registry with no externalizers at all
    pub fn empty() -> Self {
        Self {
            externalizers: HashMap::new(),
        }
    }

    /// Use `externalizer` for every externalizable object of `class_name`
    pub fn with_externalizer(
        mut self,
        class_name: impl Into<String>,
        externalizer: Rc<dyn Externalizer<DynamicObject>>,
    ) -> Self {
        self.externalizers.insert(class_name.into(), externalizer);
        self
    }

    pub fn has_externalizer(&self, class_name: &str) -> bool {
        self.externalizers.contains_key(class_name)
    }
}

impl Default for DynamicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry for DynamicRegistry {
    type Object = DynamicObject;
    type Descriptor = DynamicDescriptor;

    fn descriptor(&mut self, class_name: Rc<str>, encoding: Encoding) -> DynamicDescriptor {
        let externalizer = self.externalizers.get(&*class_name).cloned();
        DynamicDescriptor {
            class_name,
            encoding,
            properties: Vec::new(),
            externalizer,
        }
    }
}

/// Externalizer for wrapper classes whose body is exactly one value
///
/// The value lands in the [`SOURCE_PROPERTY`] property.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceExternalizer;

impl Externalizer<DynamicObject> for SourceExternalizer {
    fn construct(
        &self,
        class_name: &str,
        _input: &mut dyn ValueReader,
    ) -> Result<Instance<DynamicObject>, BoxError> {
        Ok(Instance::Ready(DynamicObject::new(Rc::from(class_name))))
    }

    fn read_content(
        &self,
        instance: &mut Instance<DynamicObject>,
        input: &mut dyn ValueReader,
    ) -> Result<(), ContentError> {
        let source = input.read_value()?;
        match instance {
            Instance::Ready(object) => object.set(Rc::from(SOURCE_PROPERTY), source),
            Instance::Deferred(placeholder) => {
                placeholder.set_property(SOURCE_PROPERTY, source)?
            }
        }
        Ok(())
    }
}
