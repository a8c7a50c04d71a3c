//! AMF3 (Action Message Format 3) decoding
//!
//! AMF3 is the ActionScript 3.0 serialization format used by Flash Player,
//! Flex remoting and RTMP's AMF3 command messages. This module decodes an
//! AMF3 byte stream into an object graph.
//!
//! Shared and cyclic values are kept as [`ObjectRef`] handles into the
//! decoder's object table, so graphs round-trip with their identity intact.
//! Host types plug in through [`ClassRegistry`]; the default
//! [`DynamicRegistry`] decodes every object as a [`DynamicObject`].

pub mod amf3;
pub mod class;
pub mod registry;
pub mod source;
pub mod tables;
pub mod utf8;
pub mod value;
pub mod vlq;

#[cfg(test)]
pub(crate) mod test_support;

pub use amf3::{decode, decode_all, decode_reader, Amf3Decoder, DynamicGraph, Graph};
pub use class::{
    ClassDescriptor, ClassRegistry, Deferred, DocumentBuilder, Encoding, Externalizer, Instance,
    RawXml, ValueReader,
};
pub use registry::{DynamicObject, DynamicRegistry, SourceExternalizer};
pub use source::{ByteSource, IoSource};
pub use tables::{ObjectTable, ReferenceTable, Slot};
pub use value::{Amf3Value, ArrayKey, Complex, DocumentRef, ObjectRef};
