//! AMF3 value types
//!
//! Scalars are carried inline. Everything the wire format places in the
//! object reference table (dates, arrays, byte arrays, objects) lives in the
//! decoder's [`ObjectTable`](super::tables::ObjectTable) and is referred to by
//! [`ObjectRef`], so shared and cyclic graphs need no aliasing: two fields
//! pointing at the same object hold the same `ObjectRef`.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

/// Index of a value in the object reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub(crate) usize);

impl ObjectRef {
    /// Position in the object table, in registration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a document produced by the decoder's document builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentRef(pub(crate) usize);

impl DocumentRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Decoded AMF3 value
#[derive(Debug, Clone, PartialEq)]
pub enum Amf3Value {
    /// Absent value: undefined (0x00), null (0x01), or a NaN number
    Null,

    /// Boolean (0x02 false, 0x03 true)
    Boolean(bool),

    /// 29-bit signed integer (0x04)
    Integer(i32),

    /// IEEE 754 double (0x05)
    Number(f64),

    /// String (0x06), shared with the string table
    String(Rc<str>),

    /// Typed XML document (0x07)
    Xml(DocumentRef),

    /// Raw XML text (0x0B)
    XmlString(Rc<str>),

    /// Date, array, byte array or object in the object table
    /// (0x08, 0x09, 0x0A, 0x0C)
    Object(ObjectRef),
}

impl Amf3Value {
    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf3Value::String(s) => Some(s),
            Amf3Value::XmlString(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf3Value::Number(n) => Some(*n),
            Amf3Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as an integer
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Amf3Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf3Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Object table reference, if this is a complex value
    pub fn as_object_ref(&self) -> Option<ObjectRef> {
        match self {
            Amf3Value::Object(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Amf3Value::Null)
    }
}

impl Default for Amf3Value {
    fn default() -> Self {
        Amf3Value::Null
    }
}

impl From<bool> for Amf3Value {
    fn from(v: bool) -> Self {
        Amf3Value::Boolean(v)
    }
}

impl From<f64> for Amf3Value {
    fn from(v: f64) -> Self {
        Amf3Value::Number(v)
    }
}

impl From<i32> for Amf3Value {
    fn from(v: i32) -> Self {
        Amf3Value::Integer(v)
    }
}

impl From<&str> for Amf3Value {
    fn from(v: &str) -> Self {
        Amf3Value::String(Rc::from(v))
    }
}

impl From<ObjectRef> for Amf3Value {
    fn from(v: ObjectRef) -> Self {
        Amf3Value::Object(v)
    }
}

/// Key of an associative array entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    /// Associative (string) key
    Name(Rc<str>),
    /// Dense portion index, 0..length-1
    Index(u32),
}

impl From<&str> for ArrayKey {
    fn from(v: &str) -> Self {
        ArrayKey::Name(Rc::from(v))
    }
}

impl From<u32> for ArrayKey {
    fn from(v: u32) -> Self {
        ArrayKey::Index(v)
    }
}

/// Value owned by an object table slot
#[derive(Debug, Clone, PartialEq)]
pub enum Complex<O> {
    /// Milliseconds since the Unix epoch
    Date(f64),

    /// Array with no associative entries
    Array(Vec<Amf3Value>),

    /// Array with associative entries; the dense portion is keyed by index
    AssocArray(HashMap<ArrayKey, Amf3Value>),

    ByteArray(Bytes),

    /// Host object built by the class registry
    Object(O),
}

impl<O> Complex<O> {
    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Complex::Date(_) => "date",
            Complex::Array(_) => "array",
            Complex::AssocArray(_) => "associative array",
            Complex::ByteArray(_) => "byte array",
            Complex::Object(_) => "object",
        }
    }

    pub fn as_date(&self) -> Option<f64> {
        match self {
            Complex::Date(ms) => Some(*ms),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Amf3Value]> {
        match self {
            Complex::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_assoc_array(&self) -> Option<&HashMap<ArrayKey, Amf3Value>> {
        match self {
            Complex::AssocArray(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Complex::ByteArray(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&O> {
        match self {
            Complex::Object(o) => Some(o),
            _ => None,
        }
    }
}
