//! amf3-rs: AMF3 decoder for Flash/Flex object graphs
//!
//! This library decodes AMF3 (Action Message Format 3) streams:
//! - All thirteen AMF3 value types, including XML and byte arrays
//! - String, object and class-traits reference tables shared across a stream
//! - Shared and cyclic object graphs, addressed by [`ObjectRef`](amf::ObjectRef)
//! - Pluggable class registries, externalizers and XML document builders
//! - Flex `ArrayCollection`, `ArrayList` and `ObjectProxy` out of the box
//!
//! # Example: Decode a Buffer
//!
//! ```no_run
//! use amf3_rs::amf::{Amf3Decoder, Amf3Value, Complex};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let data = std::fs::read("message.amf3")?;
//!     let mut decoder = Amf3Decoder::new(bytes::Bytes::from(data));
//!
//!     while decoder.has_remaining()? {
//!         match decoder.decode()? {
//!             Amf3Value::Object(r) => match decoder.object(r) {
//!                 Some(Complex::Object(obj)) => println!("{} {}", r, obj.class_name()),
//!                 Some(other) => println!("{} {}", r, other.kind()),
//!                 None => println!("{} (under construction)", r),
//!             },
//!             value => println!("{:?}", value),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod amf;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use amf::{Amf3Decoder, Amf3Value, DynamicObject, DynamicRegistry, ObjectRef};
pub use config::DecoderConfig;
pub use error::{AmfError, Error, Result};
