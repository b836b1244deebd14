//! Contracts shared by the codec and engine backends: type tags, host
//! values, the engine boundary and the conversion error taxonomy.

pub mod config;
pub mod engine;
pub mod error;
pub mod types;
pub mod value;
pub mod wrappers;

pub use config::{BlobLength, CodecConfig};
pub use engine::{Engine, EngineResult, OwnedValue, Primitive, RawValue, ResultSet};
pub use error::{CollectionKind, ConversionError, EngineStatus, ErrorKind};
pub use types::{LogicalType, Shape, StructField, TypeId};
pub use value::{
    Blob, HostValue, InternalId, Interval, MapEntries, Node, RecursiveRelationship, Relationship,
    StructFields,
};
