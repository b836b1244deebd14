//! Explicit numeric-width wrappers.
//!
//! A generic host number (a JSON number, a dynamically typed parameter) does
//! not say which engine integer width it wants: `7` fits `UINT32`, `INT64`
//! and `INT16` alike. Such numbers are encoded by the fixed rule in the codec
//! (`INT64`, then `UINT64`, then `DOUBLE`). When a specific width is required,
//! wrap the value; a wrapper always maps to exactly one engine tag.

use serde::{Deserialize, Serialize};

use crate::types::TypeId;
use crate::value::HostValue;

macro_rules! width_wrapper {
    ($(#[$doc:meta] $name:ident($ty:ty) => $variant:ident, $tag:ident;)*) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                pub value: $ty,
            }

            impl $name {
                pub const TYPE_ID: TypeId = TypeId::$tag;

                pub fn new(value: $ty) -> Self {
                    Self { value }
                }
            }

            impl From<$name> for HostValue {
                fn from(w: $name) -> Self {
                    HostValue::$variant(w.value)
                }
            }
        )*
    };
}

width_wrapper! {
    /// Encodes as `INT8`.
    Int8Wrapper(i8) => Int8, Int8;
    /// Encodes as `INT16`.
    Int16Wrapper(i16) => Int16, Int16;
    /// Encodes as `INT32`.
    Int32Wrapper(i32) => Int32, Int32;
    /// Encodes as `INT64`.
    Int64Wrapper(i64) => Int64, Int64;
    /// Encodes as `UINT8`. Generic numbers never pick this width.
    UInt8Wrapper(u8) => UInt8, UInt8;
    /// Encodes as `UINT16`. Generic numbers never pick this width.
    UInt16Wrapper(u16) => UInt16, UInt16;
    /// Encodes as `UINT32`. Generic numbers never pick this width.
    UInt32Wrapper(u32) => UInt32, UInt32;
    /// Encodes as `UINT64`.
    UInt64Wrapper(u64) => UInt64, UInt64;
    /// Encodes as `FLOAT`.
    FloatWrapper(f32) => Float, Float;
    /// Encodes as `DOUBLE`.
    DoubleWrapper(f64) => Double, Double;
    /// Encodes as `BOOL`.
    BoolWrapper(bool) => Bool, Bool;
}
