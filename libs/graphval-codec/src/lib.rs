//! Conversion between host values and engine values.
//!
//! Three entry points, all on [`Codec`]:
//! - [`Codec::encode`] builds an engine value from any [`Encode`] host value
//! - [`Codec::decode_dynamic`] decodes any engine value by its own tag
//! - [`Codec::decode_typed`] decodes into a statically known [`Decode`] type
//!
//! Every engine handle acquired during a call is released before it
//! returns, on success and on failure.

pub mod composite;
pub mod context;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod params;
pub mod row;
pub mod scalar;
pub mod typed;

use graphval_api::{CodecConfig, ConversionError, Engine, HostValue, OwnedValue};

pub use context::Context;
pub use encode::Encode;
pub use error::QueryError;
pub use params::execute_with_params;
pub use row::{QueryRows, Row};
pub use typed::Decode;

pub type Result<T, E = ConversionError> = std::result::Result<T, E>;

/// Codec entry point. Stateless apart from its config; cheap to share.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn context(&self) -> Context<'_> {
        Context::new(&self.config)
    }

    /// Build a new engine value owned by the returned guard.
    pub fn encode<'e, T: Encode + ?Sized>(
        &self,
        engine: &'e dyn Engine,
        value: &T,
    ) -> Result<OwnedValue<'e>> {
        value.encode(self.context(), engine)
    }

    /// Decode by the value's reported tag. Null becomes [`HostValue::Null`].
    pub fn decode_dynamic(&self, value: &OwnedValue<'_>) -> Result<HostValue> {
        dispatch::decode(self.context(), value)
    }

    /// Decode as `T`, failing with a type mismatch when the tag is not in
    /// `T::ACCEPTS`.
    pub fn decode_typed<T: Decode>(&self, value: &OwnedValue<'_>) -> Result<T> {
        T::decode(self.context(), value)
    }

    /// Bind `params`, run `statement` and hand back its rows.
    pub fn execute<'e>(
        &self,
        engine: &'e dyn Engine,
        statement: &str,
        params: &[(&str, &dyn Encode)],
    ) -> Result<QueryRows<'_, 'e>, QueryError> {
        execute_with_params(self, engine, statement, params)
    }
}
