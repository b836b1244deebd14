use graphval_api::{Engine, OwnedValue, RawValue};

use crate::Codec;
use crate::encode::Encode;
use crate::error::QueryError;
use crate::row::QueryRows;

/// Encode each named parameter, run `statement`, then release the encoded
/// values whether execution succeeded or failed.
pub fn execute_with_params<'c, 'e>(
    codec: &'c Codec,
    engine: &'e dyn Engine,
    statement: &str,
    params: &[(&str, &dyn Encode)],
) -> Result<QueryRows<'c, 'e>, QueryError> {
    let mut bound: Vec<(&str, OwnedValue<'e>)> = Vec::with_capacity(params.len());
    for (name, value) in params {
        let encoded = codec.encode(engine, *value).map_err(|source| QueryError::Bind {
            name: name.to_string(),
            source,
        })?;
        bound.push((*name, encoded));
    }

    let raw: Vec<(&str, RawValue)> = bound.iter().map(|(name, v)| (*name, v.raw())).collect();
    let result = engine.execute(statement, &raw);
    drop(bound);

    let result = result?;
    tracing::debug!(statement, params = params.len(), rows = result.rows.len(), "statement executed");
    Ok(QueryRows::new(codec, engine, result))
}
