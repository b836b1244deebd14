#![allow(dead_code)]

use engine_memory::{MemValue, MemoryEngine};
use graphval_api::{CodecConfig, OwnedValue};
use graphval_codec::Codec;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn setup() -> (MemoryEngine, Codec) {
    init_tracing();
    (MemoryEngine::new(), Codec::default())
}

pub fn setup_with(config: CodecConfig) -> (MemoryEngine, Codec) {
    init_tracing();
    (MemoryEngine::new(), Codec::new(config))
}

/// Adopt a handle to `value`, as if the engine returned it in a result row.
pub fn cell(engine: &MemoryEngine, value: MemValue) -> OwnedValue<'_> {
    OwnedValue::adopt(engine, engine.insert(value).expect("insert fixture value"))
}

#[track_caller]
pub fn assert_released(engine: &MemoryEngine) {
    assert_eq!(engine.live_handles(), 0, "engine handles leaked");
    assert_eq!(engine.invalid_destroys(), 0, "handle destroyed twice");
}
