// Adapters layer: concrete implementations for external systems (http source, storage).

pub mod http;
pub mod storage;
