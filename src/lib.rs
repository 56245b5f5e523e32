pub mod api;
pub mod configuration;
pub mod entity;
pub mod lifecycle;
pub mod migration;
pub mod model;
pub mod seed;
pub mod storage;
pub mod telemetry;

pub use api::DefectApi;
pub use lifecycle::DefectLifecycle;
