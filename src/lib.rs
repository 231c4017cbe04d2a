//! flowrun
//!
//! Este crate agrupa el orquestador de flows para uso desde el binario u
//! otros clientes:
//! - Re-exporta `flow_core` (orquestador) y `flow_adapters` (launcher en
//!   proceso).
//! - Expone `config` para leer la configuración del entorno.
//! - Expone `logging` para instalar el backend de logs.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::OrchestratorConfig;
pub use errors::AppError;
pub use flow_adapters;
pub use flow_core;
pub use logging::init_logging;
