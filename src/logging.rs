//! Backend de logs del binario.
//!
//! Las librerías del workspace emiten con la fachada `log`; el subscriber de
//! `tracing-subscriber` instala el puente `log` -> `tracing` al inicializarse.
use tracing_subscriber::EnvFilter;

/// Inicializa el subscriber global. `RUST_LOG` tiene prioridad sobre
/// `filter`. Una segunda llamada no hace nada.
pub fn init_logging(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter)
                                     .with_target(false)
                                     .try_init();
}
