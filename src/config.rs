//! Configuración del orquestador.
//! Carga variables de entorno (y `.env` si existe, una sola vez) y expone una
//! estructura inmutable con los parámetros de ejecución.
use std::env;
use std::time::Duration;

use flow_core::BroadcastPolicy;
use once_cell::sync::Lazy;

use crate::errors::AppError;

/// Timeout por instancia de cada broadcast, en milisegundos. Vacío o `0`:
/// sin límite.
pub const BROADCAST_TIMEOUT_VAR: &str = "FLOWRUN_BROADCAST_TIMEOUT_MS";
/// Filtro de logs con la sintaxis de `RUST_LOG`.
pub const LOG_VAR: &str = "FLOWRUN_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// `None` reproduce la espera sin límite: una instancia colgada bloquea
    /// la operación de control.
    pub broadcast_timeout: Option<Duration>,
    pub log_filter: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { broadcast_timeout: None,
               log_filter: DEFAULT_LOG_FILTER.to_string() }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero leyendo de `lookup`; permite probar sin
    /// tocar el entorno del proceso.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let broadcast_timeout = match lookup(BROADCAST_TIMEOUT_VAR).map(|v| v.trim().to_string()) {
            None => None,
            Some(raw) if raw.is_empty() => None,
            Some(raw) => {
                let ms: u64 = raw.parse()
                                 .map_err(|_| AppError::Config(format!("{BROADCAST_TIMEOUT_VAR}={raw} is not a number")))?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
        };
        let log_filter = lookup(LOG_VAR).filter(|v| !v.trim().is_empty())
                                        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Ok(Self { broadcast_timeout,
                  log_filter })
    }

    pub fn broadcast_policy(&self) -> BroadcastPolicy {
        BroadcastPolicy { timeout: self.broadcast_timeout }
    }
}
