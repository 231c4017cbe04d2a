//! Fan-out / fan-in con semántica "best effort".
//!
//! `broadcast` lanza una tarea por instancia, espera a todas y nunca corta en
//! el primer fallo: un error, un panic o un timeout de una instancia se
//! registra y se anota en el `BroadcastReport`, sin afectar a las demás.
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::task::JoinSet;

use crate::controller::SharedController;
use crate::errors::ControllerError;
use crate::table::InstanceKey;

/// Primitiva de control que se difunde a un conjunto de instancias.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Suspend,
    Resume,
    Stop,
    Command { name: String, value: Value },
}

impl Signal {
    /// `command("instances", total)`.
    pub fn instances(total: u32) -> Self {
        Self::Command { name: crate::constants::INSTANCES_COMMAND.to_string(),
                        value: Value::from(total) }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Command { name, .. } => name.as_str(),
        }
    }

    async fn apply(self, controller: SharedController) -> Result<(), ControllerError> {
        match self {
            Self::Suspend => controller.suspend().await,
            Self::Resume => controller.resume().await,
            Self::Stop => controller.stop().await,
            Self::Command { name, value } => controller.command(&name, value).await,
        }
    }
}

/// Límite de espera por instancia en cada broadcast.
///
/// `timeout: None` espera sin límite: una instancia colgada bloquea la
/// operación de control completa. Con `Some(d)` la instancia que no responde
/// a tiempo cuenta como fallo y el broadcast termina igualmente; la instancia
/// sigue en la tabla y puede aplicar la señal más tarde.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastPolicy {
    pub timeout: Option<Duration>,
}

impl BroadcastPolicy {
    pub fn unbounded() -> Self {
        Self { timeout: None }
    }

    pub fn bounded(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }
}

/// Resultado agregado de un broadcast. Los fallos individuales quedan aquí y
/// en el log; nunca se propagan como error.
#[derive(Debug, Default, Clone)]
pub struct BroadcastReport {
    pub succeeded: Vec<InstanceKey>,
    pub failures: Vec<(InstanceKey, ControllerError)>,
}

impl BroadcastReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }
}

pub async fn broadcast(targets: Vec<(InstanceKey, SharedController)>,
                       signal: Signal,
                       policy: BroadcastPolicy)
                       -> BroadcastReport {
    let mut report = BroadcastReport::default();
    if targets.is_empty() {
        return report;
    }

    let label = signal.label().to_string();
    debug!("broadcast {label} to {} instances", targets.len());

    let mut tasks = JoinSet::new();
    let mut pending: Vec<InstanceKey> = Vec::with_capacity(targets.len());
    for (key, controller) in targets {
        pending.push(key.clone());
        let signal = signal.clone();
        tasks.spawn(async move {
            let outcome = match policy.timeout {
                None => signal.apply(controller).await,
                Some(limit) => match tokio::time::timeout(limit, signal.apply(controller)).await {
                    Ok(res) => res,
                    Err(_) => Err(ControllerError::Timeout(limit.as_millis() as u64)),
                },
            };
            (key, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((key, Ok(()))) => {
                pending.retain(|k| k != &key);
                report.succeeded.push(key);
            }
            Ok((key, Err(e))) => {
                warn!("{label} failed on {key}: {e}");
                pending.retain(|k| k != &key);
                report.failures.push((key, e));
            }
            // Sin clave en el JoinError: se resuelve al final con `pending`.
            Err(e) => warn!("{label} task aborted: {e}"),
        }
    }

    for key in pending {
        warn!("{label} did not complete on {key}");
        report.failures.push((key, ControllerError::Unavailable));
    }

    report.succeeded.sort();
    report.failures.sort_by(|a, b| a.0.cmp(&b.0));
    report
}
