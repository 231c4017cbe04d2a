//! `FlowController`: un flow en ejecución visto como una única unidad de
//! control.
//!
//! Todas las operaciones públicas de ciclo de vida, rescale y comando toman
//! el mismo `Mutex` durante toda su duración, así que sobre una ejecución
//! sólo avanza una a la vez. Dentro de una operación, los broadcasts a las
//! instancias sí son concurrentes.
//!
//! Cada operación corre en su propia tarea tokio. Si quien llama deja de
//! esperar (timeout, `select!`), la operación termina igualmente: el lock
//! nunca se suelta en un estado transitorio y ningún handle se pierde a medio
//! broadcast.
use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use crate::broadcast::{broadcast, BroadcastPolicy, BroadcastReport, Signal};
use crate::constants::INSTANCES_COMMAND;
use crate::controller::ControllerState;
use crate::errors::FlowError;
use crate::launcher::FlowletLauncher;
use crate::model::{Arguments, FlowSpecification, Program, RunId};
use crate::table::InstanceTable;

/// Estado protegido por el lock del controlador.
pub(crate) struct FlowInner {
    pub(crate) table: InstanceTable,
    pub(crate) state: ControllerState,
}

/// Todo lo que comparten el handle público y las tareas de cada operación.
pub(crate) struct FlowCore {
    pub(crate) program: Arc<Program>,
    pub(crate) spec: FlowSpecification,
    pub(crate) run_id: RunId,
    pub(crate) user_arguments: Arguments,
    pub(crate) launcher: Arc<dyn FlowletLauncher>,
    pub(crate) policy: BroadcastPolicy,
    inner: Mutex<FlowInner>,
    state_tx: watch::Sender<ControllerState>,
}

pub struct FlowController {
    core: Arc<FlowCore>,
}

impl FlowController {
    /// Sólo el runner crea controladores, y sólo tras arrancar todas las
    /// instancias iniciales.
    pub(crate) fn new(program: Arc<Program>,
                      spec: FlowSpecification,
                      run_id: RunId,
                      user_arguments: Arguments,
                      launcher: Arc<dyn FlowletLauncher>,
                      policy: BroadcastPolicy,
                      table: InstanceTable)
                      -> Self {
        let (state_tx, _) = watch::channel(ControllerState::Alive);
        let core = FlowCore { program,
                              spec,
                              run_id,
                              user_arguments,
                              launcher,
                              policy,
                              inner: Mutex::new(FlowInner { table,
                                                            state: ControllerState::Alive }),
                              state_tx };
        Self { core: Arc::new(core) }
    }

    pub fn name(&self) -> &str {
        &self.core.spec.name
    }

    pub fn run_id(&self) -> RunId {
        self.core.run_id
    }

    pub fn specification(&self) -> &FlowSpecification {
        &self.core.spec
    }

    /// Último estado publicado. No toma el lock: durante una operación en
    /// curso devuelve el estado transitorio (`Suspending`, `Stopping`...).
    pub fn state(&self) -> ControllerState {
        *self.core.state_tx.borrow()
    }

    /// Receptor de cambios de estado, incluidos los transitorios.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.core.state_tx.subscribe()
    }

    /// Ids vivos de un flowlet, ordenados.
    pub async fn live_instances(&self, flowlet: &str) -> Vec<u32> {
        self.core.inner.lock().await.table.instance_ids(flowlet)
    }

    pub async fn instance_count(&self, flowlet: &str) -> usize {
        self.core.inner.lock().await.table.live_count(flowlet)
    }

    /// Número de instancias vivas por flowlet, en orden de declaración.
    pub async fn instance_counts(&self) -> IndexMap<String, usize> {
        let inner = self.core.inner.lock().await;
        inner.table
             .flowlets()
             .into_iter()
             .map(|f| {
                 let n = inner.table.live_count(&f);
                 (f, n)
             })
             .collect()
    }

    pub async fn suspend(&self) -> Result<(), FlowError> {
        self.detached("suspend", |core| async move { core.suspend().await }).await
    }

    pub async fn resume(&self) -> Result<(), FlowError> {
        self.detached("resume", |core| async move { core.resume().await }).await
    }

    /// Detiene todas las instancias y deja el controlador en `Stopped`. La
    /// tabla queda vacía: los handles se sueltan tras el broadcast.
    pub async fn stop(&self) -> Result<(), FlowError> {
        self.detached("stop", |core| async move { core.stop().await }).await
    }

    /// Cambia el número de instancias vivas de un flowlet.
    ///
    /// Crecer avisa primero del nuevo total a las instancias existentes y
    /// luego arranca las nuevas. Reducir detiene las sobrantes y después
    /// suspende, actualiza y reanuda las que quedan. Ver `rescale`.
    pub async fn change_instances(&self, flowlet: &str, new_count: u32) -> Result<(), FlowError> {
        let flowlet = flowlet.to_string();
        self.detached("rescale", move |core| async move { core.change_instances(&flowlet, new_count).await })
            .await
    }

    /// Punto de entrada genérico de comandos.
    ///
    /// Sólo `"instances"` con un objeto flowlet -> total tiene efecto: cada
    /// entrada se aplica con `change_instances`, en orden, bajo una única
    /// adquisición del lock. Los fallos por entrada y los payloads mal
    /// formados se registran y no llegan al llamador. Cualquier otro nombre
    /// es un no-op.
    pub async fn command(&self, name: &str, value: Value) -> Result<(), FlowError> {
        let name = name.to_string();
        self.detached("command", move |core| async move { core.command(&name, value).await })
            .await
    }

    async fn detached<F, Fut>(&self, op: &'static str, body: F) -> Result<(), FlowError>
        where F: FnOnce(Arc<FlowCore>) -> Fut,
              Fut: Future<Output = Result<(), FlowError>> + Send + 'static
    {
        match tokio::spawn(body(self.core.clone())).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(FlowError::Aborted { op,
                                               reason: e.to_string() }),
        }
    }
}

impl FlowCore {
    async fn suspend(&self) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        require(&inner, "suspend", &[ControllerState::Alive])?;
        info!("Suspending flow: {} run={}", self.spec.name, self.run_id);
        self.transition(&mut inner, ControllerState::Suspending);
        let report = broadcast(inner.table.all(), Signal::Suspend, self.policy).await;
        self.note("suspend", &report);
        self.transition(&mut inner, ControllerState::Suspended);
        info!("Flow suspended: {}", self.spec.name);
        Ok(())
    }

    async fn resume(&self) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        require(&inner, "resume", &[ControllerState::Suspended])?;
        info!("Resuming flow: {} run={}", self.spec.name, self.run_id);
        self.transition(&mut inner, ControllerState::Resuming);
        let report = broadcast(inner.table.all(), Signal::Resume, self.policy).await;
        self.note("resume", &report);
        self.transition(&mut inner, ControllerState::Alive);
        info!("Flow resumed: {}", self.spec.name);
        Ok(())
    }

    async fn stop(&self) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        require(&inner, "stop", &[ControllerState::Alive, ControllerState::Suspended])?;
        info!("Stopping flow: {} run={}", self.spec.name, self.run_id);
        self.transition(&mut inner, ControllerState::Stopping);
        let cells = inner.table.drain();
        let report = broadcast(cells, Signal::Stop, self.policy).await;
        self.note("stop", &report);
        self.transition(&mut inner, ControllerState::Stopped);
        info!("Flow stopped: {}", self.spec.name);
        Ok(())
    }

    async fn change_instances(&self, flowlet: &str, new_count: u32) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        require(&inner, "rescale", &[ControllerState::Alive, ControllerState::Suspended])?;
        self.rescale(&mut inner, flowlet, new_count).await
    }

    async fn command(&self, name: &str, value: Value) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        require(&inner, "command", &[ControllerState::Alive, ControllerState::Suspended])?;
        if name != INSTANCES_COMMAND {
            debug!("ignoring command {name} on flow {}", self.spec.name);
            return Ok(());
        }

        let counts = match parse_instances_command(&value) {
            Ok(counts) => counts,
            Err(e) => {
                warn!("{e}");
                return Ok(());
            }
        };

        for (flowlet, count) in counts {
            if let Err(e) = self.rescale(&mut inner, &flowlet, count).await {
                error!("Fail to change instances of {flowlet} to {count} in flow {}: {e}", self.spec.name);
            }
        }
        Ok(())
    }

    pub(crate) fn transition(&self, inner: &mut FlowInner, state: ControllerState) {
        debug!("flow {} {:?} -> {:?}", self.spec.name, inner.state, state);
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    /// Registra el resultado de un broadcast. Los fallos ya se logean por
    /// instancia en `broadcast`; aquí queda el resumen.
    pub(crate) fn note(&self, step: &str, report: &BroadcastReport) {
        if report.is_complete() {
            debug!("{step}: {} instances acknowledged in flow {}", report.succeeded.len(), self.spec.name);
        } else {
            warn!("{step}: {}/{} instances failed in flow {}",
                  report.failures.len(),
                  report.attempted(),
                  self.spec.name);
        }
    }
}

fn require(inner: &FlowInner, op: &'static str, allowed: &[ControllerState]) -> Result<(), FlowError> {
    if allowed.contains(&inner.state) {
        Ok(())
    } else {
        Err(FlowError::IllegalState { op,
                                      state: inner.state })
    }
}

/// Interpreta el payload de `"instances"`: objeto con totales enteros no
/// negativos. Conserva el orden del payload.
pub fn parse_instances_command(value: &Value) -> Result<IndexMap<String, u32>, FlowError> {
    let invalid = |reason: String| FlowError::InvalidCommand { name: INSTANCES_COMMAND.to_string(),
                                                               reason };
    let entries = value.as_object()
                       .ok_or_else(|| invalid(format!("expected an object, got {value}")))?;
    entries.iter()
           .map(|(flowlet, count)| {
               count.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .map(|n| (flowlet.clone(), n))
                    .ok_or_else(|| invalid(format!("{flowlet}: {count} is not a valid instance count")))
           })
           .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_accepts_object_of_counts() {
        let counts = parse_instances_command(&json!({"source": 4, "sink": 0})).expect("valid payload");
        assert_eq!(counts.get("source"), Some(&4));
        assert_eq!(counts.get("sink"), Some(&0));
    }

    #[test]
    fn parse_rejects_negative_and_non_object() {
        assert!(matches!(parse_instances_command(&json!({"source": -1})),
                         Err(FlowError::InvalidCommand { .. })));
        assert!(matches!(parse_instances_command(&json!({"source": "two"})),
                         Err(FlowError::InvalidCommand { .. })));
        assert!(matches!(parse_instances_command(&json!(3)), Err(FlowError::InvalidCommand { .. })));
    }
}
