//! Launcher en proceso: cada instancia es una tarea tokio que aplica
//! primitivas de control recibidas por un canal y las confirma por
//! `oneshot`.
//!
//! No ejecuta lógica de usuario. Sirve para levantar un flow completo sin
//! infraestructura (binario de demo, tests de integración) y permite inyectar
//! fallos de arranque, instancias que rechazan control y latencia.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use flow_core::constants::INSTANCES_COMMAND;
use flow_core::{ControllerError, FlowletLauncher, FlowletOptions, InstanceKey, LaunchError, Program, ProgramController,
                SharedController};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::journal::{ControlAction, ControlJournal};

const CONTROL_QUEUE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStatus {
    Running,
    Suspended,
    Stopped,
}

/// Estado visible de una instancia tras la última primitiva aplicada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub status: InstanceStatus,
    pub instances: u32,
    pub run_id: String,
}

#[derive(Debug)]
enum Control {
    Suspend,
    Resume,
    Stop,
    Command { name: String, value: Value },
}

struct ControlMessage {
    control: Control,
    ack: oneshot::Sender<Result<(), ControllerError>>,
}

#[derive(Default)]
pub struct InMemoryLauncher {
    journal: ControlJournal,
    snapshots: Arc<DashMap<InstanceKey, InstanceSnapshot>>,
    launch_failures: DashMap<InstanceKey, String>,
    rejecting: Arc<DashSet<InstanceKey>>,
    control_delay: Option<Duration>,
}

impl InMemoryLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usa un diario compartido en lugar del propio.
    pub fn with_journal(mut self, journal: ControlJournal) -> Self {
        self.journal = journal;
        self
    }

    /// Cada instancia espera `delay` antes de aplicar cada primitiva.
    pub fn with_control_delay(mut self, delay: Duration) -> Self {
        self.control_delay = Some(delay);
        self
    }

    /// Todo arranque de `flowlet[instance_id]` falla con `reason`.
    pub fn fail_launch(&self, flowlet: &str, instance_id: u32, reason: impl Into<String>) {
        self.launch_failures.insert(InstanceKey::new(flowlet, instance_id), reason.into());
    }

    pub fn clear_launch_failures(&self) {
        self.launch_failures.clear();
    }

    /// `flowlet[instance_id]` rechaza cualquier primitiva de control a partir
    /// de ahora, incluida una instancia ya arrancada.
    pub fn reject_control(&self, flowlet: &str, instance_id: u32) {
        self.rejecting.insert(InstanceKey::new(flowlet, instance_id));
    }

    pub fn journal(&self) -> &ControlJournal {
        &self.journal
    }

    pub fn snapshot(&self, flowlet: &str, instance_id: u32) -> Option<InstanceSnapshot> {
        self.snapshots.get(&InstanceKey::new(flowlet, instance_id)).map(|s| s.value().clone())
    }

    /// Ids de un flowlet cuya última primitiva no fue `stop`, ordenados.
    pub fn live_instances(&self, flowlet: &str) -> Vec<u32> {
        let mut ids: Vec<u32> = self.snapshots
                                    .iter()
                                    .filter(|e| e.key().flowlet == flowlet && e.value().status != InstanceStatus::Stopped)
                                    .map(|e| e.key().instance_id)
                                    .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl FlowletLauncher for InMemoryLauncher {
    async fn launch(&self, _program: &Program, options: FlowletOptions) -> Result<SharedController, LaunchError> {
        let (instance_id, instances) = match (options.instance_id(), options.instances()) {
            (Some(id), Some(total)) => (id, total),
            _ => {
                return Err(LaunchError::InvalidProgram(format!("flowlet {} launched without instance arguments",
                                                               options.name)))
            }
        };
        let key = InstanceKey::new(options.name.as_str(), instance_id);
        if let Some(reason) = self.launch_failures.get(&key).map(|r| r.value().clone()) {
            return Err(LaunchError::flowlet(&key.flowlet, instance_id, reason));
        }

        let run_id = options.run_id().unwrap_or_default().to_string();
        self.journal.append(&key, &run_id, ControlAction::Started { instances });
        self.snapshots.insert(key.clone(),
                              InstanceSnapshot { status: InstanceStatus::Running,
                                                 instances,
                                                 run_id: run_id.clone() });

        let (tx, rx) = mpsc::channel(CONTROL_QUEUE);
        let task = InstanceTask { key: key.clone(),
                                  run_id,
                                  journal: self.journal.clone(),
                                  snapshots: self.snapshots.clone(),
                                  rejecting: self.rejecting.clone(),
                                  control_delay: self.control_delay,
                                  status: InstanceStatus::Running,
                                  instances };
        tokio::spawn(task.run(rx));
        debug!("in-memory instance {key} started with total {instances}");

        Ok(Arc::new(InMemoryController { key, tx }))
    }
}

struct InstanceTask {
    key: InstanceKey,
    run_id: String,
    journal: ControlJournal,
    snapshots: Arc<DashMap<InstanceKey, InstanceSnapshot>>,
    rejecting: Arc<DashSet<InstanceKey>>,
    control_delay: Option<Duration>,
    status: InstanceStatus,
    instances: u32,
}

impl InstanceTask {
    async fn run(mut self, mut rx: mpsc::Receiver<ControlMessage>) {
        while let Some(message) = rx.recv().await {
            if let Some(delay) = self.control_delay {
                tokio::time::sleep(delay).await;
            }
            let result = self.apply(message.control);
            if let Err(e) = &result {
                warn!("instance {} rejected control: {e}", self.key);
            }
            // El llamador pudo haber abandonado la espera (timeout).
            let _ = message.ack.send(result);
            if self.status == InstanceStatus::Stopped {
                break;
            }
        }
        debug!("in-memory instance {} exited", self.key);
    }

    fn apply(&mut self, control: Control) -> Result<(), ControllerError> {
        if self.rejecting.contains(&self.key) {
            return Err(ControllerError::Rejected(format!("{control:?} refused by {}", self.key)));
        }
        let action = match control {
            Control::Suspend => {
                self.expect_status(InstanceStatus::Running, "suspend")?;
                self.status = InstanceStatus::Suspended;
                ControlAction::Suspended
            }
            Control::Resume => {
                self.expect_status(InstanceStatus::Suspended, "resume")?;
                self.status = InstanceStatus::Running;
                ControlAction::Resumed
            }
            Control::Stop => {
                self.status = InstanceStatus::Stopped;
                ControlAction::Stopped
            }
            Control::Command { name, value } => {
                if name == INSTANCES_COMMAND {
                    self.instances = value.as_u64()
                                          .and_then(|n| u32::try_from(n).ok())
                                          .ok_or_else(|| ControllerError::Rejected(format!("bad instance count {value}")))?;
                }
                ControlAction::Command { name, value }
            }
        };

        self.journal.append(&self.key, &self.run_id, action);
        self.snapshots.insert(self.key.clone(),
                              InstanceSnapshot { status: self.status,
                                                 instances: self.instances,
                                                 run_id: self.run_id.clone() });
        Ok(())
    }

    fn expect_status(&self, expected: InstanceStatus, op: &str) -> Result<(), ControllerError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ControllerError::Rejected(format!("cannot {op} {} while {:?}", self.key, self.status)))
        }
    }
}

/// Handle de una instancia en memoria.
pub struct InMemoryController {
    key: InstanceKey,
    tx: mpsc::Sender<ControlMessage>,
}

impl InMemoryController {
    async fn send(&self, control: Control) -> Result<(), ControllerError> {
        let (ack, reply) = oneshot::channel();
        if let Err(rejected) = self.tx.send(ControlMessage { control, ack }).await {
            debug!("{} already exited, dropping {:?}", self.key, rejected.0.control);
            return Err(ControllerError::Unavailable);
        }
        reply.await.map_err(|_| ControllerError::Unavailable)?
    }
}

#[async_trait]
impl ProgramController for InMemoryController {
    async fn suspend(&self) -> Result<(), ControllerError> {
        self.send(Control::Suspend).await
    }

    async fn resume(&self) -> Result<(), ControllerError> {
        self.send(Control::Resume).await
    }

    async fn stop(&self) -> Result<(), ControllerError> {
        self.send(Control::Stop).await
    }

    async fn command(&self, name: &str, value: Value) -> Result<(), ControllerError> {
        self.send(Control::Command { name: name.to_string(),
                                     value })
            .await
    }
}
