//! Algoritmo de rescale de un flowlet.
//!
//! Se ejecuta siempre con el lock del controlador tomado. Cada paso es un
//! broadcast "best effort" y el siguiente paso no empieza hasta que el
//! anterior terminó en todas las instancias.
//!
//! - Crecer (`live < new`): `instances=new` a las vivas, después arrancar
//!   `[live, new)` con total `new`.
//! - Reducir (`live > new`): parar `[new, live)` de mayor a menor, y sobre
//!   `[0, new)`: suspender, `instances=new`, reanudar.
//!
//! Con el flow suspendido las instancias ya están quietas: al reducir no se
//! suspenden ni reanudan, y al crecer las nuevas se suspenden en un único
//! broadcast tras arrancarlas todas.
use std::cmp::Ordering;

use log::{debug, error, info, warn};

use crate::broadcast::{broadcast, Signal};
use crate::controller::ControllerState;
use crate::errors::FlowError;
use crate::flow::controller::{FlowCore, FlowInner};
use crate::model::FlowletOptions;
use crate::table::InstanceKey;

impl FlowCore {
    pub(crate) async fn rescale(&self, inner: &mut FlowInner, flowlet: &str, new_count: u32) -> Result<(), FlowError> {
        if !inner.table.contains_flowlet(flowlet) {
            return Err(FlowError::UnknownFlowlet(flowlet.to_string()));
        }

        let live_count = inner.table.live_count(flowlet) as u32;
        let outcome = match live_count.cmp(&new_count) {
            Ordering::Equal => {
                debug!("flowlet {flowlet} already has {new_count} instances");
                return Ok(());
            }
            Ordering::Less => self.increase_instances(inner, flowlet, live_count, new_count).await,
            Ordering::Greater => {
                self.decrease_instances(inner, flowlet, live_count, new_count).await;
                Ok(())
            }
        };

        verify_contiguous(inner, flowlet)?;
        if outcome.is_ok() {
            info!("flowlet {flowlet} of flow {} rescaled {live_count} -> {new_count}", self.spec.name);
        }
        outcome
    }

    async fn increase_instances(&self,
                                inner: &mut FlowInner,
                                flowlet: &str,
                                live_count: u32,
                                new_count: u32)
                                -> Result<(), FlowError> {
        let quiesced = inner.state == ControllerState::Suspended;

        // Las vivas conocen el nuevo total antes de que aparezca ningún par.
        let report = broadcast(inner.table.row(flowlet), Signal::instances(new_count), self.policy).await;
        self.note("instances", &report);

        let mut fresh = Vec::with_capacity((new_count - live_count) as usize);
        for instance_id in live_count..new_count {
            let options = FlowletOptions::new(flowlet, instance_id, new_count, self.run_id)
                .with_user_arguments(self.user_arguments.clone());
            match self.launcher.launch(&self.program, options).await {
                Ok(controller) => {
                    inner.table.put(flowlet, instance_id, controller.clone());
                    fresh.push((InstanceKey::new(flowlet, instance_id), controller));
                    debug!("started {flowlet}[{instance_id}] with total {new_count}");
                }
                Err(e) => {
                    error!("launch of {flowlet}[{instance_id}] failed, rolling back to {live_count}: {e}");
                    self.rollback_increase(inner, flowlet, live_count).await;
                    return Err(e.into());
                }
            }
        }

        if quiesced {
            let report = broadcast(fresh, Signal::Suspend, self.policy).await;
            self.note("suspend new", &report);
        }
        Ok(())
    }

    /// Deshace un crecimiento fallido: para las instancias nuevas (de mayor a
    /// menor id) y devuelve a las previas su total original.
    async fn rollback_increase(&self, inner: &mut FlowInner, flowlet: &str, live_count: u32) {
        let launched: Vec<u32> = inner.table
                                      .instance_ids(flowlet)
                                      .into_iter()
                                      .filter(|id| *id >= live_count)
                                      .rev()
                                      .collect();
        let mut started = Vec::with_capacity(launched.len());
        for id in launched {
            if let Some(controller) = inner.table.remove(flowlet, id) {
                started.push((InstanceKey::new(flowlet, id), controller));
            }
        }
        let report = broadcast(started, Signal::Stop, self.policy).await;
        self.note("rollback stop", &report);

        let report = broadcast(inner.table.row(flowlet), Signal::instances(live_count), self.policy).await;
        self.note("rollback instances", &report);
    }

    async fn decrease_instances(&self, inner: &mut FlowInner, flowlet: &str, live_count: u32, new_count: u32) {
        let quiesced = inner.state == ControllerState::Suspended;

        let mut excess = Vec::with_capacity((live_count - new_count) as usize);
        for instance_id in (new_count..live_count).rev() {
            match inner.table.remove(flowlet, instance_id) {
                Some(controller) => excess.push((InstanceKey::new(flowlet, instance_id), controller)),
                None => warn!("{flowlet}[{instance_id}] missing from instance table"),
            }
        }
        let report = broadcast(excess, Signal::Stop, self.policy).await;
        self.note("stop", &report);

        let remaining = inner.table.row(flowlet);
        if !quiesced {
            let report = broadcast(remaining.clone(), Signal::Suspend, self.policy).await;
            self.note("suspend", &report);
        }

        let report = broadcast(remaining.clone(), Signal::instances(new_count), self.policy).await;
        self.note("instances", &report);

        if !quiesced {
            let report = broadcast(remaining, Signal::Resume, self.policy).await;
            self.note("resume", &report);
        }
    }
}

fn verify_contiguous(inner: &FlowInner, flowlet: &str) -> Result<(), FlowError> {
    if inner.table.is_contiguous(flowlet) {
        return Ok(());
    }
    let ids = inner.table.instance_ids(flowlet);
    error!("instance ids of {flowlet} are not contiguous: {ids:?}");
    debug_assert!(false, "instance ids of {flowlet} are not contiguous: {ids:?}");
    Err(FlowError::InvariantViolation { flowlet: flowlet.to_string(),
                                        ids })
}
