//! Diario append-only de primitivas de control recibidas por instancias.
//!
//! Cada registro lleva un `seq` global asignado al hacer append, que fija el
//! orden en que las instancias aplicaron las primitivas. Una instancia anota
//! la primitiva antes de confirmarla, así que todo lo que el orquestador
//! esperó aparece con un `seq` menor que lo que lanzó después.
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use flow_core::InstanceKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlAction {
    /// Arranque con el total de instancias indicado en las opciones.
    Started { instances: u32 },
    Suspended,
    Resumed,
    Stopped,
    Command { name: String, value: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRecord {
    pub seq: u64,
    pub flowlet: String,
    pub instance_id: u32,
    pub run_id: String,
    pub action: ControlAction,
    pub ts: DateTime<Utc>, // metadato; el orden lo da `seq`
}

impl ControlRecord {
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.flowlet.as_str(), self.instance_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControlJournal {
    inner: Arc<Mutex<Vec<ControlRecord>>>,
}

impl ControlJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, key: &InstanceKey, run_id: &str, action: ControlAction) -> ControlRecord {
        let mut records = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let record = ControlRecord { seq: records.len() as u64,
                                     flowlet: key.flowlet.clone(),
                                     instance_id: key.instance_id,
                                     run_id: run_id.to_string(),
                                     action,
                                     ts: Utc::now() };
        records.push(record.clone());
        record
    }

    pub fn records(&self) -> Vec<ControlRecord> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Acciones de una instancia en orden de aplicación.
    pub fn actions_for(&self, flowlet: &str, instance_id: u32) -> Vec<ControlAction> {
        self.records()
            .into_iter()
            .filter(|r| r.flowlet == flowlet && r.instance_id == instance_id)
            .map(|r| r.action)
            .collect()
    }

    /// `seq` de los registros que cumplen `pred`.
    pub fn seqs_where<F>(&self, pred: F) -> Vec<u64>
        where F: Fn(&ControlRecord) -> bool
    {
        self.records().iter().filter(|r| pred(r)).map(|r| r.seq).collect()
    }

    /// Registros a partir de `seq` (inclusive). Útil para aislar lo que
    /// produjo una única operación.
    pub fn since(&self, seq: u64) -> Vec<ControlRecord> {
        self.records().into_iter().filter(|r| r.seq >= seq).collect()
    }
}
