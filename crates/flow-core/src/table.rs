//! Tabla de instancias: (flowlet, instance_id) -> handle.
//!
//! Invariante: para cada flowlet presente, los ids vivos forman exactamente
//! `[0, live_count)`. Puede romperse de forma transitoria dentro de un
//! rescale, nunca entre dos operaciones del `FlowController`.
use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;

use crate::controller::SharedController;

/// Clave de una instancia, usada en logs e informes de broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    pub flowlet: String,
    pub instance_id: u32,
}

impl InstanceKey {
    pub fn new(flowlet: impl Into<String>, instance_id: u32) -> Self {
        Self { flowlet: flowlet.into(),
               instance_id }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.flowlet, self.instance_id)
    }
}

#[derive(Default)]
pub struct InstanceTable {
    rows: IndexMap<String, BTreeMap<u32, SharedController>>,
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta un handle; devuelve el anterior si la celda estaba ocupada.
    pub fn put(&mut self, flowlet: &str, instance_id: u32, controller: SharedController) -> Option<SharedController> {
        self.rows.entry(flowlet.to_string()).or_default().insert(instance_id, controller)
    }

    /// Retira la celda y transfiere la propiedad del handle al llamador.
    pub fn remove(&mut self, flowlet: &str, instance_id: u32) -> Option<SharedController> {
        self.rows.get_mut(flowlet).and_then(|row| row.remove(&instance_id))
    }

    /// Una fila sin instancias sigue presente: el flowlet es conocido aunque
    /// se haya escalado a cero.
    pub fn ensure_row(&mut self, flowlet: &str) {
        self.rows.entry(flowlet.to_string()).or_default();
    }

    pub fn contains_flowlet(&self, flowlet: &str) -> bool {
        self.rows.contains_key(flowlet)
    }

    pub fn live_count(&self, flowlet: &str) -> usize {
        self.rows.get(flowlet).map_or(0, BTreeMap::len)
    }

    pub fn instance_ids(&self, flowlet: &str) -> Vec<u32> {
        self.rows.get(flowlet).map(|row| row.keys().copied().collect()).unwrap_or_default()
    }

    pub fn flowlets(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }

    /// Copia de la fila de un flowlet, ordenada por id.
    pub fn row(&self, flowlet: &str) -> Vec<(InstanceKey, SharedController)> {
        self.rows
            .get(flowlet)
            .map(|row| {
                row.iter()
                   .map(|(id, c)| (InstanceKey::new(flowlet, *id), c.clone()))
                   .collect()
            })
            .unwrap_or_default()
    }

    /// Copia de todas las celdas, en orden de flowlet y luego de id.
    pub fn all(&self) -> Vec<(InstanceKey, SharedController)> {
        self.rows.keys().flat_map(|flowlet| self.row(flowlet)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_contiguous(&self, flowlet: &str) -> bool {
        self.instance_ids(flowlet).into_iter().enumerate().all(|(pos, id)| pos as u32 == id)
    }

    /// Vacía la tabla y devuelve todas las celdas.
    pub fn drain(&mut self) -> Vec<(InstanceKey, SharedController)> {
        let cells = self.all();
        self.rows.clear();
        cells
    }
}

impl fmt::Debug for InstanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (flowlet, row) in &self.rows {
            map.entry(flowlet, &row.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}
