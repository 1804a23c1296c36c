//! Dashboard aggregates over the current dataset.

use hashbrown::HashMap;
use serde::Serialize;

use crate::{
    core::dataset::Dataset,
    types::{LogKind, MachineStatus, QcStatus, RecordId},
};

/// Production total for one machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineOutput {
    /// Machine id.
    pub machine_id: RecordId,
    /// Machine display name.
    pub name: String,
    /// Sum of `items_produced` across its entries.
    pub produced: f64,
}

/// Headline figures for the plant dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantSummary {
    /// Sum of `items_produced` over all production entries.
    pub total_production: f64,
    /// Number of QC entries.
    pub qc_total: usize,
    /// QC entries judged correct.
    pub qc_passed: usize,
    /// Machines currently active.
    pub active_machines: usize,
    /// All machines.
    pub total_machines: usize,
    /// Entry count per collection, in [`LogKind::ALL`] order.
    pub entry_counts: Vec<(LogKind, usize)>,
    /// Per-machine production, in machine order.
    pub by_machine: Vec<MachineOutput>,
}

impl PlantSummary {
    /// QC entries judged wrong.
    pub fn qc_failed(&self) -> usize {
        self.qc_total - self.qc_passed
    }

    /// Share of correct QC entries in percent; 100 when nothing was measured.
    pub fn pass_rate(&self) -> f64 {
        if self.qc_total == 0 {
            100.0
        } else {
            self.qc_passed as f64 * 100.0 / self.qc_total as f64
        }
    }
}

/// Computes the dashboard figures.
pub fn summarize(dataset: &Dataset) -> PlantSummary {
    let mut produced: HashMap<&str, f64> = HashMap::new();
    for e in &dataset.machine_logs {
        *produced.entry(e.machine_id.as_str()).or_default() += e.items_produced;
    }

    let by_machine = dataset
        .machines
        .iter()
        .map(|m| MachineOutput {
            machine_id: m.id.clone(),
            name: m.name.clone(),
            produced: produced.get(m.id.as_str()).copied().unwrap_or(0.0),
        })
        .collect();

    PlantSummary {
        total_production: dataset.machine_logs.iter().map(|e| e.items_produced).sum(),
        qc_total: dataset.qc_logs.len(),
        qc_passed: dataset
            .qc_logs
            .iter()
            .filter(|e| e.status == QcStatus::Correct)
            .count(),
        active_machines: dataset
            .machines
            .iter()
            .filter(|m| m.status == MachineStatus::Active)
            .count(),
        total_machines: dataset.machines.len(),
        entry_counts: LogKind::ALL.iter().map(|&k| (k, dataset.entry_count(k))).collect(),
        by_machine,
    }
}
