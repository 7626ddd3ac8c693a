use rusqlite::Connection;

use crate::db::queries;
use crate::models::{format_minute, FlowVariant, Mode, Priority};

pub const GRID_START_MINUTE: u32 = 8 * 60;
pub const GRID_END_MINUTE: u32 = 19 * 60;
pub const GRID_STEP_MINUTES: u32 = 15;

/// Shape of the slot catalog: one slot per clinic × time tick × priority ×
/// mode.
#[derive(Debug, Clone)]
pub struct CatalogSpec {
    pub clinics: Vec<String>,
    pub modes: Vec<Mode>,
    pub priorities: Vec<Priority>,
    pub grid_start_minute: u32,
    pub grid_end_minute: u32,
    pub step_minutes: u32,
}

impl CatalogSpec {
    pub fn for_variant(variant: FlowVariant, clinics: &[String]) -> Self {
        Self {
            clinics: clinics.to_vec(),
            modes: variant.modes().to_vec(),
            priorities: variant.priorities().to_vec(),
            grid_start_minute: GRID_START_MINUTE,
            grid_end_minute: GRID_END_MINUTE,
            step_minutes: GRID_STEP_MINUTES,
        }
    }

    /// Ticks in `[grid_start_minute, grid_end_minute)` rendered as `HH:MM`.
    pub fn times(&self) -> Vec<String> {
        (self.grid_start_minute..self.grid_end_minute)
            .step_by(self.step_minutes.max(1) as usize)
            .map(format_minute)
            .collect()
    }
}

/// Replaces the whole slot catalog. Every existing slot, booked or not, is
/// deleted first.
pub fn generate_catalog(conn: &Connection, spec: &CatalogSpec) -> anyhow::Result<usize> {
    anyhow::ensure!(spec.step_minutes > 0, "catalog step must be positive");
    anyhow::ensure!(
        spec.grid_start_minute < spec.grid_end_minute,
        "catalog grid is empty ({}..{})",
        spec.grid_start_minute,
        spec.grid_end_minute
    );

    let mut slots = vec![];
    for clinic in &spec.clinics {
        for time in spec.times() {
            for priority in &spec.priorities {
                for mode in &spec.modes {
                    slots.push((clinic.clone(), time.clone(), *priority, *mode));
                }
            }
        }
    }

    let tx = conn.unchecked_transaction()?;
    let removed = queries::delete_all_slots(&tx)?;
    let inserted = queries::insert_slots(&tx, &slots)?;
    tx.commit()?;

    tracing::info!(removed, inserted, "regenerated slot catalog");
    Ok(inserted)
}

/// Generates the catalog only when the table holds no slots at all.
pub fn ensure_catalog(conn: &Connection, spec: &CatalogSpec) -> anyhow::Result<bool> {
    if queries::count_slots(conn)? > 0 {
        return Ok(false);
    }
    generate_catalog(conn, spec)?;
    Ok(true)
}
