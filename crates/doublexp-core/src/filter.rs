//! Mutator filtering.

use doublexp_models::MissionBatch;
use tracing::warn;

use crate::error::Result;
use crate::schema::{record_mutator, MissionReport, RawMission};

/// Flattens the biome-grouped report into the missions carrying `mutator`.
///
/// The comparison is exact and case-sensitive. Output keeps payload order:
/// biomes in the order they appear, then records within each biome. A report
/// without matches yields an empty batch.
///
/// Only matching records are decoded, so other records may have any shape.
///
/// # Errors
/// Returns [`crate::MissionError::DataFormat`] if a matching record lacks a
/// required field.
pub fn filter_missions(report: &MissionReport, mutator: &str) -> Result<MissionBatch> {
    let mut missions = Vec::new();

    for (biome, records) in &report.biomes {
        for record in records.iter().filter(|r| record_mutator(r) == Some(mutator)) {
            let raw = RawMission::from_record(record).map_err(|e| {
                warn!(biome = %biome, error = %e, "Malformed {} mission record", mutator);
                e
            })?;
            missions.extend(raw.to_mission(biome));
        }
    }

    Ok(MissionBatch::new(missions, report.timestamp))
}
