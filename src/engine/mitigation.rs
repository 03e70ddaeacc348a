use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::{Skill, SkillCatalog, SkillType};
use crate::model::*;

/// Ceiling for either mitigation axis, in percent.
pub const MITIGATION_CAP: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationSample {
    /// Whole seconds from the start of the fight.
    pub time: u32,
    pub physical_mitigation: f64,
    pub magical_mitigation: f64,
    pub is_invincible: bool,
}

/// Dense per-second mitigation series for a whole fight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationCurve {
    pub samples: Vec<MitigationSample>,
    pub max_physical: f64,
    pub max_magical: f64,
}

impl MitigationCurve {
    pub fn at(&self, second: u32) -> Option<&MitigationSample> {
        self.samples.get(second as usize)
    }

    pub fn invincible_seconds(&self) -> usize {
        self.samples.iter().filter(|s| s.is_invincible).count()
    }
}

/// Sample the party's combined mitigation at `t = 0, 1, … floor(duration / 1000)`.
///
/// At each instant only mitigation-type skills whose effect window contains
/// the instant count, each skill id at most once. Any active invincible skill
/// forces both axes to 100; otherwise contributions are summed per axis and
/// capped at 100.
pub fn aggregate_mitigation(party: &Party, catalog: &SkillCatalog, duration: Ms) -> MitigationCurve {
    let started = std::time::Instant::now();

    // Resolve the catalog once; the per-second loop only walks this list.
    let mut windows: Vec<(&Skill, Span)> = party
        .placements()
        .filter_map(|(_, placement)| {
            let skill = catalog.get_skill_by_id(&placement.skill_id)?;
            (skill.skill_type == SkillType::Mitigation).then(|| (skill, skill.effect_span(placement.time)))
        })
        .filter(|(_, span)| !span.is_empty())
        .collect();
    windows.sort_by_key(|(_, span)| span.start);

    let last_second = (duration.max(0) / 1000) as u32;
    let mut samples = Vec::with_capacity(last_second as usize + 1);
    let mut max_physical: f64 = 0.0;
    let mut max_magical: f64 = 0.0;
    let mut seen: HashSet<&str> = HashSet::new();

    for second in 0..=last_second {
        let instant = Ms::from(second) * 1000;
        seen.clear();

        let mut physical = 0.0;
        let mut magical = 0.0;
        let mut is_invincible = false;

        // Everything at index >= right_bound starts after this instant.
        let right_bound = windows.partition_point(|(_, span)| span.start <= instant);
        for (skill, span) in &windows[..right_bound] {
            if !span.contains_instant(instant) || !seen.insert(skill.id.as_str()) {
                continue;
            }
            is_invincible |= skill.is_invincible();
            physical += skill.physical_mitigation.unwrap_or(0.0);
            magical += skill.magical_mitigation.unwrap_or(0.0);
        }

        if is_invincible {
            physical = MITIGATION_CAP;
            magical = MITIGATION_CAP;
        } else {
            physical = physical.min(MITIGATION_CAP);
            magical = magical.min(MITIGATION_CAP);
        }

        max_physical = max_physical.max(physical);
        max_magical = max_magical.max(magical);
        samples.push(MitigationSample {
            time: second,
            physical_mitigation: physical,
            magical_mitigation: magical,
            is_invincible,
        });
    }

    metrics::histogram!(crate::observability::MITIGATION_COMPUTE_SECONDS)
        .record(started.elapsed().as_secs_f64());

    MitigationCurve {
        samples,
        max_physical,
        max_magical,
    }
}
