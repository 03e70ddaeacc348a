use crate::catalog::{Skill, SkillCatalog};
use crate::limits::MAX_LANES;
use crate::model::*;

/// True if no placement already on `lane` has a recast window overlapping the
/// candidate's. Placements whose skill is missing from the catalog occupy nothing.
pub fn is_lane_available(
    lane: u8,
    placements: &[SkillPlacement],
    skill: &Skill,
    time: Ms,
    exclude: Option<&str>,
    catalog: &SkillCatalog,
) -> bool {
    let candidate = skill.recast_span(time);
    for placement in placements {
        if exclude.is_some_and(|id| id == placement.id) {
            continue;
        }
        if placement.lane() != lane {
            continue;
        }
        let Some(placed) = catalog.get_skill_by_id(&placement.skill_id) else {
            continue;
        };
        if placed.recast_span(placement.time).overlaps(&candidate) {
            return false;
        }
    }
    true
}

/// Lowest lane in `[0, MAX_LANES)` free for the candidate. When every lane
/// conflicts the placement goes to lane 0 and simply overlaps visually.
pub fn find_available_lane(
    placements: &[SkillPlacement],
    skill: &Skill,
    time: Ms,
    exclude: Option<&str>,
    catalog: &SkillCatalog,
) -> u8 {
    for lane in 0..MAX_LANES {
        if is_lane_available(lane, placements, skill, time, exclude, catalog) {
            return lane;
        }
    }
    tracing::warn!(skill = %skill.id, time, "all lanes occupied, stacking on lane 0");
    0
}
