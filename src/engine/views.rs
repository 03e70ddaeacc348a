//! Memoized derived views.
//!
//! Mitigation and interference are pure functions of the party document (and,
//! for mitigation, the content duration). Editors bump a revision counter on
//! every change, so a cached result stays valid exactly as long as the key it
//! was computed under matches the current one.

use std::collections::HashMap;

use crate::model::{Id, Ms};

use super::interference::{detect_interference, SkillInterference};
use super::mitigation::{aggregate_mitigation, MitigationCurve};
use super::party::PartyEditor;
use super::timeline::TimelineEditor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone)]
struct Cached<K, V> {
    key: K,
    value: V,
}

/// Cache for the views derived from one party. Passing an editor for a
/// different party is not detected; use one `PlanViews` per party.
#[derive(Debug, Clone, Default)]
pub struct PlanViews {
    mitigation: Option<Cached<(u64, Ms), MitigationCurve>>,
    interference: Option<Cached<u64, HashMap<Id, SkillInterference>>>,
    stats: ViewStats,
}

impl PlanViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ViewStats {
        self.stats
    }

    pub fn mitigation(&mut self, party: &PartyEditor, content: &TimelineEditor) -> &MitigationCurve {
        self.mitigation_for(party, content.content().duration)
    }

    /// Recomputes only when the party revision or the duration moved.
    pub fn mitigation_for(&mut self, party: &PartyEditor, duration: Ms) -> &MitigationCurve {
        let key = (party.revision(), duration);
        let cached = match self.mitigation.take() {
            Some(c) if c.key == key => {
                self.stats.hits += 1;
                c
            }
            _ => {
                self.stats.misses += 1;
                Cached {
                    key,
                    value: aggregate_mitigation(party.party(), party.catalog(), duration),
                }
            }
        };
        &self.mitigation.insert(cached).value
    }

    pub fn interference(&mut self, party: &PartyEditor) -> &HashMap<Id, SkillInterference> {
        let key = party.revision();
        let cached = match self.interference.take() {
            Some(c) if c.key == key => {
                self.stats.hits += 1;
                c
            }
            _ => {
                self.stats.misses += 1;
                Cached {
                    key,
                    value: detect_interference(party.party(), party.catalog()),
                }
            }
        };
        &self.interference.insert(cached).value
    }

    /// Drop everything, e.g. after swapping in another party.
    pub fn invalidate(&mut self) {
        self.mitigation = None;
        self.interference = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::fixtures::catalog;
    use crate::engine::party::NewPlacement;
    use crate::model::Content;

    #[test]
    fn recompute_only_after_change() {
        let mut party = PartyEditor::create("Static", "c", Arc::new(catalog()));
        let content = TimelineEditor::new(Content::new("Raid", "Boss", 60_000));
        let mut views = PlanViews::new();

        assert_eq!(views.mitigation(&party, &content).max_physical, 0.0);
        views.mitigation(&party, &content);
        assert_eq!(views.stats(), ViewStats { hits: 1, misses: 1 });

        let tank = party.party().members[0].id.clone();
        party
            .add_skill(
                &tank,
                NewPlacement {
                    skill_id: "TANK_REPRISAL".into(),
                    time: 0,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(views.mitigation(&party, &content).max_physical, 10.0);
        assert_eq!(views.stats().misses, 2);

        // Undo is a change too.
        party.undo().unwrap();
        assert_eq!(views.mitigation(&party, &content).max_physical, 0.0);
        assert_eq!(views.stats().misses, 3);
    }

    #[test]
    fn duration_is_part_of_the_key() {
        let party = PartyEditor::create("Static", "c", Arc::new(catalog()));
        let mut views = PlanViews::new();
        assert_eq!(views.mitigation_for(&party, 10_000).samples.len(), 11);
        assert_eq!(views.mitigation_for(&party, 20_000).samples.len(), 21);
        assert_eq!(views.stats().misses, 2);
    }

    #[test]
    fn interference_is_cached_per_revision() {
        let mut party = PartyEditor::create("Static", "c", Arc::new(catalog()));
        let mut views = PlanViews::new();
        let a = party.party().members[0].id.clone();
        let b = party.party().members[1].id.clone();
        let pa = party
            .add_skill(&a, NewPlacement { skill_id: "TANK_REPRISAL".into(), time: 0, ..Default::default() })
            .unwrap();
        assert!(!views.interference(&party)[&pa].has_interference);

        party
            .add_skill(&b, NewPlacement { skill_id: "TANK_REPRISAL".into(), time: 5_000, ..Default::default() })
            .unwrap();
        assert!(views.interference(&party)[&pa].has_interference);
        views.interference(&party);
        assert_eq!(views.stats(), ViewStats { hits: 1, misses: 2 });

        views.invalidate();
        views.interference(&party);
        assert_eq!(views.stats().misses, 3);
    }
}
