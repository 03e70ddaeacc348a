use std::collections::HashSet;

use crate::model::*;

/// Narrow a timeline's gimmicks by their tactical metadata.
///
/// Legacy gimmicks without a category are always shown unless
/// `only_with_metadata` is set. Every non-empty set requires the matching
/// field to be present and in the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GimmickFilter {
    pub categories: HashSet<GimmickCategory>,
    pub severities: HashSet<Severity>,
    pub mitigations: HashSet<MitigationLevel>,
    /// `None` means every role.
    pub role: Option<Role>,
    pub only_with_metadata: bool,
}

fn toggle<T: std::hash::Hash + Eq>(set: &mut HashSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

fn passes<T: std::hash::Hash + Eq>(set: &HashSet<T>, value: Option<&T>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

/// Targets that concern a role. Tank busters aimed at MT or ST count for tanks.
fn role_targets(role: Role) -> &'static [TargetType] {
    match role {
        Role::Tank => &[TargetType::Tanks, TargetType::Mt, TargetType::St, TargetType::All],
        Role::Healer => &[TargetType::Healers, TargetType::All],
        Role::Dps => &[TargetType::Dps, TargetType::All],
    }
}

impl GimmickFilter {
    pub fn toggle_category(&mut self, category: GimmickCategory) {
        toggle(&mut self.categories, category);
    }

    pub fn toggle_severity(&mut self, severity: Severity) {
        toggle(&mut self.severities, severity);
    }

    pub fn toggle_mitigation(&mut self, mitigation: MitigationLevel) {
        toggle(&mut self.mitigations, mitigation);
    }

    pub fn is_active(&self) -> bool {
        !self.categories.is_empty()
            || !self.severities.is_empty()
            || !self.mitigations.is_empty()
            || self.role.is_some()
            || self.only_with_metadata
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, gimmick: &Gimmick) -> bool {
        if gimmick.category.is_none() {
            return !self.only_with_metadata;
        }
        if !passes(&self.categories, gimmick.category.as_ref())
            || !passes(&self.severities, gimmick.severity.as_ref())
            || !passes(&self.mitigations, gimmick.mitigation.as_ref())
        {
            return false;
        }
        match (self.role, gimmick.targets.as_deref()) {
            (None, _) | (_, None) | (_, Some([])) => true,
            (Some(role), Some(targets)) => {
                let wanted = role_targets(role);
                targets.iter().any(|t| wanted.contains(t))
            }
        }
    }

    /// Matching gimmicks in timeline order.
    pub fn apply<'a>(&self, content: &'a Content) -> Vec<&'a Gimmick> {
        content.gimmicks.iter().filter(|g| self.matches(g)).collect()
    }
}
