use crate::limits::*;
use crate::model::*;

use super::history::{DocumentKind, History};
use super::EngineError;

// ── Patches ──────────────────────────────────────────────────────
//
// `None` leaves a field alone. For optional document fields the inner
// option distinguishes "clear" (`Some(None)`) from "set" (`Some(Some(v))`).

#[derive(Debug, Clone, Default)]
pub struct ContentPatch {
    pub raid_name: Option<String>,
    pub boss_name: Option<String>,
    pub duration: Option<Ms>,
    pub targets: Option<Option<Vec<String>>>,
}

#[derive(Debug, Clone, Default)]
pub struct PhasePatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewGimmick {
    pub name: Option<String>,
    pub time: Ms,
    pub cast_duration: Option<Ms>,
}

#[derive(Debug, Clone, Default)]
pub struct GimmickPatch {
    pub name: Option<String>,
    pub time: Option<Ms>,
    pub cast_duration: Option<Ms>,
    pub memo: Option<Option<String>>,
    pub category: Option<Option<GimmickCategory>>,
    pub damage_type: Option<Option<DamageType>>,
    pub severity: Option<Option<Severity>>,
    pub mitigation: Option<Option<MitigationLevel>>,
    pub targets: Option<Option<Vec<TargetType>>>,
    pub description: Option<Option<String>>,
    pub mechanics: Option<Option<Vec<String>>>,
}

#[derive(Debug, Clone, Default)]
pub struct BurstPatch {
    pub name: Option<Option<String>>,
    pub start_time: Option<Ms>,
    pub end_time: Option<Ms>,
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Owns one Content document and its undo history. Every successful
/// mutation snapshots the pre-mutation document first; a refused one
/// touches neither.
#[derive(Debug, Clone)]
pub struct TimelineEditor {
    content: Content,
    history: History<Content>,
    revision: u64,
}

impl TimelineEditor {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            history: History::new(DocumentKind::Content),
            revision: 0,
        }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn into_content(self) -> Content {
        self.content
    }

    pub fn history(&self) -> &History<Content> {
        &self.history
    }

    /// Bumped by every change to the document, undo and redo included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Snapshot, then apply. `op` is only a metric label.
    fn commit<R>(&mut self, op: &'static str, f: impl FnOnce(&mut Content) -> R) -> R {
        self.history.push(self.content.clone());
        let out = f(&mut self.content);
        self.revision += 1;
        metrics::counter!(crate::observability::MUTATIONS_TOTAL, "document" => "content", "op" => op)
            .increment(1);
        tracing::debug!(op, revision = self.revision, "content mutated");
        out
    }

    fn reject(op: &'static str, err: EngineError) -> EngineError {
        metrics::counter!(crate::observability::REJECTED_MUTATIONS_TOTAL, "document" => "content", "op" => op)
            .increment(1);
        tracing::debug!(op, %err, "content mutation rejected");
        err
    }

    pub fn undo(&mut self) -> Result<(), EngineError> {
        if !self.history.undo(&mut self.content) {
            return Err(EngineError::NothingToUndo);
        }
        self.revision += 1;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EngineError> {
        if !self.history.redo(&mut self.content) {
            return Err(EngineError::NothingToRedo);
        }
        self.revision += 1;
        Ok(())
    }

    // ── Content ──────────────────────────────────────────────────

    /// Changing the duration re-pins the end of the last phase.
    pub fn update_content(&mut self, patch: ContentPatch) -> Result<(), EngineError> {
        if let Some(duration) = patch.duration {
            let last_start = self.content.phases.last().map_or(0, |p| p.start_time);
            if duration <= last_start {
                return Err(Self::reject(
                    "update_content",
                    EngineError::InvalidOperation("duration would empty the last phase"),
                ));
            }
        }
        self.commit("update_content", |c| {
            apply(&mut c.raid_name, patch.raid_name);
            apply(&mut c.boss_name, patch.boss_name);
            apply(&mut c.targets, patch.targets);
            if let Some(duration) = patch.duration {
                c.duration = duration;
                if let Some(last) = c.phases.last_mut() {
                    last.end_time = duration;
                }
            }
        });
        Ok(())
    }

    // ── Phases ───────────────────────────────────────────────────

    /// Split a phase at `time`, which must lie strictly inside it. Returns
    /// the id of the new phase covering `[time, old_end)`.
    pub fn split_phase(&mut self, phase_id: &str, time: Ms) -> Result<Id, EngineError> {
        let Some(index) = self.content.phase_index(phase_id) else {
            return Err(Self::reject("split_phase", EngineError::NotFound(phase_id.into())));
        };
        let phase = &self.content.phases[index];
        if time <= phase.start_time || time >= phase.end_time {
            return Err(Self::reject(
                "split_phase",
                EngineError::InvalidOperation("split point outside phase"),
            ));
        }

        let created = new_id();
        let id = created.clone();
        self.commit("split_phase", |c| {
            let count = c.phases.len();
            let old_end = c.phases[index].end_time;
            c.phases[index].end_time = time;
            c.phases.insert(
                index + 1,
                Phase {
                    id,
                    name: format!("Phase {}", count + 1),
                    start_time: time,
                    end_time: old_end,
                    color: phase_color(count).into(),
                },
            );
        });
        Ok(created)
    }

    /// Rename or recolour. Bounds change only through the structural operations.
    pub fn update_phase(&mut self, phase_id: &str, patch: PhasePatch) -> Result<(), EngineError> {
        let Some(index) = self.content.phase_index(phase_id) else {
            return Err(Self::reject("update_phase", EngineError::NotFound(phase_id.into())));
        };
        self.commit("update_phase", |c| {
            let phase = &mut c.phases[index];
            apply(&mut phase.name, patch.name);
            apply(&mut phase.color, patch.color);
        });
        Ok(())
    }

    /// Remove a phase, folding its interval into the previous phase (or into
    /// the next one when deleting the first). The last phase cannot go.
    pub fn delete_phase(&mut self, phase_id: &str) -> Result<(), EngineError> {
        if self.content.phases.len() <= 1 {
            return Err(Self::reject(
                "delete_phase",
                EngineError::InvalidOperation("cannot delete the only phase"),
            ));
        }
        let Some(index) = self.content.phase_index(phase_id) else {
            return Err(Self::reject("delete_phase", EngineError::NotFound(phase_id.into())));
        };
        self.commit("delete_phase", |c| {
            let removed = c.phases.remove(index);
            if index > 0 {
                c.phases[index - 1].end_time = removed.end_time;
            } else {
                c.phases[0].start_time = removed.start_time;
            }
        });
        Ok(())
    }

    /// Translate a phase and every later phase by the same delta, keeping
    /// their lengths. The previous phase stretches or shrinks to meet it and
    /// the last phase stays pinned to the content duration.
    pub fn move_phase(&mut self, phase_id: &str, new_start: Ms) -> Result<(), EngineError> {
        let Some(index) = self.content.phase_index(phase_id) else {
            return Err(Self::reject("move_phase", EngineError::NotFound(phase_id.into())));
        };
        if index == 0 {
            return Err(Self::reject(
                "move_phase",
                EngineError::InvalidOperation("first phase is pinned at 0"),
            ));
        }
        let phases = &self.content.phases;
        let last = &phases[phases.len() - 1];
        let delta = match new_start.checked_sub(phases[index].start_time) {
            Some(delta)
                if new_start > phases[index - 1].start_time
                    && last.start_time.checked_add(delta).is_some_and(|s| s < self.content.duration) =>
            {
                delta
            }
            _ => {
                return Err(Self::reject(
                    "move_phase",
                    EngineError::InvalidOperation("moved phases must stay within the timeline"),
                ));
            }
        };

        self.commit("move_phase", |c| {
            c.phases[index - 1].end_time = new_start;
            for phase in &mut c.phases[index..] {
                phase.start_time += delta;
                phase.end_time = phase.end_time.saturating_add(delta);
            }
            let duration = c.duration;
            if let Some(last) = c.phases.last_mut() {
                last.end_time = duration;
            }
        });
        Ok(())
    }

    /// Move only the boundary between a phase and its predecessor.
    pub fn move_phase_divider(&mut self, phase_id: &str, new_time: Ms) -> Result<(), EngineError> {
        let Some(index) = self.content.phase_index(phase_id) else {
            return Err(Self::reject("move_phase_divider", EngineError::NotFound(phase_id.into())));
        };
        if index == 0 {
            return Err(Self::reject(
                "move_phase_divider",
                EngineError::InvalidOperation("first phase has no divider"),
            ));
        }
        let prev = &self.content.phases[index - 1];
        let phase = &self.content.phases[index];
        if new_time <= prev.start_time || new_time >= phase.end_time {
            return Err(Self::reject(
                "move_phase_divider",
                EngineError::InvalidOperation("divider must stay between neighbouring phases"),
            ));
        }
        self.commit("move_phase_divider", |c| {
            c.phases[index - 1].end_time = new_time;
            c.phases[index].start_time = new_time;
        });
        Ok(())
    }

    // ── Gimmicks ─────────────────────────────────────────────────

    /// The containing phase's id, or the first phase's when `time` is outside the timeline.
    pub fn add_gimmick(&mut self, new: NewGimmick) -> Result<Id, EngineError> {
        let phase_id = self
            .content
            .phase_at(new.time)
            .or_else(|| self.content.phases.first())
            .map(|p| p.id.clone())
            .unwrap_or_default();
        let gimmick = Gimmick {
            id: new_id(),
            name: new.name.unwrap_or_else(|| "New gimmick".into()),
            time: new.time,
            cast_duration: new.cast_duration.unwrap_or(DEFAULT_CAST_DURATION_MS),
            phase_id,
            memo: None,
            category: None,
            damage_type: None,
            severity: None,
            mitigation: None,
            targets: None,
            description: None,
            mechanics: None,
        };
        let id = gimmick.id.clone();
        self.commit("add_gimmick", |c| c.gimmicks.push(gimmick));
        Ok(id)
    }

    /// Apply a patch, then re-derive the phase from the (possibly new) time.
    pub fn update_gimmick(&mut self, gimmick_id: &str, patch: GimmickPatch) -> Result<(), EngineError> {
        let Some(index) = self.content.gimmicks.iter().position(|g| g.id == gimmick_id) else {
            return Err(Self::reject("update_gimmick", EngineError::NotFound(gimmick_id.into())));
        };
        self.commit("update_gimmick", |c| {
            let g = &mut c.gimmicks[index];
            apply(&mut g.name, patch.name);
            apply(&mut g.time, patch.time);
            apply(&mut g.cast_duration, patch.cast_duration);
            apply(&mut g.memo, patch.memo);
            apply(&mut g.category, patch.category);
            apply(&mut g.damage_type, patch.damage_type);
            apply(&mut g.severity, patch.severity);
            apply(&mut g.mitigation, patch.mitigation);
            apply(&mut g.targets, patch.targets);
            apply(&mut g.description, patch.description);
            apply(&mut g.mechanics, patch.mechanics);
            reassign_phase(c, index);
        });
        Ok(())
    }

    pub fn delete_gimmick(&mut self, gimmick_id: &str) -> Result<(), EngineError> {
        let Some(index) = self.content.gimmicks.iter().position(|g| g.id == gimmick_id) else {
            return Err(Self::reject("delete_gimmick", EngineError::NotFound(gimmick_id.into())));
        };
        self.commit("delete_gimmick", |c| {
            c.gimmicks.remove(index);
        });
        Ok(())
    }

    pub fn move_gimmick(&mut self, gimmick_id: &str, new_time: Ms) -> Result<(), EngineError> {
        let Some(index) = self.content.gimmicks.iter().position(|g| g.id == gimmick_id) else {
            return Err(Self::reject("move_gimmick", EngineError::NotFound(gimmick_id.into())));
        };
        self.commit("move_gimmick", |c| {
            c.gimmicks[index].time = new_time;
            reassign_phase(c, index);
        });
        Ok(())
    }

    // ── Bursts ───────────────────────────────────────────────────

    pub fn add_burst(&mut self, name: Option<String>, start_time: Ms, end_time: Option<Ms>) -> Result<Id, EngineError> {
        let end_time = end_time.unwrap_or(start_time.saturating_add(DEFAULT_BURST_LENGTH_MS));
        if end_time < start_time {
            return Err(Self::reject(
                "add_burst",
                EngineError::InvalidOperation("burst ends before it starts"),
            ));
        }
        let burst = BurstTiming {
            id: new_id(),
            name,
            start_time,
            end_time,
        };
        let id = burst.id.clone();
        self.commit("add_burst", |c| c.burst_timings.push(burst));
        Ok(id)
    }

    pub fn update_burst(&mut self, burst_id: &str, patch: BurstPatch) -> Result<(), EngineError> {
        let Some(index) = self.burst_index(burst_id) else {
            return Err(Self::reject("update_burst", EngineError::NotFound(burst_id.into())));
        };
        let burst = &self.content.burst_timings[index];
        let start = patch.start_time.unwrap_or(burst.start_time);
        let end = patch.end_time.unwrap_or(burst.end_time);
        if end < start {
            return Err(Self::reject(
                "update_burst",
                EngineError::InvalidOperation("burst ends before it starts"),
            ));
        }
        self.commit("update_burst", |c| {
            let b = &mut c.burst_timings[index];
            apply(&mut b.name, patch.name);
            b.start_time = start;
            b.end_time = end;
        });
        Ok(())
    }

    pub fn delete_burst(&mut self, burst_id: &str) -> Result<(), EngineError> {
        let Some(index) = self.burst_index(burst_id) else {
            return Err(Self::reject("delete_burst", EngineError::NotFound(burst_id.into())));
        };
        self.commit("delete_burst", |c| {
            c.burst_timings.remove(index);
        });
        Ok(())
    }

    /// Translate the window, keeping its length.
    pub fn move_burst(&mut self, burst_id: &str, new_start: Ms) -> Result<(), EngineError> {
        let Some(index) = self.burst_index(burst_id) else {
            return Err(Self::reject("move_burst", EngineError::NotFound(burst_id.into())));
        };
        self.commit("move_burst", |c| {
            let b = &mut c.burst_timings[index];
            let length = b.end_time.saturating_sub(b.start_time);
            b.start_time = new_start;
            b.end_time = new_start.saturating_add(length);
        });
        Ok(())
    }

    pub fn resize_burst(&mut self, burst_id: &str, start_time: Ms, end_time: Ms) -> Result<(), EngineError> {
        self.update_burst(
            burst_id,
            BurstPatch {
                name: None,
                start_time: Some(start_time),
                end_time: Some(end_time),
            },
        )
    }

    fn burst_index(&self, burst_id: &str) -> Option<usize> {
        self.content.burst_timings.iter().position(|b| b.id == burst_id)
    }

    // ── Memos ────────────────────────────────────────────────────

    pub fn add_memo(&mut self, time: Ms, text: impl Into<String>) -> Result<Id, EngineError> {
        let memo = TimelineMemo {
            id: new_id(),
            time,
            text: text.into(),
        };
        let id = memo.id.clone();
        self.commit("add_memo", |c| c.timeline_memos.get_or_insert_with(Vec::new).push(memo));
        Ok(id)
    }

    pub fn update_memo(&mut self, memo_id: &str, time: Option<Ms>, text: Option<String>) -> Result<(), EngineError> {
        let Some(index) = self.memo_index(memo_id) else {
            return Err(Self::reject("update_memo", EngineError::NotFound(memo_id.into())));
        };
        self.commit("update_memo", |c| {
            if let Some(memos) = c.timeline_memos.as_mut() {
                apply(&mut memos[index].time, time);
                apply(&mut memos[index].text, text);
            }
        });
        Ok(())
    }

    pub fn delete_memo(&mut self, memo_id: &str) -> Result<(), EngineError> {
        let Some(index) = self.memo_index(memo_id) else {
            return Err(Self::reject("delete_memo", EngineError::NotFound(memo_id.into())));
        };
        self.commit("delete_memo", |c| {
            if let Some(memos) = c.timeline_memos.as_mut() {
                memos.remove(index);
            }
        });
        Ok(())
    }

    pub fn move_memo(&mut self, memo_id: &str, new_time: Ms) -> Result<(), EngineError> {
        self.update_memo(memo_id, Some(new_time), None)
    }

    fn memo_index(&self, memo_id: &str) -> Option<usize> {
        self.content.memos().iter().position(|m| m.id == memo_id)
    }
}

/// Point a gimmick at the phase containing its time. Outside every phase the
/// previous assignment stands.
fn reassign_phase(content: &mut Content, gimmick_index: usize) {
    let time = content.gimmicks[gimmick_index].time;
    if let Some(phase) = content.phase_at(time) {
        let phase_id = phase.id.clone();
        content.gimmicks[gimmick_index].phase_id = phase_id;
    }
}
