use std::sync::Arc;
use std::time::{Duration, Instant};

use raidplan::catalog::{Job, RoleSkills, Skill, SkillCatalog, SkillMaster, SkillType};
use raidplan::engine::{
    aggregate_mitigation, detect_interference, find_available_lane, NewPlacement, PartyEditor, PlanViews,
};
use raidplan::model::{Ms, Role};

const MINUTE: Ms = 60_000;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn skill(id: String, role: Option<Role>, recast: Ms, duration: Ms, mitigation: f64) -> Skill {
    Skill {
        id,
        name: String::new(),
        job: None,
        role,
        cast_time: None,
        recast,
        duration,
        skill_type: SkillType::Mitigation,
        icon: None,
        physical_mitigation: Some(mitigation),
        magical_mitigation: Some(mitigation),
        buff_power: None,
        invincible: None,
    }
}

/// Eight jobs with twelve skills each, plus shared role skills.
fn synthetic_catalog() -> SkillCatalog {
    let roster = [
        ("Paladin", Role::Tank),
        ("Warrior", Role::Tank),
        ("White Mage", Role::Healer),
        ("Scholar", Role::Healer),
        ("Dragoon", Role::Dps),
        ("Ninja", Role::Dps),
        ("Black Mage", Role::Dps),
        ("Bard", Role::Dps),
    ];
    let jobs = roster
        .iter()
        .map(|(name, role)| Job {
            id: name.to_string(),
            name: name.to_string(),
            role: *role,
            color: String::new(),
            skills: (0..12)
                .map(|i| skill(format!("{name}-{i}"), None, (i + 1) * 15_000, 10_000 + i * 1_000, 5.0))
                .collect(),
        })
        .collect();
    let role_skill = |role: Role, name: &str| skill(format!("{name}-shared"), Some(role), 60_000, 10_000, 10.0);
    SkillCatalog::new(SkillMaster {
        jobs,
        role_skills: RoleSkills {
            tank: vec![role_skill(Role::Tank, "tank")],
            healer: vec![role_skill(Role::Healer, "healer")],
            dps: vec![role_skill(Role::Dps, "dps")],
        },
        common_skills: vec![],
    })
}

/// Fill every member's timeline with placements every few seconds.
fn phase1_place_skills(editor: &mut PartyEditor, duration: Ms) -> usize {
    let mut latencies = Vec::new();
    let members: Vec<_> = editor
        .party()
        .members
        .iter()
        .map(|m| (m.id.clone(), m.job.clone(), m.role))
        .collect();

    for (member_id, job, role) in &members {
        let shared = match role {
            Role::Tank => "tank-shared",
            Role::Healer => "healer-shared",
            Role::Dps => "dps-shared",
        };
        let mut time = 0;
        let mut i = 0;
        while time < duration {
            let skill_id = if i % 5 == 0 { shared.to_string() } else { format!("{job}-{}", i % 12) };
            let t = Instant::now();
            editor
                .add_skill(
                    member_id,
                    NewPlacement {
                        skill_id,
                        time,
                        ..Default::default()
                    },
                )
                .expect("member exists");
            latencies.push(t.elapsed());
            time += 4_000;
            i += 1;
        }
    }

    let n = latencies.len();
    print_latency("add_skill (auto lane)", &mut latencies);
    n
}

fn phase2_lane_scan(editor: &PartyEditor, catalog: &SkillCatalog, duration: Ms) {
    let member = &editor.party().members[0];
    let Some(skill) = catalog.get_skill_by_id("Paladin-0") else {
        return;
    };
    let mut latencies = Vec::new();
    let mut time = 0;
    while time < duration {
        let t = Instant::now();
        std::hint::black_box(find_available_lane(&member.skill_placements, skill, time, None, catalog));
        latencies.push(t.elapsed());
        time += 1_000;
    }
    print_latency("find_available_lane", &mut latencies);
}

fn phase3_mitigation(editor: &PartyEditor, catalog: &SkillCatalog, duration: Ms) {
    let mut latencies = Vec::new();
    for _ in 0..50 {
        let t = Instant::now();
        std::hint::black_box(aggregate_mitigation(editor.party(), catalog, duration));
        latencies.push(t.elapsed());
    }
    print_latency("aggregate_mitigation", &mut latencies);

    let mut latencies = Vec::new();
    for _ in 0..50 {
        let t = Instant::now();
        std::hint::black_box(detect_interference(editor.party(), catalog));
        latencies.push(t.elapsed());
    }
    print_latency("detect_interference", &mut latencies);
}

fn phase4_cached_views(editor: &mut PartyEditor, duration: Ms) {
    let mut views = PlanViews::new();
    let mut latencies = Vec::new();
    for round in 0..200 {
        // Every tenth read follows an edit and has to recompute.
        if round % 10 == 0 {
            let id = editor.party().members[0].skill_placements[0].id.clone();
            editor.move_skill(&id, (round as Ms) * 100).expect("placement exists");
        }
        let t = Instant::now();
        std::hint::black_box(views.mitigation_for(editor, duration).max_physical);
        latencies.push(t.elapsed());
    }
    print_latency("cached mitigation read", &mut latencies);
    let stats = views.stats();
    println!("    hits={}, misses={}", stats.hits, stats.misses);
}

fn main() {
    let minutes: Ms = std::env::var("RAIDPLAN_BENCH_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let duration = minutes * MINUTE;

    println!("=== raidplan stress benchmark ===");
    println!("fight length: {minutes} min\n");

    let catalog = Arc::new(synthetic_catalog());
    let mut editor = PartyEditor::create("Bench", "bench", catalog.clone());

    println!("[phase 1] placement with lane assignment");
    let placed = phase1_place_skills(&mut editor, duration);
    println!("  {placed} placements across {} members", editor.party().members.len());

    println!("\n[phase 2] lane scan on a dense member");
    phase2_lane_scan(&editor, &catalog, duration);

    println!("\n[phase 3] derived views, uncached");
    phase3_mitigation(&editor, &catalog, duration);

    println!("\n[phase 4] derived views through the revision cache");
    phase4_cached_views(&mut editor, duration);

    println!("\n=== benchmark complete ===");
}
