use std::path::PathBuf;

use tracing::info;

use raidplan::import::load_plan;
use raidplan::report::PlanReport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("RAIDPLAN_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    raidplan::observability::init(metrics_port)?;

    let mut args = std::env::args().skip(1);
    let catalog = std::env::var("RAIDPLAN_CATALOG").unwrap_or_else(|_| "./data/skills/jobs.json".into());
    let content = args
        .next()
        .or_else(|| std::env::var("RAIDPLAN_CONTENT").ok())
        .ok_or("no content file: pass it as the first argument or set RAIDPLAN_CONTENT")?;
    let party = args.next().or_else(|| std::env::var("RAIDPLAN_PARTY").ok());

    info!("raidplan starting");
    info!("  catalog: {catalog}");
    info!("  content: {content}");
    info!("  party: {}", party.as_deref().unwrap_or("none"));
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let party = party.map(PathBuf::from);
    let plan = load_plan(&PathBuf::from(catalog), &PathBuf::from(content), party.as_deref()).await?;
    info!(skills = plan.catalog.len(), phases = plan.content.phases.len(), "documents loaded");

    let report = PlanReport::build(&plan.content, plan.party.as_ref(), &plan.catalog);
    println!("{}", report.to_json()?);
    Ok(())
}
