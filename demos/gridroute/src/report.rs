//! Plain-text run report.

use gr_agent::DeliveryAgent;
use gr_sim::{Sim, SimSummary};

pub fn print_run(sim: &Sim, summary: &SimSummary, with_paths: bool) {
    println!(
        "\n{} after {} ticks: {} finished, {} incapable, {} running\n",
        summary.outcome, summary.ticks_run, summary.finished, summary.incapable, summary.running
    );
    println!(
        "{:<24} {:<24} {:<22} {:>9} {:>9} {:>7} {:>7} {:>6}",
        "agent", "pilot", "status", "plan_ms", "total_ms", "replans", "planned", "steps"
    );
    for agent in sim.agents() {
        print_metrics(agent);
    }
    if with_paths {
        println!();
        for agent in sim.agents() {
            let path: Vec<String> = agent
                .history()
                .iter()
                .map(|&n| sim.graph().cell(n).to_string())
                .collect();
            println!("{}: {}", agent.name(), path.join(" "));
        }
    }
}

fn print_metrics(agent: &DeliveryAgent) {
    let m = agent.metrics();
    let status = match agent.status().finish_tick() {
        Some(tick) => format!("{} @{}", agent.status(), tick),
        None => agent.status().to_string(),
    };
    println!(
        "{:<24} {:<24} {:<22} {:>9.3} {:>9.3} {:>7} {:>7} {:>6}",
        agent.name(),
        agent.pilot_label(),
        status,
        m.initial_plan_time.unwrap_or_default().as_secs_f64() * 1e3,
        m.total_plan_time.as_secs_f64() * 1e3,
        m.replan_count(),
        m.planned_path_length,
        m.steps,
    );
}
