use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civic_import::{config::Args, import_file, ImportReport};

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("civic_import={},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    println!("🗄️  civic.json → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let overrides = args
        .load_overrides()
        .context("Failed to load identifier overrides")?;

    let report = import_file(&args.dataset, &args.database, args.fresh, &overrides)
        .with_context(|| format!("Import of {} failed", args.dataset.display()))?;

    print_report(&report);

    Ok(())
}

fn print_report(report: &ImportReport) {
    let counts = &report.counts;

    println!("\n📂 Read {} nodes ({} rendered).", report.nodes_read, report.nodes_rendered);
    println!("✓ Wrote {} Entity entries.", counts.entities);
    println!("✓ Wrote {} Category entries.", counts.categories);
    println!("✓ Wrote {} Keyperson entries.", counts.key_people);
    println!("✓ Wrote {} Revenue entries.", counts.revenues);
    println!("✓ Wrote {} Expense entries.", counts.expenses);
    println!("✓ Wrote {} Relation entries.", counts.relations);
    println!("✓ Wrote {} Connection entries.", counts.connections);
    println!("✓ Wrote {} Funding entries.", counts.fundings);
    println!("✓ Wrote {} Investment entries.", counts.investments);

    if !report.skipped_overrides.is_empty() {
        println!("\n⚠️  Skipped {} identifier overrides:", report.skipped_overrides.len());
        for rule in &report.skipped_overrides {
            println!("   {} → {} (substitute not rendered)", rule.broken_id, rule.substitute_id);
        }
    }

    if report.skipped_edges() > 0 {
        println!("\n⚠️  Skipped {} edges:", report.skipped_edges());
        for (kind, failures) in report.links.failures_by_kind() {
            println!("   {} ({}):", kind, failures.len());
            for failure in failures {
                println!("     {}", failure);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Run {} committed", report.run_id);
}
