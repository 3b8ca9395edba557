use anyhow::Result;
use budget_export::{init_tracing_once, ExportOptions, ProposalExporter};

fn main() -> Result<()> {
    init_tracing_once();

    let opts = ExportOptions::from_env()?;
    let summary = ProposalExporter::with_options(opts).run_remote()?;

    println!(
        "export finished: {} records, {} years ({})",
        summary.total_records, summary.total_years, summary.generated_at
    );
    Ok(())
}
