//! List command - show the registered charts

use console::style;
use miette::Result;

use bow_chart::ChartRegistry;

pub fn run() -> Result<()> {
    let registry = ChartRegistry::builtin();

    println!(
        "{:<16} {:<12} {}",
        style("NAME").bold(),
        style("VERSION").bold(),
        style("DESCRIPTION").bold()
    );
    for chart in registry.iter() {
        println!(
            "{:<16} {:<12} {}",
            chart.name(),
            chart.version(),
            chart.description()
        );
    }

    Ok(())
}
