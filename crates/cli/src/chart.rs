use anyhow::Result;
use tickerdesk_core::render::{ChartBackend, ChartSpec};

/// Plain-text stand-in for the line chart: one row per date, one block per
/// dataset. Empty datasets render a fallback line instead of failing.
pub struct TextChart;

/// Nothing to release for stdout output; the handle only marks the chart as
/// drawn for the controller's replace-on-redraw bookkeeping.
pub struct TextChartHandle;

impl ChartBackend for TextChart {
    type Chart = TextChartHandle;

    fn draw(&mut self, spec: &ChartSpec) -> Result<Self::Chart> {
        println!("== {} ==", spec.ticker);
        for dataset in &spec.datasets {
            println!("-- {}", dataset.label);
            if dataset.series.is_empty() {
                println!("   (data unavailable)");
                continue;
            }
            for (date, price) in dataset.series.dates.iter().zip(&dataset.series.prices) {
                println!("   {date}  {price:>12.2}");
            }
        }
        Ok(TextChartHandle)
    }
}
