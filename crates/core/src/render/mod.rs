use crate::domain::prediction::PriceSeries;
use anyhow::Result;

/// One labelled line on the chart. Historical and predicted prices arrive as
/// separate datasets; an empty series means "data unavailable" and backends
/// render a fallback for it instead of failing.
#[derive(Debug, Clone)]
pub struct ChartDataset {
    pub label: String,
    pub series: PriceSeries,
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub ticker: String,
    pub datasets: Vec<ChartDataset>,
}

/// Rendering port. The backend returns an owned handle for the drawn chart;
/// dropping the handle releases whatever the backend allocated for it.
pub trait ChartBackend {
    type Chart;

    fn draw(&mut self, spec: &ChartSpec) -> Result<Self::Chart>;
}

/// Owns the single live chart. Redrawing destroys the previous chart before
/// the backend draws the new one, so at most one handle exists at a time.
/// Replaces the legacy module-level chart-instance global.
pub struct ChartController<B: ChartBackend> {
    backend: B,
    current: Option<B::Chart>,
}

impl<B: ChartBackend> ChartController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    pub fn redraw(&mut self, spec: &ChartSpec) -> Result<()> {
        // Destroy first; a failed draw leaves no chart rather than a stale one.
        drop(self.current.take());
        self.current = Some(self.backend.draw(spec)?);
        Ok(())
    }

    pub fn has_chart(&self) -> bool {
        self.current.is_some()
    }
}
