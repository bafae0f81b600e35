use crate::stream::RunStats;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Metrics {
    registry: Registry,
    pub lines: IntCounter,
    pub blocks: IntCounter,
    pub rows: IntCounter,
    pub rows_obfuscated: IntCounter,
    pub row_errors: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| -> Result<IntCounter, MetricsError> {
            let c = IntCounter::new(name, help)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };
        let lines = counter("pgdump_lines_total", "Input lines read")?;
        let blocks = counter("pgdump_blocks_total", "COPY blocks seen")?;
        let rows = counter("pgdump_rows_total", "COPY data rows seen")?;
        let rows_obfuscated = counter(
            "pgdump_rows_obfuscated_total",
            "Data rows of targeted tables passed through the row transformer",
        )?;
        let row_errors = counter("pgdump_row_errors_total", "Data rows that failed to transform")?;
        Ok(Self {
            registry,
            lines,
            blocks,
            rows,
            rows_obfuscated,
            row_errors,
        })
    }

    pub fn record(&self, stats: &RunStats) {
        self.lines.inc_by(stats.lines);
        self.blocks.inc_by(stats.blocks);
        self.rows.inc_by(stats.rows);
        self.rows_obfuscated.inc_by(stats.rows_obfuscated);
        self.row_errors.inc_by(stats.row_errors);
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn write_to(&self, path: &Path) -> Result<(), MetricsError> {
        std::fs::write(path, self.render()?)?;
        Ok(())
    }
}
