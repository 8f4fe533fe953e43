//! Sweep population export for external plotting tools.
//!
//! The optimizer hands the full evaluated grid, the winner and the
//! feasible-region box to a [`SweepObserver`]; the writers here serialize
//! that hand-off as CSV or JSON so a plotting front end can draw the
//! energy/distance scatter, highlight the winner and frame the feasible
//! region. Column order follows the historical positional row layout of
//! [`LinkReport`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::ValueEnum;

use loraplan_phy::LinkReport;
use loraplan_sweep::{FeasibleRegion, SweepObserver};

/// File format for the exported sweep population.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    /// One row per grid point, positional column order plus flags.
    Csv,
    /// Single document with the region, the winner and all results.
    Json,
}

/// CSV header matching [`LinkReport::as_row`] plus feasibility/winner flags.
const CSV_HEADER: &str = "max_distance_km,charge_uc,spreading_factor,coding_rate,\
bandwidth_khz,tx_power_dbm,max_path_loss_db,rssi_dbm,packet_time_ms,payload_bytes,\
feasible,best";

/// Write the population as CSV.
pub fn export_csv<W: Write>(
    results: &[LinkReport],
    best: &LinkReport,
    region: &FeasibleRegion,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for report in results {
        for value in report.as_row() {
            write!(writer, "{},", value)?;
        }
        writeln!(writer, "{},{}", region.contains(report), report == best)?;
    }
    Ok(())
}

/// Write the population as a single JSON document.
pub fn export_json<W: Write>(
    results: &[LinkReport],
    best: &LinkReport,
    region: &FeasibleRegion,
    writer: &mut W,
) -> io::Result<()> {
    let document = serde_json::json!({
        "region": region,
        "best": best,
        "results": results,
    });
    serde_json::to_writer_pretty(&mut *writer, &document)?;
    writeln!(writer)?;
    Ok(())
}

/// [`SweepObserver`] that writes the sweep hand-off to a file.
///
/// `observe` cannot return an error, so the write outcome is buffered and
/// surfaced through [`FileExporter::finish`].
pub struct FileExporter {
    path: PathBuf,
    format: ExportFormat,
    outcome: io::Result<()>,
}

impl FileExporter {
    /// Create an exporter targeting `path`.
    pub fn new(path: PathBuf, format: ExportFormat) -> Self {
        FileExporter {
            path,
            format,
            outcome: Ok(()),
        }
    }

    /// Consume the exporter, returning the outcome of the write.
    pub fn finish(self) -> io::Result<()> {
        self.outcome
    }

    fn write(
        &self,
        results: &[LinkReport],
        best: &LinkReport,
        region: &FeasibleRegion,
    ) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        match self.format {
            ExportFormat::Csv => export_csv(results, best, region, &mut writer)?,
            ExportFormat::Json => export_json(results, best, region, &mut writer)?,
        }
        writer.flush()
    }
}

impl SweepObserver for FileExporter {
    fn observe(&mut self, results: &[LinkReport], best: &LinkReport, region: &FeasibleRegion) {
        self.outcome = self.write(results, best, region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loraplan_sweep::{optimize, SweepConfig};

    #[test]
    fn test_csv_export_has_one_row_per_grid_point() {
        let config = SweepConfig::default();
        let outcome = optimize(&config).unwrap();

        let mut buffer = Vec::new();
        export_csv(
            &outcome.results,
            outcome.best(),
            &config.region,
            &mut buffer,
        )
        .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), outcome.results.len() + 1);
        assert!(lines[0].starts_with("max_distance_km,charge_uc,"));

        let winners = lines[1..]
            .iter()
            .filter(|line| line.ends_with(",true"))
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_json_export_round_trips() {
        let config = SweepConfig::default();
        let outcome = optimize(&config).unwrap();

        let mut buffer = Vec::new();
        export_json(
            &outcome.results,
            outcome.best(),
            &config.region,
            &mut buffer,
        )
        .unwrap();

        let document: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(
            document["results"].as_array().unwrap().len(),
            outcome.results.len()
        );
        assert_eq!(
            document["best"]["spreading_factor"],
            serde_json::json!(outcome.best().spreading_factor)
        );
        assert!(document["region"]["charge_uc_max"].is_number());
    }
}
