//! Transform and trajectory logs for offline analysis.
//!
//! Each text file has one line per frame: `<frame> <a> <b> <c>` with a
//! 1-based frame number, readable by gnuplot and similar tools.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use stab_models::{Motion, StabilizationReport, TrajectoryPoint};

use crate::error::MediaResult;

pub const TRANSFORMS_FILE: &str = "prev_to_cur_transformation.txt";
pub const TRAJECTORY_FILE: &str = "trajectory.txt";
pub const SMOOTHED_TRAJECTORY_FILE: &str = "smoothed_trajectory.txt";
pub const CORRECTED_TRANSFORMS_FILE: &str = "new_prev_to_cur_transformation.txt";
pub const REPORT_FILE: &str = "report.json";

fn write_rows<I>(path: &Path, rows: I) -> MediaResult<()>
where
    I: IntoIterator<Item = (f64, f64, f64)>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for (i, (a, b, c)) in rows.into_iter().enumerate() {
        writeln!(out, "{} {} {} {}", i + 1, a, b, c)?;
    }
    out.flush()?;
    Ok(())
}

fn motion_rows(motions: &[Motion]) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
    motions.iter().map(|m| (m.dx, m.dy, m.da))
}

fn point_rows(points: &[TrajectoryPoint]) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
    points.iter().map(|p| (p.x, p.y, p.a))
}

/// Write all logs and the JSON report into `dir`, creating it if needed.
///
/// Returns the paths written, in a stable order.
pub fn write_transform_logs(dir: impl AsRef<Path>, report: &StabilizationReport) -> MediaResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let transforms = dir.join(TRANSFORMS_FILE);
    let trajectory = dir.join(TRAJECTORY_FILE);
    let smoothed = dir.join(SMOOTHED_TRAJECTORY_FILE);
    let corrected = dir.join(CORRECTED_TRANSFORMS_FILE);
    let report_path = dir.join(REPORT_FILE);

    write_rows(&transforms, motion_rows(&report.motions))?;
    write_rows(&trajectory, point_rows(&report.path.trajectory))?;
    write_rows(&smoothed, point_rows(&report.path.smoothed))?;
    write_rows(&corrected, motion_rows(&report.path.warps))?;

    let file = BufWriter::new(File::create(&report_path)?);
    serde_json::to_writer_pretty(file, report)?;

    info!(dir = %dir.display(), frames = report.motions.len(), "Wrote transform logs");

    Ok(vec![transforms, trajectory, smoothed, corrected, report_path])
}
