//! Writer of the `results.dat` table: one header line naming the columns and one row
//! per accepted step with the time and the 13 mass fractions, every field right
//! aligned in 15 characters (`%15s` / `%15.4e`), readable by `numpy.loadtxt`.
use crate::BurningIVP::burn_driver::Trajectory;
use crate::BurningIVP::grid_driver::GridSnapshot;
use crate::NuclearKinetics::isotopes::{Abundances, N_ISO, mass_fractions};
use crate::Utils::task_config::TaskError;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const COLUMN_NAMES: [&str; N_ISO + 1] = [
    "tnow", "he4", "c12", "n13", "c13", "n14", "o15", "n15", "o16", "f17", "o17", "f18", "o18", "h1",
];

const FIELD_WIDTH: usize = 15;

/// `%.4e` of C: mantissa, sign and at least two exponent digits ("1.0000e-08")
pub fn format_sci(value: f64) -> String {
    let s = format!("{:.4e}", value);
    match s.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => format!(
                "{}e{}{:02}",
                mantissa,
                if exp < 0 { '-' } else { '+' },
                exp.abs()
            ),
            Err(_) => s,
        },
        None => s,
    }
}

pub fn header_line() -> String {
    COLUMN_NAMES
        .iter()
        .map(|name| format!("{:>width$}", name, width = FIELD_WIDTH))
        .collect()
}

pub fn row_line(t: f64, y: &Abundances, density: f64) -> String {
    let x = mass_fractions(y, density);
    std::iter::once(t)
        .chain(x.iter().copied())
        .map(|v| format!("{:>width$}", format_sci(v), width = FIELD_WIDTH))
        .collect()
}

pub struct ResultsWriter<W: Write> {
    out: W,
    density: f64,
    rows: usize,
}

impl ResultsWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P, density: f64) -> Result<Self, TaskError> {
        let file = File::create(path.as_ref())?;
        info!("writing results to {}", path.as_ref().display());
        ResultsWriter::new(BufWriter::new(file), density)
    }
}

impl<W: Write> ResultsWriter<W> {
    /// writes the header immediately
    pub fn new(mut out: W, density: f64) -> Result<Self, TaskError> {
        writeln!(out, "{}", header_line())?;
        Ok(Self {
            out,
            density,
            rows: 0,
        })
    }

    pub fn write_row(&mut self, t: f64, y: &Abundances) -> Result<(), TaskError> {
        writeln!(self.out, "{}", row_line(t, y, self.density))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<W, TaskError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// one row per accepted step, the initial state is not written
pub fn write_trajectory<P: AsRef<Path>>(path: P, trajectory: &Trajectory, density: f64) -> Result<usize, TaskError> {
    let mut writer = ResultsWriter::create(path, density)?;
    for point in trajectory.steps.iter() {
        writer.write_row(point.t, &point.abundances)?;
    }
    let rows = writer.rows();
    writer.finish()?;
    Ok(rows)
}

/// `results.dat` -> `results_cell3.dat`
pub fn cell_output_path(base: &Path, cell: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{}_cell{}.{}", stem, cell, ext.to_string_lossy()),
        None => format!("{}_cell{}", stem, cell),
    };
    base.with_file_name(name)
}

/// one file per cell, rows at the time each cell reached in the sweep
pub fn write_grid<P: AsRef<Path>>(
    base: P,
    snapshots: &[GridSnapshot],
    densities: &[f64],
) -> Result<Vec<PathBuf>, TaskError> {
    let mut paths = Vec::with_capacity(densities.len());
    for (cell, density) in densities.iter().enumerate() {
        let path = cell_output_path(base.as_ref(), cell);
        let mut writer = ResultsWriter::create(&path, *density)?;
        for snap in snapshots.iter() {
            writer.write_row(snap.cell_times[cell], &snap.cells[cell])?;
        }
        writer.finish()?;
        paths.push(path);
    }
    Ok(paths)
}
