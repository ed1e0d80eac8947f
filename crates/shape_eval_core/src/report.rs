use std::fmt;

use crate::engine::RunReport;

/// `part` as a percentage of `whole`; zero when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(
            f,
            "Analyzed {} feeds with {} trips",
            c.feeds_analyzed, c.trips_analyzed
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{} feeds had shapes ({:.2} %)",
            c.feeds_with_shapes,
            percentage(c.feeds_with_shapes, c.feeds_analyzed)
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{} trips with OK shape ({:.2} %), \
             {} trips with suspicious shapes ({:.2} %), \
             {} trips with degenerated shapes ({:.2} %), \
             {} trips with no shapes ({:.2} %)",
            c.ok,
            percentage(c.ok, c.trips_analyzed),
            c.suspicious,
            percentage(c.suspicious, c.trips_analyzed),
            c.degenerate,
            percentage(c.degenerate, c.trips_analyzed),
            c.no_shape,
            percentage(c.no_shape, c.trips_analyzed),
        )?;

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped {} feeds:", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  {}: {}", failure.path.display(), failure.message)?;
            }
        }
        Ok(())
    }
}
