use std::io::{self, Write};

use core_sim::{AggregateResult, RunResult};

use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};

pub const TRAJECTORY_CSV_HEADER: &str =
    "run,tick,daily_change,base_value,leveraged_value,difference\n";
pub const FINAL_DIFFERENCES_CSV_HEADER: &str = "run,final_difference\n";

/// Writes one row per tick per run.
pub struct TrajectoryCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> TrajectoryCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(TRAJECTORY_CSV_HEADER.as_bytes())
    }

    pub fn append_run(&mut self, run_index: usize, run: &RunResult) -> io::Result<()> {
        for sample in run.samples() {
            writeln!(
                self.writer,
                "{run_index},{},{},{},{},{}",
                sample.tick,
                sample.daily_change,
                sample.base_value,
                sample.leveraged_value,
                sample.difference()
            )?;
        }
        Ok(())
    }

    /// Writes the whole aggregate, flushes, then journals the artifact.
    pub fn write_aggregate_and_log(
        &mut self,
        aggregate: &AggregateResult,
        run_log_writer: &mut dyn RunLogWriter,
    ) -> io::Result<()> {
        self.write_header()?;
        for (run_index, run) in aggregate.runs().iter().enumerate() {
            self.append_run(run_index, run)?;
        }
        self.writer.flush()?;
        run_log_writer.write(RunLogEvent::new(
            aggregate.runs().len() as u64,
            RunLogEventKind::ArtifactWritten,
        ));
        Ok(())
    }
}

pub struct FinalDifferencesCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> FinalDifferencesCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(FINAL_DIFFERENCES_CSV_HEADER.as_bytes())
    }

    pub fn write_all_and_log(
        &mut self,
        final_differences: &[f64],
        run_log_writer: &mut dyn RunLogWriter,
    ) -> io::Result<()> {
        self.write_header()?;
        for (run_index, difference) in final_differences.iter().enumerate() {
            writeln!(self.writer, "{run_index},{difference}")?;
        }
        self.writer.flush()?;
        run_log_writer.write(RunLogEvent::new(
            final_differences.len() as u64,
            RunLogEventKind::ArtifactWritten,
        ));
        Ok(())
    }
}
