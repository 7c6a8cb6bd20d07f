use std::any::TypeId;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::{error, trace};
use serde::Serialize;

use crate::error::HerdError;
use crate::observer::{SimulationObserver, StepSummary};
use crate::parameters::Parameters;
use crate::person::{Person, PersonId};
use crate::simulation::InteractionOutcome;

/// A row type that can be written to a report.
pub trait Report: Serialize + 'static {}

/// Use this macro to mark a `Serialize` struct as a report row type
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {}
    };
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful. Called by `add_report`
fn generate_validate_filepath(path: &Path) -> Result<File, HerdError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(HerdError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Holds one CSV writer per report row type.
#[derive(Default)]
pub struct ReportWriter {
    file_writers: HashMap<TypeId, Writer<File>>,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the CSV file for rows of type `T` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a `.csv` path or the file cannot be created.
    pub fn add_report<T: Report>(&mut self, path: &Path) -> Result<(), HerdError> {
        let file = generate_validate_filepath(path)?;
        trace!("adding report {}", path.display());
        self.file_writers
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(())
    }

    /// Writes `report` as a new row of its report file.
    ///
    /// # Errors
    ///
    /// Returns an error if no report was added for `T` or the row cannot be written.
    pub fn send_report<T: Report>(&mut self, report: &T) -> Result<(), HerdError> {
        let writer = self
            .file_writers
            .get_mut(&TypeId::of::<T>())
            .ok_or_else(|| HerdError::ReportError("No writer found for the report type".into()))?;
        writer.serialize(report)?;
        Ok(())
    }

    /// Flushes every report file.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    pub fn flush(&mut self) -> Result<(), HerdError> {
        for writer in self.file_writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct InteractionReportItem {
    person_id: PersonId,
    random_person_id: PersonId,
    did_infect: bool,
    random_person_vaccinated: bool,
    random_person_sick: bool,
}

define_report!(InteractionReportItem);

#[derive(Serialize)]
struct SurvivalReportItem {
    person_id: PersonId,
    died: bool,
}

define_report!(SurvivalReportItem);

define_report!(StepSummary);

/// Writes contacts, survival outcomes and step summaries of a run to three CSV files in one
/// directory. The files share the prefix from [`Parameters::file_prefix`].
///
/// Reports never interrupt a run: a failed write is logged and the run carries on.
pub struct ReportObserver {
    reports: ReportWriter,
    write_interactions: bool,
}

impl ReportObserver {
    /// Creates `<prefix>_interactions.csv`, `<prefix>_survival.csv` and
    /// `<prefix>_time_steps.csv` in `directory`.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidParameter` if the parameters fail validation, which keeps
    /// the file names inside `directory`, or an error if a report file cannot be created.
    pub fn new(directory: &Path, parameters: &Parameters) -> Result<Self, HerdError> {
        parameters.validate()?;
        let prefix = parameters.file_prefix();
        let path = |suffix: &str| -> PathBuf { directory.join(format!("{prefix}_{suffix}.csv")) };

        let mut reports = ReportWriter::new();
        reports.add_report::<InteractionReportItem>(&path("interactions"))?;
        reports.add_report::<SurvivalReportItem>(&path("survival"))?;
        reports.add_report::<StepSummary>(&path("time_steps"))?;
        Ok(ReportObserver {
            reports,
            write_interactions: true,
        })
    }

    /// Skips the per-contact report, which has a hundred rows per infected person per step.
    #[must_use]
    pub fn without_interactions(mut self) -> Self {
        self.write_interactions = false;
        self
    }

    fn send<T: Report>(&mut self, report: &T) {
        if let Err(e) = self.reports.send_report(report) {
            error!("failed to write report row: {e}");
        }
    }
}

impl SimulationObserver for ReportObserver {
    fn on_interaction(
        &mut self,
        person: &Person,
        random_person: &Person,
        outcome: InteractionOutcome,
    ) {
        if !self.write_interactions {
            return;
        }
        self.send(&InteractionReportItem {
            person_id: person.id(),
            random_person_id: random_person.id(),
            did_infect: outcome.did_infect(),
            random_person_vaccinated: outcome == InteractionOutcome::Vaccinated,
            random_person_sick: outcome == InteractionOutcome::AlreadyInfected,
        });
    }

    fn on_survival(&mut self, person: &Person, died: bool) {
        self.send(&SurvivalReportItem {
            person_id: person.id(),
            died,
        });
    }

    fn on_time_step(&mut self, summary: &StepSummary) {
        self.send(summary);
    }

    fn on_finish(&mut self, _steps: usize) {
        if let Err(e) = self.reports.flush() {
            error!("failed to flush reports: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRng;
    use crate::simulation::Simulation;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize)]
    struct SampleReport {
        id: u32,
        value: String,
    }

    define_report!(SampleReport);

    #[test]
    fn add_and_send_report() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("sample_report.csv");
        let mut reports = ReportWriter::new();
        reports.add_report::<SampleReport>(&file_path).unwrap();
        reports
            .send_report(&SampleReport {
                id: 1,
                value: "Value,1".to_string(),
            })
            .unwrap();
        reports
            .send_report(&SampleReport {
                id: 2,
                value: "Value\n2".to_string(),
            })
            .unwrap();
        reports.flush().unwrap();

        let mut reader = csv::Reader::from_path(file_path).unwrap();
        let records: Vec<SampleReport> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].value, "Value,1");
        assert_eq!(records[1].value, "Value\n2");
    }

    #[test]
    fn directory_creation_writing_works() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test-temp").join("sample_report.csv");
        let mut reports = ReportWriter::new();
        reports.add_report::<SampleReport>(&file_path).unwrap();
        assert!(file_path.exists(), "CSV file should exist");
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let result = generate_validate_filepath(&temp_dir.path().join("sample_report.tsv"));
        match result {
            Err(HerdError::ReportError(message)) => {
                assert_eq!(message, "Report output files must be CSVs at this time");
            }
            _ => panic!("Other file types beyond CSV are not allowed"),
        }
    }

    #[test]
    fn send_report_without_adding_report() {
        let mut reports = ReportWriter::new();
        let result = reports.send_report(&SampleReport {
            id: 1,
            value: "Test Value".to_string(),
        });
        assert!(matches!(result, Err(HerdError::ReportError(_))));
    }

    #[test]
    fn report_observer_writes_all_reports() {
        let temp_dir = tempdir().unwrap();
        let parameters = Parameters::new(200, 0.5, "Flu", 0.2, 0.1, 2);
        let mut simulation =
            Simulation::new(parameters.clone(), SeededRng::seed_from_u64(42)).unwrap();
        simulation.add_observer(Box::new(
            ReportObserver::new(temp_dir.path(), &parameters).unwrap(),
        ));
        let steps = simulation.run();

        let prefix = temp_dir.path().join("Flu_simulation_pop_200_vp_0.5_infected_2");
        let rows = |suffix: &str| {
            let path = format!("{}_{suffix}.csv", prefix.display());
            csv::Reader::from_path(path).unwrap().records().count()
        };
        assert_eq!(rows("time_steps"), steps);
        assert_eq!(rows("survival"), simulation.total_infected());
        assert_eq!(rows("interactions") % 100, 0);
        assert!(rows("interactions") >= 200);
    }

    #[test]
    fn report_observer_can_skip_interactions() {
        let temp_dir = tempdir().unwrap();
        let parameters = Parameters::new(10, 0.0, "Flu", 1.0, 0.0, 1);
        let mut simulation =
            Simulation::new(parameters.clone(), SeededRng::seed_from_u64(1)).unwrap();
        simulation.add_observer(Box::new(
            ReportObserver::new(temp_dir.path(), &parameters)
                .unwrap()
                .without_interactions(),
        ));
        assert_eq!(simulation.run(), 1);

        let path = temp_dir
            .path()
            .join("Flu_simulation_pop_10_vp_0.0_infected_1_interactions.csv");
        assert_eq!(csv::Reader::from_path(path).unwrap().records().count(), 0);
    }

    #[test]
    fn report_observer_stays_inside_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("out");
        let parameters = Parameters::new(10, 0.5, "../escaped", 0.5, 0.5, 1);

        let result = ReportObserver::new(&output_dir, &parameters);
        assert!(matches!(result, Err(HerdError::InvalidParameter(_))));
        let written: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert!(written.is_empty(), "unexpected files {written:?}");
    }
}
