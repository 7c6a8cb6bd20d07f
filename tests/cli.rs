#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_cmd::Command;
    use tempfile::tempdir;

    fn herd_immunity() -> Command {
        Command::cargo_bin("herd_immunity").unwrap()
    }

    fn stdout_of(command: &mut Command) -> String {
        let output = command.output().unwrap();
        assert!(output.status.success(), "{output:?}");
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn fully_vaccinated_population_ends_after_one_turn() {
        herd_immunity()
            .args(["10", "1.0", "Measles", "0.5", "1.0"])
            .assert()
            .success()
            .stdout("The simulation has ended after 1 turns.\n");
    }

    #[test]
    fn single_person_ends_after_one_turn() {
        herd_immunity()
            .args(["1", "0.0", "Measles", "0.5", "1.0", "1"])
            .assert()
            .success()
            .stdout("The simulation has ended after 1 turns.\n");
    }

    #[test]
    fn no_infected_ends_immediately() {
        herd_immunity()
            .args(["100", "0.5", "Measles", "0.5", "0.5", "0"])
            .assert()
            .success()
            .stdout("The simulation has ended after 0 turns.\n");
    }

    #[test]
    fn runs_are_reproducible() {
        let args = ["2000", "0.6", "Flu", "0.05", "0.02", "10", "--random-seed", "123"];
        let first = stdout_of(herd_immunity().args(args));
        let second = stdout_of(herd_immunity().args(args));
        assert_eq!(first, second);
        assert!(first.starts_with("The simulation has ended after "));
    }

    #[test]
    fn config_file_supplies_parameters() {
        let config = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/parameters.json");
        let output = herd_immunity().arg("--config").arg(&config).output().unwrap();
        assert!(output.status.success(), "{output:?}");
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Loading parameters from"));
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.starts_with("The simulation has ended after "));
        assert_eq!(stdout.lines().count(), 1);
    }

    #[test]
    fn max_steps_limits_the_run() {
        herd_immunity()
            .args(["1000", "0.0", "Cold", "0.0", "0.5", "1", "--max-steps", "3"])
            .assert()
            .success()
            .stdout("The simulation has ended after 3 turns.\n");
    }

    #[test]
    fn output_dir_receives_reports() {
        let temp_dir = tempdir().unwrap();
        herd_immunity()
            .args(["100", "0.5", "Flu", "0.1", "0.05", "2", "--output-dir"])
            .arg(temp_dir.path())
            .assert()
            .success();
        for suffix in ["interactions", "survival", "time_steps"] {
            let path = temp_dir
                .path()
                .join(format!("Flu_simulation_pop_100_vp_0.5_infected_2_{suffix}.csv"));
            assert!(path.exists(), "missing {}", path.display());
        }
    }

    #[test]
    fn too_many_initial_infected_fails() {
        let output = herd_immunity()
            .args(["5", "0.5", "Flu", "0.1", "0.05", "6"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("initial_infected (6) exceeds population_size (5)"));
    }

    #[test]
    fn virus_name_cannot_leave_output_dir() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("out");
        let output = herd_immunity()
            .args(["10", "0.5", "../escaped", "0.5", "0.5", "--output-dir"])
            .arg(&output_dir)
            .output()
            .unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("path separators"), "{stderr}");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn out_of_range_probability_fails() {
        herd_immunity()
            .args(["5", "1.5", "Flu", "0.1", "0.05"])
            .assert()
            .failure();
    }

    #[test]
    fn non_numeric_population_fails() {
        herd_immunity()
            .args(["many", "0.5", "Flu", "0.1", "0.05"])
            .assert()
            .failure();
    }

    #[test]
    fn log_level_writes_to_stderr() {
        let output = herd_immunity()
            .args(["10", "1.0", "Measles", "0.5", "1.0", "--log-level", "info"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("herd_immunity::observer - step 0 ended"));
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert_eq!(stdout, "The simulation has ended after 1 turns.\n");
    }

    #[test]
    fn module_log_level_keeps_stdout_to_final_line() {
        let output = herd_immunity()
            .args(["10", "1.0", "Measles", "0.5", "1.0"])
            .args(["--log-level", "herd_immunity::simulation=debug"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Logging enabled for herd_immunity::simulation at level DEBUG"));
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert_eq!(stdout, "The simulation has ended after 1 turns.\n");
    }
}
