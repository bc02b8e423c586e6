//! Tests for argument splitting, configuration loading, and command dispatch.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use rstest::{fixture, rstest};
use searchd_harness_config::{Config, FixturePaths};
use tempfile::TempDir;

use crate::cli::HarnessCommand;
use crate::harness::Harness;
use crate::output::HarnessOutput;
use crate::tests::support::{FakeDatabase, FakeSphinx};
use crate::{AppError, CliRunner, ConfigLoader, IoStreams};

/// Records the arguments it was given and returns a fixed configuration.
struct RecordingLoader {
    seen: RefCell<Vec<OsString>>,
    config: Config,
}

impl RecordingLoader {
    fn new(config: Config) -> Self {
        Self {
            seen: RefCell::new(Vec::new()),
            config,
        }
    }
}

impl ConfigLoader for RecordingLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        *self.seen.borrow_mut() = args.to_vec();
        Ok(self.config.clone())
    }
}

struct FailingLoader;

impl ConfigLoader for FailingLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        let args = os_args(&["searchd-harness", "--startup-timeout-ms", "soon"]);
        Config::load_from_iter(args).map_err(AppError::LoadConfiguration)
    }
}

fn os_args(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn dispatches_command_with_leading_config_flags() {
    let loader = RecordingLoader::new(Config::default());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut io = IoStreams::new(&mut stdout, &mut stderr);
    let mut handled = Vec::new();

    let exit = CliRunner::new(&mut io, &loader).run_with_handler(
        os_args(&["searchd-harness", "--database", "fixtures", "start"]),
        |command, _config, output| {
            handled.push(command);
            output.stdout_line(format_args!("handled"))?;
            Ok(ExitCode::SUCCESS)
        },
    );

    assert_eq!(exit, ExitCode::SUCCESS);
    assert_eq!(handled, vec![HarnessCommand::Start]);
    assert_eq!(
        *loader.seen.borrow(),
        os_args(&["searchd-harness", "--database", "fixtures"])
    );
    assert_eq!(text(&stdout), "handled\n");
}

#[test]
fn unknown_command_is_a_usage_error() {
    let loader = RecordingLoader::new(Config::default());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut io = IoStreams::new(&mut stdout, &mut stderr);

    let exit = CliRunner::new(&mut io, &loader).run_with_handler(
        os_args(&["searchd-harness", "reindex"]),
        |_, _, _| panic!("handler must not run"),
    );

    assert_eq!(exit, ExitCode::FAILURE);
    assert!(text(&stderr).contains("reindex"));
}

#[test]
fn help_is_printed_to_stdout() {
    let loader = RecordingLoader::new(Config::default());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut io = IoStreams::new(&mut stdout, &mut stderr);

    let exit = CliRunner::new(&mut io, &loader).run_with_handler(
        os_args(&["searchd-harness", "--help"]),
        |_, _, _| panic!("handler must not run"),
    );

    assert_eq!(exit, ExitCode::SUCCESS);
    assert!(text(&stdout).contains("prepare"));
    assert!(stderr.is_empty());
}

#[test]
fn configuration_failure_is_reported() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut io = IoStreams::new(&mut stdout, &mut stderr);

    let exit = CliRunner::new(&mut io, &FailingLoader).run_with_handler(
        os_args(&["searchd-harness", "status"]),
        |_, _, _| panic!("handler must not run"),
    );

    assert_eq!(exit, ExitCode::FAILURE);
    assert!(text(&stderr).starts_with("failed to load configuration"));
}

struct HarnessTree {
    _dir: TempDir,
    config: Config,
    paths: FixturePaths,
    database: FakeDatabase,
    sphinx: FakeSphinx,
}

impl HarnessTree {
    fn harness(&self) -> Harness<&FakeDatabase, &FakeSphinx, &FakeSphinx> {
        Harness::new(self.config.clone(), &self.database, &self.sphinx, &self.sphinx)
    }

    fn run(&self, command: HarnessCommand) -> (Result<ExitCode, AppError>, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = {
            let mut output = HarnessOutput::new(&mut stdout, &mut stderr);
            self.harness().handle(command, &mut output)
        };
        (result, text(&stdout), text(&stderr))
    }
}

#[fixture]
fn tree() -> HarnessTree {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary path is not UTF-8: {}", path.display()));
    let config = Config {
        fixtures_dir: root,
        sphinx_version: Some(String::from("2.2.11")),
        startup_timeout_ms: 0,
        ..Config::default()
    };
    let paths = config.fixture_paths();
    fs::create_dir_all(paths.sql_dir()).expect("create sql dir");
    fs::create_dir_all(paths.sphinx_dir()).expect("create sphinx dir");
    fs::write(paths.schema_path(), "CREATE TABLE people (id INT);\n").expect("write schema");
    fs::write(paths.people_data_path(), "'f','Ada'\n'm','Alan'\n").expect("write data");
    fs::write(
        paths.template_path(),
        "sql_db = {{database}}\npid_file = {{fixtures_path}}/sphinx/searchd.pid\n",
    )
    .expect("write template");
    HarnessTree {
        _dir: dir,
        config,
        paths,
        database: FakeDatabase::default(),
        sphinx: FakeSphinx::default(),
    }
}

#[rstest]
fn prepare_runs_every_step_in_order(tree: HarnessTree) {
    let (result, stdout, stderr) = tree.run(HarnessCommand::Prepare);

    assert_eq!(result.expect("prepare"), ExitCode::SUCCESS);
    assert!(stderr.is_empty());
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            "created database riddle",
            "executed 1 schema statements",
            "loaded 2 rows into people",
            format!("wrote {}", tree.paths.config_path()).as_str(),
            "indexes built",
            "searchd started (pid 4100)",
        ]
    );
    assert!(tree.paths.config_path().exists());
}

#[rstest]
fn teardown_of_a_stopped_daemon_reports_it(tree: HarnessTree) {
    let (result, stdout, _) = tree.run(HarnessCommand::Stop);

    assert_eq!(result.expect("stop"), ExitCode::SUCCESS);
    assert_eq!(stdout, "searchd is not running\n");
    assert!(tree.sphinx.invocations().is_empty());
}

#[rstest]
fn stop_uses_the_configured_version(tree: HarnessTree) {
    tree.sphinx.run_daemon_as(31);

    let (result, stdout, _) = tree.run(HarnessCommand::Stop);

    assert_eq!(result.expect("stop"), ExitCode::SUCCESS);
    assert_eq!(stdout, "searchd (pid 31) stopped with --stopwait\n");
    assert!(tree.sphinx.invocations_of("searchd").iter().all(|call| !call.has_arg("--help")));
}

#[rstest]
fn failed_readiness_is_printed_but_not_fatal(tree: HarnessTree) {
    tree.sphinx.fail_to_write_pid();

    let (result, stdout, stderr) = tree.run(HarnessCommand::Start);

    assert_eq!(result.expect("start"), ExitCode::SUCCESS);
    assert!(stdout.is_empty());
    assert_eq!(
        stderr,
        format!("Failed to start searchd daemon. Check {}.\n", tree.paths.log_path())
    );
}

#[rstest]
fn status_reports_the_live_pid(tree: HarnessTree) {
    tree.sphinx.run_daemon_as(77);
    let (_, running, _) = tree.run(HarnessCommand::Status);
    tree.sphinx.leave_stale_pid(77);
    let (_, stale, _) = tree.run(HarnessCommand::Status);

    assert_eq!(running, "searchd running (pid 77)\n");
    assert_eq!(stale, "searchd not running\n");
}

#[rstest]
fn invalid_configured_version_is_rejected(mut tree: HarnessTree) {
    tree.config.sphinx_version = Some(String::from("two"));

    let (result, _, _) = tree.run(HarnessCommand::Index);

    assert!(matches!(result, Err(AppError::Version(_))));
}

#[rstest]
fn setup_failure_is_propagated(tree: HarnessTree) {
    tree.database.reject_connections();

    let (result, stdout, _) = tree.run(HarnessCommand::Prepare);

    assert!(matches!(result, Err(AppError::Setup(_))));
    assert!(stdout.is_empty());
    assert!(tree.sphinx.invocations().is_empty(), "later steps must not run");
}
