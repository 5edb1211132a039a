//! Test helpers for running CLI invocations against a scratch workspace.

use super::*;
use tempfile::TempDir;

/// Temporary database and documents directory for one test.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

/// Result and captured stdout of one invocation.
#[derive(Debug)]
pub(super) struct Invocation {
    pub(super) result: Result<(), CliError>,
    pub(super) output: String,
}

impl Invocation {
    pub(super) fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }

    pub(super) fn expect_success(&self) -> &str {
        if let Err(err) = &self.result {
            panic!("expected success, found {err:?}");
        }
        &self.output
    }
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("data/mapnotes.db")
    }

    pub(super) fn documents(&self) -> Utf8PathBuf {
        self.root.join("documents")
    }

    pub(super) fn document(&self, name: &str) -> Utf8PathBuf {
        self.documents().join(name)
    }

    pub(super) fn read_document(&self, name: &str) -> String {
        std::fs::read_to_string(self.document(name)).expect("read exported document")
    }

    /// Run `mapnotes <args>` with this workspace's storage flags.
    pub(super) fn invoke(&self, args: &[&str]) -> Invocation {
        let mut invocation = vec![
            "mapnotes".to_owned(),
            format!("--{ARG_DATABASE}"),
            self.database().into_string(),
            format!("--{ARG_DOCUMENTS_DIR}"),
            self.documents().into_string(),
        ];
        invocation.extend(args.iter().map(|arg| (*arg).to_owned()));
        let mut output = Vec::new();
        let result = Cli::try_parse_from(invocation)
            .map_err(CliError::ArgumentParsing)
            .and_then(|cli| run_with(cli, &mut output));
        Invocation {
            result,
            output: String::from_utf8(output).expect("utf-8 output"),
        }
    }
}
