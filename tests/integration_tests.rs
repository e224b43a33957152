use extsort::categorizer::{ApplyFailure, Categorizer, OutcomeStatus, UnmappedPolicy};
use extsort::cli::{RunOptions, SortCommand, run_with_options};
use extsort::config::Config;
use extsort::mapping::ExtensionMapping;
/// Integration tests for extsort
///
/// These tests exercise complete preview and apply runs against real
/// temporary directories.
///
/// Test categories:
/// 1. Preview grouping
/// 2. Apply and re-preview
/// 3. Partial failures
/// 4. CLI runs with configuration
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers to build and inspect its contents.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn create_text_file(&self, name: &str, content: &str) {
        let mut file = File::create(self.path().join(name)).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file content");
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_text_file(name, name);
        }
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Names of regular files at the top level, sorted.
    fn top_level_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// All files below the fixture, relative to it, sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    Self::walk_dir(root, &path, files);
                } else if let Ok(rel) = path.strip_prefix(root) {
                    files.push(rel.to_path_buf());
                }
            }
        }
    }
}

fn images_and_documents() -> ExtensionMapping {
    ExtensionMapping::from_pairs([("jpg", "Images"), ("pdf", "Documents")])
        .expect("valid mapping")
}

fn options(mapping: ExtensionMapping) -> RunOptions {
    RunOptions {
        mapping,
        policy: UnmappedPolicy::Unsorted,
        unsorted_label: "Unsorted".to_string(),
        json: true,
    }
}

// ============================================================================
// Test Suite 1: Preview
// ============================================================================

#[test]
fn test_preview_example_directory() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.JPG", "c.pdf", "d.txt"]);

    let grouping = Categorizer::new(images_and_documents())
        .preview(fixture.path())
        .expect("preview failed");

    let labels: Vec<&str> = grouping.groups().iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["Images", "Documents", "Unsorted"]);
    assert_eq!(
        grouping.get("Images").unwrap(),
        &["a.jpg".to_string(), "b.JPG".to_string()]
    );
    assert_eq!(grouping.get("Documents").unwrap(), &["c.pdf".to_string()]);
    assert_eq!(grouping.get("Unsorted").unwrap(), &["d.txt".to_string()]);
}

#[test]
fn test_preview_lists_every_file_exactly_once() {
    let fixture = TestFixture::new();
    fixture.create_files(&["x.jpg", "y.png", "README", ".hidden", "notes.TXT", "scan.PDF"]);
    fixture.create_subdir("Images");
    fixture.create_subdir("nested.pdf");

    let grouping = Categorizer::new(images_and_documents())
        .preview(fixture.path())
        .expect("preview failed");

    let mut listed: Vec<String> = grouping
        .groups()
        .iter()
        .flat_map(|g| g.files.iter().cloned())
        .collect();
    listed.sort();

    assert_eq!(listed, fixture.top_level_files());
    assert!(!listed.contains(&"nested.pdf".to_string()));
}

#[test]
fn test_preview_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.pdf", "c.zip"]);
    let categorizer = Categorizer::new(images_and_documents());

    let first = categorizer.preview(fixture.path()).expect("preview failed");
    let second = categorizer.preview(fixture.path()).expect("preview failed");

    assert_eq!(first, second);
    assert_eq!(fixture.top_level_files().len(), 3);
}

#[test]
fn test_preview_of_empty_directory() {
    let fixture = TestFixture::new();
    let grouping = Categorizer::new(images_and_documents())
        .preview(fixture.path())
        .expect("preview failed");
    assert!(grouping.is_empty());
}

// ============================================================================
// Test Suite 2: Apply
// ============================================================================

#[test]
fn test_apply_then_preview_shows_files_moved() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.JPG", "c.pdf", "d.txt"]);
    let categorizer = Categorizer::new(images_and_documents());

    let report = categorizer.apply(fixture.path()).expect("apply failed");
    assert!(report.is_complete_success());
    assert_eq!(report.moved_count(), 3);

    let after = categorizer.preview(fixture.path()).expect("preview failed");
    assert!(after.get("Images").is_none());
    assert!(after.get("Documents").is_none());
    assert_eq!(after.get("Unsorted").unwrap(), &["d.txt".to_string()]);

    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            PathBuf::from("Documents/c.pdf"),
            PathBuf::from("Images/a.jpg"),
            PathBuf::from("Images/b.JPG"),
            PathBuf::from("d.txt"),
        ]
    );
}

#[test]
fn test_apply_preserves_content_and_name_case() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Holiday.JPG", "pixels");

    Categorizer::new(images_and_documents())
        .apply(fixture.path())
        .expect("apply failed");

    let moved = fs::read_to_string(fixture.path().join("Images").join("Holiday.JPG"))
        .expect("moved file readable");
    assert_eq!(moved, "pixels");
}

#[test]
fn test_apply_twice_is_a_no_op_the_second_time() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "c.pdf"]);
    let categorizer = Categorizer::new(images_and_documents()).with_policy(UnmappedPolicy::Leave);

    categorizer.apply(fixture.path()).expect("apply failed");
    let second = categorizer.apply(fixture.path()).expect("apply failed");

    assert!(second.outcomes.is_empty());
    fixture.assert_file_exists("Images/a.jpg");
}

#[test]
fn test_apply_extensionless_rule() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Makefile", "LICENSE", "main.c"]);
    let mapping = ExtensionMapping::from_pairs([("", "NoExtension")]).unwrap();

    let report = Categorizer::new(mapping)
        .with_policy(UnmappedPolicy::Leave)
        .apply(fixture.path())
        .expect("apply failed");

    assert_eq!(report.moved_count(), 2);
    fixture.assert_file_exists("NoExtension/Makefile");
    fixture.assert_file_exists("NoExtension/LICENSE");
    fixture.assert_file_exists("main.c");
}

#[test]
fn test_apply_empty_mapping_reports_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "d.txt"]);

    let report = Categorizer::new(ExtensionMapping::new())
        .apply(fixture.path())
        .expect("apply failed");

    assert!(report.outcomes.is_empty());
    assert_eq!(fixture.top_level_files(), vec!["a.jpg", "d.txt"]);
}

// ============================================================================
// Test Suite 3: Partial failures
// ============================================================================

#[test]
fn test_blocked_folder_fails_only_its_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.JPG", "c.pdf"]);
    fixture.create_text_file("Images", "not a folder");

    let report = Categorizer::new(images_and_documents())
        .apply(fixture.path())
        .expect("apply failed");

    for name in ["a.jpg", "b.JPG"] {
        match &report.outcome_for(name).unwrap().status {
            OutcomeStatus::Failed(ApplyFailure::TargetCreationFailed { folder, .. }) => {
                assert_eq!(folder, "Images")
            }
            other => panic!("{} should have failed, got {:?}", name, other),
        }
        fixture.assert_file_exists(name);
    }
    fixture.assert_file_exists("Documents/c.pdf");
    fixture.assert_file_not_exists("c.pdf");
    assert_eq!(report.failure_count(), 2);
}

#[test]
fn test_collision_does_not_stop_other_moves() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.jpg"]);
    fixture.create_subdir("Images");
    fixture.create_text_file("Images/a.jpg", "already here");

    let report = Categorizer::new(images_and_documents())
        .apply(fixture.path())
        .expect("apply failed");

    assert!(report.outcome_for("a.jpg").unwrap().is_failure());
    assert!(matches!(
        report.outcome_for("b.jpg").unwrap().status,
        OutcomeStatus::Moved { .. }
    ));
    fixture.assert_file_exists("a.jpg");
    fixture.assert_file_exists("Images/b.jpg");
    let kept = fs::read_to_string(fixture.path().join("Images/a.jpg")).unwrap();
    assert_eq!(kept, "already here");
}

#[test]
fn test_missing_directory_fails_before_any_change() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("gone");

    let categorizer = Categorizer::new(images_and_documents());
    assert!(categorizer.preview(&missing).is_err());
    assert!(categorizer.apply(&missing).is_err());
    fixture.assert_file_not_exists("gone");
}

// ============================================================================
// Test Suite 4: CLI runs
// ============================================================================

#[test]
fn test_cli_preview_leaves_directory_untouched() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "c.pdf"]);

    let all_ok = run_with_options(
        SortCommand::Preview,
        fixture.path(),
        &options(images_and_documents()),
    )
    .expect("preview run failed");

    assert!(all_ok);
    assert_eq!(fixture.top_level_files(), vec!["a.jpg", "c.pdf"]);
}

#[test]
fn test_cli_apply_moves_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "c.pdf", "d.txt"]);

    let all_ok = run_with_options(
        SortCommand::Apply,
        fixture.path(),
        &options(images_and_documents()),
    )
    .expect("apply run failed");

    assert!(all_ok);
    fixture.assert_dir_exists("Images");
    fixture.assert_dir_exists("Documents");
    fixture.assert_file_exists("d.txt");
    fixture.assert_file_not_exists("Unsorted");
}

#[test]
fn test_cli_apply_reports_partial_failure() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "c.pdf"]);
    fixture.create_text_file("Images", "blocker");

    let all_ok = run_with_options(
        SortCommand::Apply,
        fixture.path(),
        &options(images_and_documents()),
    )
    .expect("apply run failed");

    assert!(!all_ok);
    fixture.assert_file_exists("Documents/c.pdf");
}

#[test]
fn test_cli_apply_rejects_empty_mapping() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);

    let result = run_with_options(
        SortCommand::Apply,
        fixture.path(),
        &options(ExtensionMapping::new()),
    );

    assert!(result.is_err());
    fixture.assert_file_exists("a.jpg");
}

#[test]
fn test_cli_missing_directory_is_an_error() {
    let fixture = TestFixture::new();
    let result = run_with_options(
        SortCommand::Preview,
        &fixture.path().join("nope"),
        &options(images_and_documents()),
    );
    let message = result.unwrap_err().to_string();
    assert!(message.contains("directory not found"), "{}", message);
}

#[test]
fn test_cli_with_config_file_rules() {
    let fixture = TestFixture::new();
    fixture.create_files(&["song.mp3", "a.jpg"]);
    let config_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = config_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[rules]\nmp3 = \"Music\"\n\n[unmapped]\npolicy = \"leave\"\n",
    )
    .expect("Failed to write config");

    let config = Config::load(Some(&config_path)).expect("config should load");
    let args = extsort::cli::Args {
        directory: fixture.path().to_path_buf(),
        rules: vec!["jpg=Images".parse().unwrap()],
        apply: true,
        policy: None,
        unsorted_label: None,
        json: true,
        config: Some(config_path.clone()),
        log_level: None,
    };

    let all_ok = extsort::run_cli(&args, &config).expect("run failed");

    assert!(all_ok);
    fixture.assert_file_exists("Music/song.mp3");
    fixture.assert_file_exists("Images/a.jpg");
}
