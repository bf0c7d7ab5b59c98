//! Sweep scenarios against real directory trees.
//!
//! Access times are set explicitly; the sweep itself must not disturb them
//! before an entry is classified.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use bazel_sweep::policy::{ActiveReferenceSet, ProtectionRules, RetentionPolicy};
use bazel_sweep::{CacheSweeper, DeletionSet, FsRemover, SignalState, SweepConfig, SweepError};

const DAY: u64 = 24 * 60 * 60;

fn set_accessed_days_ago(path: &Path, days: u64) {
    let when = SystemTime::now() - Duration::from_secs(days * DAY);
    let file = File::open(path).unwrap();
    file.set_times(FileTimes::new().set_accessed(when)).unwrap();
}

fn write_file(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "content").unwrap();
}

fn policy(root: &Path, days: u32, references: ActiveReferenceSet, rules: ProtectionRules) -> RetentionPolicy {
    RetentionPolicy::new(root, RetentionPolicy::days(days), references, rules)
}

fn sorted(set: &DeletionSet) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = set.iter().map(Path::to_path_buf).collect();
    paths.sort();
    paths
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_stale_file_is_selected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let foo = root.join("foo");
    write_file(&foo);
    set_accessed_days_ago(&foo, 40);

    let policy = policy(root, 30, ActiveReferenceSet::empty(), ProtectionRules::none());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert_eq!(report.deletion_set.into_vec(), vec![foo]);
}

#[test]
fn test_recent_file_is_kept() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let foo = root.join("foo");
    write_file(&foo);
    set_accessed_days_ago(&foo, 10);

    let policy = policy(root, 30, ActiveReferenceSet::empty(), ProtectionRules::none());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert!(report.deletion_set.is_empty());
    assert_eq!(report.stats.recent, 1);
}

#[test]
fn test_referenced_external_repo_is_pruned() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let external = root.join("external");
    let bar = external.join("bar");
    let baz = external.join("baz");
    write_file(&bar.join("BUILD.bazel"));
    write_file(&bar.join("src").join("lib.cc"));
    write_file(&baz.join("BUILD.bazel"));
    write_file(&external.join("@bar.marker"));
    write_file(&external.join("@baz.marker"));

    for path in [
        bar.join("BUILD.bazel"),
        bar.join("src").join("lib.cc"),
        bar.join("src"),
        baz.join("BUILD.bazel"),
        external.join("@bar.marker"),
        external.join("@baz.marker"),
        bar.clone(),
        baz.clone(),
        external.clone(),
    ] {
        set_accessed_days_ago(&path, 400);
    }

    let references = ActiveReferenceSet::from_targets(["bar"]);
    let policy = policy(root, 30, references, ProtectionRules::default());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert_eq!(
        sorted(&report.deletion_set),
        vec![external.join("@baz.marker"), baz.clone()]
    );
    assert!(!report.deletion_set.iter().any(|p| p.starts_with(&bar)));
    assert_eq!(report.stats.pruned, 1);
    // root, external, bar, baz, two markers; nothing below bar or baz
    assert_eq!(report.stats.visited, 6);
}

#[test]
fn test_install_base_contents_are_kept() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let install = root.join("install");
    let x = install.join("x");
    write_file(&x);
    set_accessed_days_ago(&x, 400);
    set_accessed_days_ago(&install, 400);

    let policy = policy(root, 30, ActiveReferenceSet::empty(), ProtectionRules::default());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert!(report.deletion_set.is_empty());
    assert_eq!(report.stats.protected, 2);
}

#[test]
fn test_lock_file_is_kept() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let lock = root.join("cache").join("lock");
    write_file(&lock);
    set_accessed_days_ago(&lock, 400);

    let policy = policy(root, 30, ActiveReferenceSet::empty(), ProtectionRules::default());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert!(!report.deletion_set.contains(&lock));
    assert!(report.deletion_set.is_empty());
}

#[test]
fn test_root_lock_file_kept_by_basename_alone() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let lock = root.join("lock");
    let other = root.join("server.log");
    write_file(&lock);
    write_file(&other);
    set_accessed_days_ago(&lock, 400);
    set_accessed_days_ago(&other, 400);

    let rules = ProtectionRules {
        files: ["lock".to_string()].into_iter().collect(),
        ..ProtectionRules::none()
    };
    let policy = policy(root, 30, ActiveReferenceSet::empty(), rules);
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert_eq!(report.deletion_set.into_vec(), vec![other]);
    assert_eq!(report.stats.protected, 1);
}

#[test]
fn test_stale_directory_selected_without_descending() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let old = root.join("cache").join("repos").join("old");
    write_file(&old.join("a"));
    write_file(&old.join("nested").join("b"));
    set_accessed_days_ago(&old.join("a"), 400);
    set_accessed_days_ago(&old.join("nested").join("b"), 400);
    set_accessed_days_ago(&old.join("nested"), 400);
    set_accessed_days_ago(&old, 400);

    let policy = policy(root, 30, ActiveReferenceSet::empty(), ProtectionRules::default());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert_eq!(report.deletion_set.into_vec(), vec![old]);
    // root, cache, repos, old
    assert_eq!(report.stats.visited, 4);
}

#[test]
fn test_files_only_rules_keep_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let dir = root.join("old");
    let file = dir.join("blob");
    write_file(&file);
    set_accessed_days_ago(&file, 400);
    set_accessed_days_ago(&dir, 400);

    let policy = policy(root, 30, ActiveReferenceSet::empty(), ProtectionRules::files_only());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert_eq!(report.stats.retained_dirs, 1);
    assert_eq!(report.deletion_set.into_vec(), vec![file]);
}

#[test]
fn test_root_is_never_selected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("cache-root");
    fs::create_dir(&root).unwrap();
    set_accessed_days_ago(&root, 4000);

    let policy = policy(&root, 0, ActiveReferenceSet::empty(), ProtectionRules::none());
    let report = CacheSweeper::new(&policy).sweep().unwrap();

    assert!(!report.deletion_set.contains(&root));
}

// =============================================================================
// Full runs
// =============================================================================

#[test]
fn test_run_removes_and_second_run_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let stale = root.join("cache").join("stale.bin");
    let fresh = root.join("cache").join("fresh.bin");
    write_file(&stale);
    write_file(&fresh);
    set_accessed_days_ago(&stale, 90);

    let config = SweepConfig::new(root, 30);
    let summary = bazel_sweep::run(&config, &FsRemover, &SignalState::new()).unwrap();

    assert_eq!(summary.removed, 1);
    assert!(!stale.exists());
    assert!(fresh.exists());

    let policy = config.to_policy(ActiveReferenceSet::empty(), SystemTime::now());
    let report = CacheSweeper::new(&policy).sweep().unwrap();
    assert!(report.deletion_set.is_empty());
}

#[test]
fn test_run_with_reference_list() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("bazel");
    let list = temp_dir.path().join("targets.txt");
    let external = root.join("cache").join("external");
    let keep = external.join("rules_go");
    let drop = external.join("rules_old");
    write_file(&keep.join("WORKSPACE"));
    write_file(&drop.join("WORKSPACE"));
    fs::write(&list, "rules_go\n").unwrap();
    set_accessed_days_ago(&keep.join("WORKSPACE"), 200);
    set_accessed_days_ago(&drop.join("WORKSPACE"), 200);
    set_accessed_days_ago(&keep, 200);
    set_accessed_days_ago(&drop, 200);

    let config = SweepConfig::new(&root, 30).with_reference_list(&list);
    let summary = bazel_sweep::run(&config, &FsRemover, &SignalState::new()).unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.stats.pruned, 1);
    assert!(keep.join("WORKSPACE").exists());
    assert!(!drop.exists());
}

#[test]
fn test_unreadable_reference_list_deletes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("bazel");
    let stale = root.join("cache").join("stale.bin");
    write_file(&stale);
    set_accessed_days_ago(&stale, 90);

    let config = SweepConfig::new(&root, 30).with_reference_list(temp_dir.path().join("missing.txt"));
    let result = bazel_sweep::run(&config, &FsRemover, &SignalState::new());

    assert!(matches!(result, Err(SweepError::Config(_))));
    assert!(stale.exists());
}

#[test]
fn test_missing_cache_root_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = SweepConfig::new(temp_dir.path().join("nope"), 30);
    let result = bazel_sweep::run(&config, &FsRemover, &SignalState::new());
    assert!(matches!(result, Err(SweepError::Config(_))));
}

#[test]
fn test_interrupted_run_keeps_remaining_paths() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let stale = root.join("cache").join("stale.bin");
    write_file(&stale);
    set_accessed_days_ago(&stale, 90);

    let signals = SignalState::new();
    signals.handle_signal();
    let config = SweepConfig::new(root, 30);
    let result = bazel_sweep::run(&config, &FsRemover, &signals);

    assert!(matches!(
        result,
        Err(SweepError::Interrupted {
            removed: 0,
            remaining: 1
        })
    ));
    assert!(stale.exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_aborts_walk() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let stale = root.join("cache").join("stale.bin");
    let locked = root.join("cache").join("locked");
    write_file(&stale);
    write_file(&locked.join("inner"));
    set_accessed_days_ago(&stale, 90);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read it anyway; nothing to test then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let config = SweepConfig::new(root, 30);
    let result = bazel_sweep::run(&config, &FsRemover, &SignalState::new());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(SweepError::Walk { path, .. }) => assert_eq!(path, locked),
        other => panic!("expected walk error, got {:?}", other.map(|s| s.removed)),
    }
    assert!(stale.exists());
}
