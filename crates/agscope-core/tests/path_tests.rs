use agscope_core::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_project_hash_from_root() {
    let root = "/home/user/project";
    let hash = project_hash_from_root(root);

    assert_eq!(hash.as_str().len(), 64);
    assert_eq!(hash, project_hash_from_root(root));
    assert_ne!(hash, project_hash_from_root("/different/path"));
}

#[test]
fn test_resolve_data_dir_with_explicit() {
    let result = resolve_data_dir(Some("/explicit/data")).unwrap();
    assert_eq!(result, PathBuf::from("/explicit/data"));
}

#[test]
fn test_expand_tilde_leaves_plain_paths() {
    assert_eq!(expand_tilde("/var/log"), PathBuf::from("/var/log"));
    assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
}

#[test]
fn test_normalize_path_is_absolute() {
    let temp_dir = TempDir::new().unwrap();
    assert!(normalize_path(temp_dir.path()).is_absolute());
    assert!(paths_equal(temp_dir.path(), &temp_dir.path().join(".")));
}

#[test]
fn test_claude_project_dir_name() {
    assert_eq!(
        claude_project_dir_name(Path::new("/Users/foo/bar.rs")),
        "-Users-foo-bar-rs"
    );
    assert_eq!(
        claude_project_dir_name(Path::new("/home/me/my_proj")),
        "-home-me-my-proj"
    );
    assert_eq!(
        legacy_claude_project_dir_name(Path::new("/home/me/my_proj")),
        "-home-me-my_proj"
    );
}

#[test]
fn test_repo_name_from_cwd() {
    assert_eq!(repo_name_from_cwd("/home/me/agscope/"), Some("agscope".to_string()));
    assert_eq!(repo_name_from_cwd("/"), None);
}
