use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn file_contains(path: &Path, needle: &str) -> bool {
    fs::read_to_string(path)
        .map(|c| c.contains(needle))
        .unwrap_or(false)
}

#[test]
fn services_do_not_build_http_responses() {
    let services_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/services");
    let mut offenders = Vec::new();
    for file in collect_rs_files(&services_root) {
        if file_contains(&file, "HttpResponse") {
            offenders.push(file.to_string_lossy().to_string());
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Services must return typed results; HTTP translation belongs to handlers. Offenders: {:?}",
            offenders
        );
    }
}

#[test]
fn handlers_do_not_open_transactions() {
    let handlers_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/handlers");
    let mut offenders = Vec::new();
    for file in collect_rs_files(&handlers_root) {
        if file_contains(&file, ".begin(") {
            offenders.push(file.to_string_lossy().to_string());
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Transaction boundaries belong to the service layer. Offenders: {:?}",
            offenders
        );
    }
}
