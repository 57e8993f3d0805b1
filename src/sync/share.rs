//! Local share inspection: folder enumeration, jpg listing, and
//! share-relative upload path construction.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// An immediate subdirectory of the share root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFolder {
    /// Folder name, the exact match key against remote task names.
    pub name: String,
    pub path: PathBuf,
}

/// Partition of the share root's subdirectories into sync candidates and
/// folders already archived (name carries the completed postfix).
#[derive(Debug, Default)]
pub struct ShareScan {
    pub candidates: Vec<LocalFolder>,
    pub completed: Vec<LocalFolder>,
}

impl ShareScan {
    pub fn total(&self) -> usize {
        self.candidates.len() + self.completed.len()
    }
}

/// Enumerate the share root's immediate subdirectories, sorted by name.
/// Files directly under the root are ignored.
pub fn scan_share(root: &Path, completed_postfix: &str) -> io::Result<ShareScan> {
    let mut scan = ShareScan::default();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        let folder = LocalFolder {
            name: name.clone(),
            path: entry.path(),
        };
        if !completed_postfix.is_empty() && name.ends_with(completed_postfix) {
            scan.completed.push(folder);
        } else {
            scan.candidates.push(folder);
        }
    }
    scan.candidates.sort_by(|a, b| a.name.cmp(&b.name));
    scan.completed.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scan)
}

/// List the folder's `*.jpg` file names, sorted. Non-recursive and
/// case-sensitive: `IMG.JPG` and `img.png` are both ignored.
pub fn list_jpg_files(folder: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().map(|e| e == "jpg") != Some(true) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

/// Build the server-share upload path for an image: the folder name joined
/// to the file name with a forward slash, regardless of host path
/// conventions. Applying it to an already-normalized path changes nothing.
pub fn share_file_path(folder_name: &str, file_name: &str) -> String {
    format!("{folder_name}/{file_name}").replace('\\', "/")
}

/// Folders with no remote task of the same name, in input order. Matching is
/// exact string equality; no case or whitespace normalization is applied.
pub fn unmatched_folders(
    candidates: Vec<LocalFolder>,
    task_names: &HashSet<String>,
) -> Vec<LocalFolder> {
    candidates
        .into_iter()
        .filter(|f| !task_names.contains(&f.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from("/tmp/claude/share_tests").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_scan_partitions_by_postfix() {
        let root = test_dir("partition");
        std::fs::create_dir(root.join("A")).unwrap();
        std::fs::create_dir(root.join("B")).unwrap();
        std::fs::create_dir(root.join("B__completed")).unwrap();
        touch(&root.join("stray_file.jpg"));

        let scan = scan_share(&root, "__completed").unwrap();
        let candidates: Vec<&str> = scan.candidates.iter().map(|f| f.name.as_str()).collect();
        let completed: Vec<&str> = scan.completed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(candidates, vec!["A", "B"]);
        assert_eq!(completed, vec!["B__completed"]);
        assert_eq!(scan.total(), 3);
    }

    #[test]
    fn test_scan_missing_root_errors() {
        assert!(scan_share(Path::new("/tmp/claude/share_tests/nope"), "__completed").is_err());
    }

    #[test]
    fn test_postfix_match_is_exact_suffix() {
        let root = test_dir("suffix");
        std::fs::create_dir(root.join("middle__completed_x")).unwrap();
        let scan = scan_share(&root, "__completed").unwrap();
        // Postfix only counts at the end of the name.
        assert_eq!(scan.candidates.len(), 1);
        assert!(scan.completed.is_empty());
    }

    #[test]
    fn test_list_jpg_only_matches_lowercase_jpg() {
        let root = test_dir("jpg_only");
        touch(&root.join("img1.jpg"));
        touch(&root.join("img2.png"));
        touch(&root.join("img3.JPG"));
        touch(&root.join("img4.jpeg"));
        std::fs::create_dir(root.join("nested")).unwrap();

        let files = list_jpg_files(&root).unwrap();
        assert_eq!(files, vec!["img1.jpg"]);
    }

    #[test]
    fn test_list_jpg_empty_folder() {
        let root = test_dir("jpg_empty");
        assert!(list_jpg_files(&root).unwrap().is_empty());
    }

    #[test]
    fn test_share_file_path_forward_slashes() {
        assert_eq!(share_file_path("lot_a", "img1.jpg"), "lot_a/img1.jpg");
        assert_eq!(
            share_file_path("lot\\sub", "img1.jpg"),
            "lot/sub/img1.jpg"
        );
    }

    #[test]
    fn test_share_file_path_idempotent() {
        let once = share_file_path("lot_a", "img1.jpg");
        assert_eq!(once.replace('\\', "/"), once);
    }

    #[test]
    fn test_unmatched_is_exact_set_difference() {
        let candidates = vec![
            LocalFolder {
                name: "A".into(),
                path: PathBuf::from("/share/A"),
            },
            LocalFolder {
                name: "B".into(),
                path: PathBuf::from("/share/B"),
            },
            LocalFolder {
                name: "b".into(),
                path: PathBuf::from("/share/b"),
            },
        ];
        let tasks: HashSet<String> = ["A".to_string(), "B ".to_string()].into();
        let unmatched = unmatched_folders(candidates, &tasks);
        let names: Vec<&str> = unmatched.iter().map(|f| f.name.as_str()).collect();
        // "B" does not match "B " and "b" does not match "B": exact equality only.
        assert_eq!(names, vec!["B", "b"]);
    }
}
