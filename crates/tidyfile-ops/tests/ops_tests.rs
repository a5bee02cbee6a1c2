use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tidyfile_core::ClassificationRules;
use tidyfile_ops::{
    ArchiveEncoding, ArchiveRequest, DeleteOptions, FailureKind, FileError, Organizer,
    archive_folder, compress_files, compress_folder, delete_files, delete_folder,
};

fn write_scenario(root: &Path) {
    fs::write(root.join("a.txt"), "meeting notes").unwrap();
    fs::write(root.join("b.jpg"), [0xffu8, 0xd8, 0xff, 0xe0]).unwrap();
    fs::write(root.join("a_copy.txt"), "meeting notes").unwrap();
}

fn zip_names(path: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

fn tar_names(path: &Path) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| {
            e.unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string()
        })
        .collect();
    names.sort();
    names
}

#[test]
fn test_organize_scenario() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_scenario(root);

    let report = Organizer::default().organize(root).unwrap();

    let expected: BTreeMap<String, usize> =
        [(".txt".to_string(), 2), (".jpg".to_string(), 1)].into();
    assert_eq!(report.moved, expected);
    assert!(report.result.is_success());
    assert!(root.join("txt_only/a.txt").exists());
    assert!(root.join("txt_only/a_copy.txt").exists());
    assert!(root.join("jpg_only/b.jpg").exists());
    assert!(!root.join("a.txt").exists());
}

#[test]
fn test_organize_twice_moves_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_scenario(root);

    let organizer = Organizer::default();
    assert_eq!(organizer.organize(root).unwrap().total_moved(), 3);

    let second = organizer.organize(root).unwrap();
    assert!(second.moved.is_empty());
    assert_eq!(second.result.total(), 0);
    assert!(root.join("txt_only/a.txt").exists());
}

#[test]
fn test_organize_leaves_unknown_extensions() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("misc")).unwrap();
    fs::write(root.join("misc/model.stl"), "solid x").unwrap();
    fs::write(root.join("README"), "read me").unwrap();
    fs::write(root.join("doc.pdf"), "%PDF").unwrap();

    let report = Organizer::default().organize(root).unwrap();

    assert_eq!(report.total_moved(), 1);
    assert_eq!(fs::read_to_string(root.join("misc/model.stl")).unwrap(), "solid x");
    assert_eq!(fs::read_to_string(root.join("README")).unwrap(), "read me");
    assert!(!root.join("stl_only").exists());
}

#[test]
fn test_organize_with_rules_from_toml() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("notes.md"), "# hi").unwrap();
    fs::write(root.join("todo.txt"), "- x").unwrap();

    let rules =
        ClassificationRules::from_toml_str("[rules]\n\".md\" = \"text\"\n\".txt\" = \"text\"\n")
            .unwrap();
    let report = Organizer::new(rules).organize(root).unwrap();

    assert_eq!(report.total_moved(), 2);
    assert!(root.join("text/notes.md").exists());
    assert!(root.join("text/todo.txt").exists());
}

#[test]
fn test_organize_continues_past_failed_move() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), "notes").unwrap();
    fs::write(root.join("b.jpg"), "jpg").unwrap();
    // A plain file where the .txt folder should go
    fs::write(root.join("txt_only"), "in the way").unwrap();

    let report = Organizer::default().organize(root).unwrap();

    let expected: BTreeMap<String, usize> = [(".jpg".to_string(), 1)].into();
    assert_eq!(report.moved, expected);
    assert_eq!(report.result.total(), 2);
    assert_eq!(report.result.succeeded, 1);
    assert_eq!(report.result.failures.len(), 1);
    assert_eq!(report.result.failures[0].path, root.join("a.txt"));
    assert_eq!(report.result.failures[0].kind, FailureKind::Io);
    assert!(root.join("a.txt").exists());
    assert!(root.join("jpg_only/b.jpg").exists());
}

#[cfg(unix)]
#[test]
fn test_organize_moves_links_as_links() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("real.dat"), "target").unwrap();
    std::os::unix::fs::symlink(root.join("real.dat"), root.join("link.txt")).unwrap();

    let report = Organizer::default().organize(root).unwrap();

    assert_eq!(report.moved.get(".txt"), Some(&1));
    let moved = root.join("txt_only/link.txt");
    assert!(fs::symlink_metadata(&moved).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&moved).unwrap(), "target");
    assert!(root.join("real.dat").exists());
}

#[test]
fn test_zip_two_files() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(src.join("nested")).unwrap();
    let a = src.join("a.txt");
    let b = src.join("nested/b.csv");
    fs::write(&a, "alpha").unwrap();
    fs::write(&b, "1,2,3").unwrap();
    let out = temp.path().join("fresh/dir/bundle.zip");

    let archive = compress_files(&[a.clone(), b.clone()], Some(&out), ArchiveEncoding::Zip).unwrap();

    assert_eq!(archive, out);
    assert_eq!(zip_names(&out), vec!["a.txt", "b.csv"]);
    let mut zip = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
    let mut body = String::new();
    zip.by_name("b.csv").unwrap().read_to_string(&mut body).unwrap();
    assert_eq!(body, "1,2,3");
    assert_eq!(fs::read_to_string(&a).unwrap(), "alpha");
    assert_eq!(fs::read_to_string(&b).unwrap(), "1,2,3");
}

#[test]
fn test_tar_gz_files() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let archive = compress_files(&[a, b], None, ArchiveEncoding::TarGz).unwrap();

    assert_eq!(tar_names(&archive), vec!["a.txt", "b.txt"]);
}

#[test]
fn test_same_base_name_gets_counter_in_both_encodings() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("one/notes.txt");
    let second = temp.path().join("two/notes.txt");
    fs::create_dir_all(temp.path().join("one")).unwrap();
    fs::create_dir_all(temp.path().join("two")).unwrap();
    fs::write(&first, "first").unwrap();
    fs::write(&second, "second").unwrap();
    let sources = [first, second];

    let zip_path = temp.path().join("o.zip");
    compress_files(&sources, Some(&zip_path), ArchiveEncoding::Zip).unwrap();
    assert_eq!(zip_names(&zip_path), vec!["notes.txt", "notes_1.txt"]);
    let mut zip = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
    let mut body = String::new();
    zip.by_name("notes_1.txt").unwrap().read_to_string(&mut body).unwrap();
    assert_eq!(body, "second");

    let tar_path = temp.path().join("o.tar.gz");
    compress_files(&sources, Some(&tar_path), ArchiveEncoding::TarGz).unwrap();
    assert_eq!(tar_names(&tar_path), vec!["notes.txt", "notes_1.txt"]);
}

#[test]
fn test_folder_path_with_dot_dot_keeps_its_name() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("box");
    fs::create_dir_all(folder.join("sub")).unwrap();
    fs::write(folder.join("inner.txt"), "i").unwrap();
    let dotted = folder.join("sub").join("..");

    let archive = compress_folder(&dotted, None, ArchiveEncoding::Zip).unwrap();
    assert_eq!(zip_names(&archive), vec!["box/inner.txt"]);

    let copy = archive_folder(&dotted, None).unwrap();
    let name = copy.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("box_"), "{name}");
    assert_eq!(fs::read_to_string(copy.join("inner.txt")).unwrap(), "i");
}

#[test]
fn test_zip_folder_keeps_folder_prefix() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("photos");
    fs::create_dir_all(folder.join("2024")).unwrap();
    fs::write(folder.join("cover.png"), "png").unwrap();
    fs::write(folder.join("2024/beach.jpg"), "jpg").unwrap();

    let archive = compress_folder(&folder, None, ArchiveEncoding::Zip).unwrap();

    assert_eq!(archive.parent(), Some(fs::canonicalize(temp.path()).unwrap().as_path()));
    let name = archive.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("photos_") && name.ends_with(".zip"), "{name}");
    assert_eq!(
        zip_names(&archive),
        vec!["photos/2024/beach.jpg", "photos/cover.png"]
    );
}

#[test]
fn test_tar_gz_folder_under_base_name() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("project");
    fs::create_dir_all(folder.join("src")).unwrap();
    fs::write(folder.join("src/lib.rs"), "").unwrap();
    let out = temp.path().join("out.tar.gz");

    compress_folder(&folder, Some(&out), ArchiveEncoding::TarGz).unwrap();

    let names = tar_names(&out);
    assert!(names.iter().all(|n| n.starts_with("project")), "{names:?}");
    assert!(names.contains(&"project/src/lib.rs".to_string()));
}

#[test]
fn test_unsupported_encoding() {
    let err = ArchiveEncoding::parse("rar").unwrap_err();
    assert!(matches!(err, FileError::UnsupportedEncoding { ref encoding } if encoding == "rar"));
}

#[test]
fn test_request_dispatch() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.txt");
    fs::write(&a, "a").unwrap();
    let folder = temp.path().join("box");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("inner.txt"), "i").unwrap();

    let copies = ArchiveRequest::files(vec![a.clone()])
        .with_destination(temp.path().join("copies"))
        .execute()
        .unwrap();
    assert_eq!(copies.succeeded, 1);
    assert!(copies.outputs[0].starts_with(temp.path().join("copies")));

    let zipped = ArchiveRequest::files(vec![a.clone()])
        .with_encoding(ArchiveEncoding::Zip)
        .with_destination(temp.path().join("one.zip"))
        .execute()
        .unwrap();
    assert_eq!(zipped.outputs, vec![temp.path().join("one.zip")]);

    let folder_copy = ArchiveRequest::folder(&folder).execute().unwrap();
    assert!(folder_copy.outputs[0].join("inner.txt").exists());

    let folder_tar = ArchiveRequest::folder(&folder)
        .with_encoding(ArchiveEncoding::TarGz)
        .execute()
        .unwrap();
    assert!(folder_tar.outputs[0].to_string_lossy().ends_with(".tar.gz"));
}

#[test]
fn test_delete_scenario() {
    let temp = TempDir::new().unwrap();
    let real = temp.path().join("real.txt");
    let already_gone = temp.path().join("already_gone.txt");
    fs::write(&real, "x").unwrap();
    fs::write(&already_gone, "y").unwrap();
    fs::remove_file(&already_gone).unwrap();

    let result = delete_files(&[real.clone(), already_gone], DeleteOptions::default());

    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].kind, FailureKind::NotFound);
    assert!(!real.exists());

    let report = result.failure_report(10);
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.overflow, 0);
}

#[test]
fn test_delete_folder_removes_subtree() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("old");
    fs::create_dir_all(dir.join("deep")).unwrap();
    fs::write(dir.join("deep/file"), "x").unwrap();

    delete_folder(&dir, DeleteOptions::default()).unwrap();

    assert!(!dir.exists());
    assert!(temp.path().exists());
}
