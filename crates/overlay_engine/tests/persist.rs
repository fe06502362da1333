use std::fs;

use overlay_engine::AtomicFileWriter;
use tempfile::TempDir;

#[test]
fn writes_create_the_directory_and_replace_existing_content() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("state");
    let writer = AtomicFileWriter::new(dir.clone());

    let first = writer.write("settings.ron", "a").unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), "a");

    let second = writer.write("settings.ron", "b").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "b");
}

#[test]
fn no_partial_file_is_left_on_error() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let writer = AtomicFileWriter::new(blocker.clone());
    assert!(writer.write("settings.ron", "data").is_err());
    assert!(!blocker.with_file_name("settings.ron").exists());
}
