use std::{
    sync::{Arc, Barrier},
    thread,
};

use sleeptracker_lib::db::{Database, DATABASE_FILE_NAME};
use tempfile::TempDir;

// One test per binary: the handle is process-wide.
#[test]
fn get_instance_constructs_once_and_ignores_later_paths() {
    let temp_dir = TempDir::new().unwrap();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let dir = temp_dir.path().to_path_buf();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                Database::get_instance(&dir).unwrap()
            })
        })
        .collect();

    let instances: Vec<&'static Database> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = instances[0];
    assert!(instances.iter().all(|db| std::ptr::eq(*db, first)));
    assert_eq!(first.path(), temp_dir.path().join(DATABASE_FILE_NAME));

    let other_dir = TempDir::new().unwrap();
    let again = Database::get_instance(other_dir.path()).unwrap();
    assert!(std::ptr::eq(again, first));
    assert!(!other_dir.path().join(DATABASE_FILE_NAME).exists());

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let nights = runtime.block_on(first.get_all_nights()).unwrap();
    assert!(nights.is_empty());
}
