use anyhow::Result;
use colored::*;
use notify::{Config, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;

/// Calls `rebuild` once, then again after every change under `watch_dir`.
///
/// Errors from `rebuild` are printed; only watcher failures end the loop.
pub fn watch<F>(watch_dir: &Path, mut rebuild: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    println!(
        "{} Watching for changes in {}...",
        "👀".cyan(),
        watch_dir.display()
    );

    let (tx, rx) = channel();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = notify::RecommendedWatcher::new(tx, config_notify)?;
    watcher.watch(watch_dir, RecursiveMode::Recursive)?;

    run_and_report(&mut rebuild);

    while rx.recv().is_ok() {
        // Debounce simple
        std::thread::sleep(Duration::from_millis(100));
        while rx.try_recv().is_ok() {}
        print!("\x1B[2J\x1B[1;1H");
        println!("{} File changed. Rebuilding...", "🔄".yellow());
        run_and_report(&mut rebuild);
    }
    Ok(())
}

fn run_and_report<F>(rebuild: &mut F)
where
    F: FnMut() -> Result<()>,
{
    if let Err(e) = rebuild() {
        println!("{} Error: {}", "x".red(), e);
    }
}
