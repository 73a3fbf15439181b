/// Command line entry point: load a task, report on it, and write it back.
///
/// Usage: `satcore [data-dir] <project> <task-index>`
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use satcore::config::SessionConfig;
    use satcore::format::{AutoSaveManager, FileBackend};
    use satcore::state::Session;

    let config = SessionConfig::load_from_default_path().unwrap_or_default();
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (data_dir, project, task) = match args.as_slice() {
        [dir, project, task] => (Some(std::path::PathBuf::from(dir)), project, task),
        [project, task] => (
            config
                .data_dir
                .clone()
                .or_else(SessionConfig::default_data_dir),
            project,
            task,
        ),
        _ => {
            eprintln!("Usage: satcore [data-dir] <project> <task-index>");
            std::process::exit(2);
        }
    };
    let Some(data_dir) = data_dir else {
        eprintln!("No data directory given and none could be determined");
        std::process::exit(2);
    };
    let task_index: usize = match task.parse() {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Invalid task index '{}': {}", task, e);
            std::process::exit(2);
        }
    };

    let backend = FileBackend::new(data_dir);
    let mut session = match Session::load(&backend, task_index, project) {
        Ok(session) => session.with_auto_save(AutoSaveManager::from_config(&config.auto_save)),
        Err(e) => {
            log::error!("Failed to load task {} of '{}': {}", task_index, project, e);
            std::process::exit(1);
        }
    };

    for item in session.items() {
        let labels = session.item_labels(item.index);
        let tracked = labels.iter().filter(|l| l.is_tracked()).count();
        println!(
            "item {:>4}  {:>3} labels  {:>3} tracked  {}",
            item.index,
            labels.len(),
            tracked,
            item.url
        );
    }
    println!(
        "{} items, {} labels, {} events, last label id {}",
        session.items().len(),
        session.num_valid_labels(),
        session.events().len(),
        session.last_label_id()
    );

    session.save(&backend);
}

// The core has no browser entry point of its own
#[cfg(target_arch = "wasm32")]
fn main() {}
