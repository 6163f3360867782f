use super::read_workflow;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use crate::utils::progress::CliProgressHandler;
use matflow::engine::launchpad::{FwState, LaunchPad};
use matflow::engine::progress::ProgressReporter;
use matflow::engine::rocket::rapidfire;
use matflow::engine::worker::Worker;
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let worker = build_worker(&args)?;
    let workflow = read_workflow(&args.input)?;

    let mut launchpad = LaunchPad::new("matflow");
    let id_map = launchpad.add_wf(workflow)?;
    std::fs::create_dir_all(&args.launch_dir)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Running workflow on worker '{}'...", worker.name);
    let launched = rapidfire(
        &mut launchpad,
        &worker,
        &args.launch_dir,
        args.max_loops,
        &reporter,
    )?;
    info!("{} launch(es) finished.", launched);

    let mut ids: Vec<_> = id_map.values().copied().collect();
    ids.sort_unstable();
    let mut fizzled = 0;
    for fw_id in ids {
        let (Some(fw), Some(state)) = (launchpad.firework(fw_id), launchpad.state(fw_id)) else {
            continue;
        };
        let launch_dir = launchpad
            .launches(fw_id)
            .last()
            .map(|l| l.launch_dir.display().to_string())
            .unwrap_or_default();
        println!("  [{fw_id}] {:<40} {:<10} {}", fw.name, format!("{state:?}"), launch_dir);
        if let Some(error) = launchpad.launches(fw_id).last().and_then(|l| l.error.as_ref()) {
            println!("        {error}");
        }
        if state == FwState::Fizzled {
            fizzled += 1;
        }
    }

    if fizzled > 0 {
        warn!("{} firework(s) fizzled.", fizzled);
        return Err(CliError::Fizzled { count: fizzled });
    }
    Ok(())
}

fn build_worker(args: &RunArgs) -> Result<Worker> {
    let mut worker = match &args.worker_name {
        Some(name) => Worker::new(name.clone()),
        None => Worker::default(),
    };
    let env = parser::parse_key_values(&args.env_values)
        .map_err(|e| CliError::Argument(e.to_string()))?;
    for (key, value) in env {
        worker = worker.with_env(key, value);
    }
    Ok(worker)
}
