use super::error::EngineError;
use super::executor::execute_task;
use super::launchpad::{FwState, Launch, LaunchPad};
use super::progress::{Progress, ProgressReporter};
use super::worker::Worker;
use crate::core::models::firework::Firework;
use crate::core::models::ids::FwId;
use crate::core::models::tracker::Tracker;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Runs the next READY firework in a fresh launch directory under `launch_root`.
///
/// Returns the id of the firework that ran, or `None` when nothing is READY.
/// A failing task fizzles the firework and is not an error of this function;
/// only launchpad and launch-directory problems are.
#[instrument(skip_all, name = "launch_rocket")]
pub fn launch_rocket(
    launchpad: &mut LaunchPad,
    worker: &Worker,
    launch_root: &Path,
    reporter: &ProgressReporter,
) -> Result<Option<FwId>, EngineError> {
    let Some(fw_id) = launchpad.fetch_ready() else {
        return Ok(None);
    };
    let launch_dir = launch_root.join(format!("launcher_{:04}", launchpad.next_launch_number()));
    std::fs::create_dir_all(&launch_dir).map_err(|e| EngineError::io(&launch_dir, e))?;

    let firework = launchpad.checkout(fw_id)?;
    info!(
        "Launching firework {} '{}' in {:?}",
        fw_id, firework.name, launch_dir
    );
    reporter.report(Progress::LaunchStart {
        fw_id,
        name: firework.name.clone(),
        total_tasks: firework.tasks().len() as u64,
    });

    let outcome = run_tasks(&firework, &launch_dir, worker, reporter);
    let launch = Launch {
        trackers: collect_trackers(&firework, &launch_dir, reporter),
        launch_dir,
        state: if outcome.is_ok() {
            FwState::Completed
        } else {
            FwState::Fizzled
        },
        error: outcome.as_ref().err().map(|e| e.to_string()),
    };

    let state = launch.state;
    match outcome {
        Ok(()) => launchpad.complete(fw_id, launch)?,
        Err(e) => {
            warn!("Firework {} '{}' fizzled: {}", fw_id, firework.name, e);
            reporter.report(Progress::Message(format!(
                "Firework {} '{}' fizzled: {}",
                fw_id, firework.name, e
            )));
            launchpad.fizzle(fw_id, launch)?;
        }
    }
    reporter.report(Progress::LaunchFinish { fw_id, state });
    Ok(Some(fw_id))
}

/// Launches rockets until nothing is READY or `max_loops` launches have run.
///
/// Returns the number of launches.
pub fn rapidfire(
    launchpad: &mut LaunchPad,
    worker: &Worker,
    launch_root: &Path,
    max_loops: Option<usize>,
    reporter: &ProgressReporter,
) -> Result<usize, EngineError> {
    let mut launched = 0;
    while max_loops.is_none_or(|max| launched < max) {
        if launch_rocket(launchpad, worker, launch_root, reporter)?.is_none() {
            break;
        }
        launched += 1;
    }
    info!("Rapidfire finished after {} launch(es).", launched);
    Ok(launched)
}

fn run_tasks(
    firework: &Firework,
    launch_dir: &Path,
    worker: &Worker,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    for (index, task) in firework.tasks().iter().enumerate() {
        reporter.report(Progress::TaskStart {
            index,
            name: task.name().to_string(),
        });
        execute_task(task, launch_dir, worker)?;
    }
    Ok(())
}

fn collect_trackers(
    firework: &Firework,
    launch_dir: &Path,
    reporter: &ProgressReporter,
) -> Vec<Tracker> {
    let mut trackers = firework.trackers().to_vec();
    for tracker in &mut trackers {
        if let Err(e) = tracker.track(launch_dir) {
            warn!("Could not read tracked file '{}': {}", tracker.filename, e);
            reporter.report(Progress::Message(format!(
                "Tracker for '{}' skipped: {}",
                tracker.filename, e
            )));
        }
    }
    trackers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::incar::Incar;
    use crate::core::io::poscar::{kpoints_string, poscar_string};
    use crate::core::models::input_set::VaspInputSet;
    use crate::core::models::structure::Structure;
    use crate::core::models::structure::fixtures::silicon;
    use crate::core::models::task::Task;
    use crate::core::models::workflow::Workflow;
    use crate::workflows::config::{CustodianParams, FakeDirs};
    use crate::workflows::powerups::{add_trackers, decorate_write_name, use_fake_vasp};
    use crate::workflows::vasp::basic_vasp_workflow;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn record_reference(
        root: &Path,
        label: &str,
        structure: &Structure,
        set: VaspInputSet,
    ) -> PathBuf {
        let dir = root.join(label.replace(' ', "_"));
        let inputs = dir.join("inputs");
        let outputs = dir.join("outputs");
        std::fs::create_dir_all(&inputs).unwrap();
        std::fs::create_dir_all(&outputs).unwrap();

        Incar::new(set.incar.clone())
            .write_to_path(&inputs.join("INCAR"))
            .unwrap();
        let poscar = poscar_string(structure, "reference");
        std::fs::write(inputs.join("POSCAR"), poscar).unwrap();
        let kpoints = kpoints_string(set.kpoints_grid(structure));
        std::fs::write(inputs.join("KPOINTS"), kpoints).unwrap();

        let outcar = format!("{label}\nGeneral timing and accounting\n");
        std::fs::write(outputs.join("OUTCAR"), outcar).unwrap();
        let oszicar = "1 F= -.10838E+02 E0= -.10838E+02\n";
        std::fs::write(outputs.join("OSZICAR"), oszicar).unwrap();
        dir
    }

    fn replayable_workflow(reference_root: &Path) -> Workflow {
        let si = silicon();
        let relax_ref = record_reference(
            reference_root,
            "structure optimization",
            &si,
            VaspInputSet::mp_relax(),
        );
        let static_ref = record_reference(reference_root, "static", &si, VaspInputSet::mp_static());
        let fake_dirs = FakeDirs::from([
            ("structure optimization".to_string(), relax_ref),
            ("static".to_string(), static_ref),
        ]);

        let wf = basic_vasp_workflow(&si, "vasp_std").unwrap();
        let wf = use_fake_vasp(wf, &fake_dirs).unwrap();
        let wf = decorate_write_name(wf, true);
        add_trackers(wf)
    }

    fn collecting(events: &Mutex<Vec<Progress>>) -> ProgressReporter<'_> {
        ProgressReporter::with_callback(Box::new(move |event: Progress| {
            events.lock().unwrap().push(event);
        }))
    }

    #[test]
    fn basic_workflow_replays_to_completion() {
        let references = tempfile::tempdir().unwrap();
        let launches = tempfile::tempdir().unwrap();
        let mut lp = LaunchPad::new("test");
        let ids = lp.add_wf(replayable_workflow(references.path())).unwrap();

        let events = Mutex::new(Vec::new());
        let reporter = collecting(&events);
        let launched =
            rapidfire(&mut lp, &Worker::default(), launches.path(), None, &reporter).unwrap();
        drop(reporter);
        assert_eq!(launched, 2);

        let relax = ids[&-1];
        let static_run = ids[&-2];
        assert_eq!(lp.state(relax), Some(FwState::Completed));
        assert_eq!(lp.state(static_run), Some(FwState::Completed));

        let launch = &lp.launches(relax)[0];
        assert!(launch.launch_dir.join("FW--Si2-structure_optimization").exists());
        assert!(launch.launch_dir.join("OUTCAR").exists());
        let oszicar = launch
            .trackers
            .iter()
            .find(|t| t.filename == "OSZICAR")
            .unwrap();
        assert!(oszicar.content.contains("F= -.10838E+02"));

        let events = events.into_inner().unwrap();
        let finished = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Progress::LaunchFinish {
                        state: FwState::Completed,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(finished, 2);
        assert!(!events.iter().any(|e| matches!(e, Progress::Message(_))));
    }

    #[test]
    fn mismatched_inputs_fizzle_and_block_children() {
        let references = tempfile::tempdir().unwrap();
        let launches = tempfile::tempdir().unwrap();
        let wf = replayable_workflow(references.path());
        // Corrupt the relaxation reference so replay refuses it.
        let relax_ref = references.path().join("structure_optimization/inputs/INCAR");
        std::fs::write(&relax_ref, "ENCUT = 400\n").unwrap();

        let mut lp = LaunchPad::new("test");
        let ids = lp.add_wf(wf).unwrap();
        let reporter = ProgressReporter::new();
        let launched =
            rapidfire(&mut lp, &Worker::default(), launches.path(), None, &reporter).unwrap();

        assert_eq!(launched, 1);
        assert_eq!(lp.state(ids[&-1]), Some(FwState::Fizzled));
        assert_eq!(lp.state(ids[&-2]), Some(FwState::Waiting));
        let error = lp.launches(ids[&-1])[0].error.as_deref().unwrap();
        assert!(error.contains("ENCUT"));
    }

    #[test]
    fn max_loops_bounds_the_number_of_launches() {
        let references = tempfile::tempdir().unwrap();
        let launches = tempfile::tempdir().unwrap();
        let mut lp = LaunchPad::new("test");
        let ids = lp.add_wf(replayable_workflow(references.path())).unwrap();

        let reporter = ProgressReporter::new();
        let launched =
            rapidfire(&mut lp, &Worker::default(), launches.path(), Some(1), &reporter).unwrap();
        assert_eq!(launched, 1);
        assert_eq!(lp.state(ids[&-2]), Some(FwState::Ready));
        assert!(launches.path().join("launcher_0001").is_dir());
    }

    #[test]
    fn empty_launchpad_launches_nothing() {
        let launches = tempfile::tempdir().unwrap();
        let mut lp = LaunchPad::new("empty");
        let reporter = ProgressReporter::new();
        let ran = launch_rocket(&mut lp, &Worker::default(), launches.path(), &reporter).unwrap();
        assert_eq!(ran, None);
    }

    #[test]
    fn unsupported_task_fizzles_with_a_message() {
        let launches = tempfile::tempdir().unwrap();
        let mut lp = LaunchPad::new("test");
        let task = CustodianParams::default().to_task("vasp".into());
        let fw = Firework::new(-1, "custodian", vec![task]);
        let ids = lp.add_wf(Workflow::from_firework(fw, "custodian only")).unwrap();

        let events = Mutex::new(Vec::new());
        let reporter = collecting(&events);
        launch_rocket(&mut lp, &Worker::default(), launches.path(), &reporter).unwrap();
        drop(reporter);

        assert_eq!(lp.state(ids[&-1]), Some(FwState::Fizzled));
        let messages: Vec<String> = events
            .into_inner()
            .unwrap()
            .into_iter()
            .filter_map(|e| match e {
                Progress::Message(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("'custodian' fizzled"));
    }

    #[test]
    fn unreadable_tracked_file_is_reported() {
        let launches = tempfile::tempdir().unwrap();
        let mut lp = LaunchPad::new("test");
        let mut fw = Firework::new(-1, "static", vec![Task::empty_file("marker")]);
        fw.add_trackers([Tracker::new("OUTCAR", 5, false)]);
        let ids = lp.add_wf(Workflow::from_firework(fw, "tracked")).unwrap();
        // A directory where the tracked file should be cannot be read as text.
        std::fs::create_dir_all(launches.path().join("launcher_0001/OUTCAR")).unwrap();

        let events = Mutex::new(Vec::new());
        let reporter = collecting(&events);
        launch_rocket(&mut lp, &Worker::default(), launches.path(), &reporter).unwrap();
        drop(reporter);

        assert_eq!(lp.state(ids[&-1]), Some(FwState::Completed));
        let events = events.into_inner().unwrap();
        assert!(events.iter().any(
            |e| matches!(e, Progress::Message(m) if m.starts_with("Tracker for 'OUTCAR' skipped"))
        ));
        assert!(lp.launches(ids[&-1])[0].trackers[0].content.is_empty());
    }
}
