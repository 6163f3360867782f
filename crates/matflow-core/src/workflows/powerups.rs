//! Powerups: functions that take a finished workflow and return a rewritten one.
//!
//! VASP run tasks are located in two steps. A firework qualifies when its name
//! contains one of the known job-type labels; inside it, every task that runs
//! VASP is a match. Each powerup then substitutes, inserts or decorates at the
//! matched positions using typed edits on the workflow.

use super::config::{CustodianParams, FakeDirs, ModifyIncarParams};
use crate::core::models::error::ModelError;
use crate::core::models::task::{SimulationCode, Task};
use crate::core::models::tracker::Tracker;
use crate::core::models::workflow::Workflow;
use crate::core::utils::slug::slugify;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Job-type labels searched for in firework names.
pub const KNOWN_JOB_TYPES: &[&str] = &[
    "structure optimization",
    "static",
    "nscf uniform",
    "nscf line",
];

/// Output files tailed by [`add_trackers`].
const TRACKED_FILES: &[&str] = &["OUTCAR", "OSZICAR"];
const TRACKER_LINES: usize = 25;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowerupError {
    #[error(
        "Task {task_index} ({task}) of firework '{firework}' has no '{key}' and no override was given"
    )]
    MissingParameter {
        firework: String,
        task_index: usize,
        task: String,
        key: &'static str,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A powerup together with its arguments, so pipelines can be described as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Powerup {
    DecoratePriority {
        root_priority: i64,
        child_priority: Option<i64>,
    },
    UseCustodian {
        fw_name_filter: Option<String>,
        params: CustodianParams,
    },
    UseFakeVasp {
        fake_dirs: FakeDirs,
    },
    DecorateWriteName {
        use_slug: bool,
    },
    AddTrackers,
    AddModifyIncar {
        fw_name_filter: Option<String>,
        params: ModifyIncarParams,
    },
    AddModifyIncarEnvChk {
        fw_name_filter: Option<String>,
    },
}

impl Powerup {
    pub fn name(&self) -> &'static str {
        match self {
            Powerup::DecoratePriority { .. } => "decorate-priority",
            Powerup::UseCustodian { .. } => "use-custodian",
            Powerup::UseFakeVasp { .. } => "use-fake-vasp",
            Powerup::DecorateWriteName { .. } => "decorate-write-name",
            Powerup::AddTrackers => "add-trackers",
            Powerup::AddModifyIncar { .. } => "add-modify-incar",
            Powerup::AddModifyIncarEnvChk { .. } => "add-modify-incar-envchk",
        }
    }

    pub fn apply(&self, wf: Workflow) -> Result<Workflow, PowerupError> {
        match self {
            Powerup::DecoratePriority {
                root_priority,
                child_priority,
            } => Ok(decorate_priority(wf, *root_priority, *child_priority)),
            Powerup::UseCustodian {
                fw_name_filter,
                params,
            } => use_custodian(wf, fw_name_filter.as_deref(), params),
            Powerup::UseFakeVasp { fake_dirs } => use_fake_vasp(wf, fake_dirs),
            Powerup::DecorateWriteName { use_slug } => Ok(decorate_write_name(wf, *use_slug)),
            Powerup::AddTrackers => Ok(add_trackers(wf)),
            Powerup::AddModifyIncar {
                fw_name_filter,
                params,
            } => add_modify_incar(wf, params, fw_name_filter.as_deref()),
            Powerup::AddModifyIncarEnvChk { fw_name_filter } => {
                add_modify_incar_envchk(wf, fw_name_filter.as_deref())
            }
        }
    }
}

/// Applies powerups in order, feeding each the result of the previous one.
pub fn apply_powerups(wf: Workflow, powerups: &[Powerup]) -> Result<Workflow, PowerupError> {
    powerups.iter().try_fold(wf, |wf, powerup| {
        debug!("Applying powerup '{}' to '{}'", powerup.name(), wf.name());
        powerup.apply(wf)
    })
}

/// Whether a task runs VASP, whichever way it does so.
pub fn is_vasp_run_task(task: &Task) -> bool {
    task.runs(SimulationCode::Vasp)
}

/// `(firework index, task index)` of every VASP run task in a firework whose
/// name carries a known job-type label.
///
/// A firework whose name contains several labels is scanned once per label,
/// so its matches repeat.
pub fn find_vasp_run_tasks(wf: &Workflow) -> Vec<(usize, usize)> {
    find_run_tasks_for_labels(wf, KNOWN_JOB_TYPES.iter().copied())
}

fn find_run_tasks_for_labels<'a>(
    wf: &Workflow,
    labels: impl Iterator<Item = &'a str> + Clone,
) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    for (idx_fw, fw) in wf.fws().iter().enumerate() {
        for label in labels.clone() {
            if fw.name.contains(label) {
                for idx_t in fw.runner_indices(SimulationCode::Vasp) {
                    found.push((idx_fw, idx_t));
                }
            }
        }
    }
    found
}

fn passes_filter(name: &str, fw_name_filter: Option<&str>) -> bool {
    fw_name_filter.is_none_or(|filter| name.contains(filter))
}

/// Gives root fireworks `root_priority` and every other firework
/// `child_priority` (defaults to `root_priority`).
pub fn decorate_priority(
    mut wf: Workflow,
    root_priority: i64,
    child_priority: Option<i64>,
) -> Workflow {
    let child_priority = child_priority.unwrap_or(root_priority);
    let roots: HashSet<_> = wf.root_fw_ids().into_iter().collect();
    for fw in wf.fws_mut() {
        if roots.contains(&fw.fw_id) {
            fw.set_priority(root_priority);
        } else {
            fw.set_priority(child_priority);
        }
    }
    wf
}

/// Swaps every matched VASP run for an error-correcting run.
///
/// The command comes from `params.vasp_cmd` when given, otherwise from the
/// task being replaced; a replay task carries no command, so replacing one
/// without an override fails.
pub fn use_custodian(
    mut wf: Workflow,
    fw_name_filter: Option<&str>,
    params: &CustodianParams,
) -> Result<Workflow, PowerupError> {
    let mut replaced = 0;
    for (idx_fw, idx_t) in find_vasp_run_tasks(&wf) {
        let fw = wf.firework_mut(idx_fw)?;
        if !passes_filter(&fw.name, fw_name_filter) {
            continue;
        }
        let vasp_cmd = match &params.vasp_cmd {
            Some(cmd) => cmd.clone(),
            None => {
                let task = &fw.tasks()[idx_t];
                task.vasp_cmd()
                    .ok_or_else(|| PowerupError::MissingParameter {
                        firework: fw.name.clone(),
                        task_index: idx_t,
                        task: task.name().to_string(),
                        key: "vasp_cmd",
                    })?
                    .to_string()
            }
        };
        fw.replace_task(idx_t, params.to_task(vasp_cmd))?;
        replaced += 1;
    }
    info!("Replaced {} VASP run task(s) with custodian runs.", replaced);
    Ok(wf)
}

/// Swaps every VASP run for a replay of the pre-recorded run registered for
/// the firework's job type.
///
/// Only fireworks whose name contains a label of `fake_dirs` are touched. When
/// a name contains several labels, the last label in map order wins.
pub fn use_fake_vasp(mut wf: Workflow, fake_dirs: &FakeDirs) -> Result<Workflow, PowerupError> {
    let mut replaced = 0;
    for idx_fw in 0..wf.len() {
        let fw = wf.firework_mut(idx_fw)?;
        for (job_type, fake_dir) in fake_dirs {
            if !fw.name.contains(job_type.as_str()) {
                continue;
            }
            let runs: Vec<usize> = fw.runner_indices(SimulationCode::Vasp).collect();
            for idx_t in runs {
                fw.replace_task(idx_t, Task::run_vasp_fake(fake_dir.clone()))?;
                replaced += 1;
            }
        }
    }
    info!("Replaced {} VASP run task(s) with replay runs.", replaced);
    Ok(wf)
}

/// Makes every firework start by writing an empty `FW--<name>` file, so launch
/// directories can be told apart (`ls launcher_*/FW--*`).
pub fn decorate_write_name(mut wf: Workflow, use_slug: bool) -> Workflow {
    for fw in wf.fws_mut() {
        let mut filename = format!("FW--{}", fw.name);
        if use_slug {
            filename = slugify(&filename);
        }
        fw.prepend_task(Task::empty_file(filename));
    }
    wf
}

/// Every firework that runs VASP also tails OUTCAR and OSZICAR.
///
/// Existing trackers are kept; the two trackers are appended once per call.
pub fn add_trackers(mut wf: Workflow) -> Workflow {
    let matched: HashSet<usize> = find_vasp_run_tasks(&wf)
        .into_iter()
        .map(|(idx_fw, _)| idx_fw)
        .collect();
    for (idx_fw, fw) in wf.fws_mut().enumerate() {
        if matched.contains(&idx_fw) {
            fw.add_trackers(
                TRACKED_FILES
                    .iter()
                    .map(|f| Tracker::new(*f, TRACKER_LINES, true)),
            );
        }
    }
    wf
}

/// Inserts an INCAR-editing task right before every matched VASP run.
pub fn add_modify_incar(
    mut wf: Workflow,
    params: &ModifyIncarParams,
    fw_name_filter: Option<&str>,
) -> Result<Workflow, PowerupError> {
    let matches: BTreeSet<(usize, usize)> = find_vasp_run_tasks(&wf).into_iter().collect();
    // Back to front, so earlier insertions do not shift pending indices.
    for &(idx_fw, idx_t) in matches.iter().rev() {
        let fw = wf.firework_mut(idx_fw)?;
        if passes_filter(&fw.name, fw_name_filter) {
            fw.insert_task(idx_t, params.to_task())?;
        }
    }
    Ok(wf)
}

/// [`add_modify_incar`] with updates taken from the worker's `incar_update`
/// environment entry.
pub fn add_modify_incar_envchk(
    wf: Workflow,
    fw_name_filter: Option<&str>,
) -> Result<Workflow, PowerupError> {
    add_modify_incar(wf, &ModifyIncarParams::from_worker_env(), fw_name_filter)
}
