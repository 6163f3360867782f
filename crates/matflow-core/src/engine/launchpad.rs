use super::error::EngineError;
use crate::core::models::firework::Firework;
use crate::core::models::ids::FwId;
use crate::core::models::tracker::Tracker;
use crate::core::models::workflow::{Links, Workflow};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FwState {
    /// Waiting on at least one parent.
    Waiting,
    Ready,
    Running,
    Completed,
    Fizzled,
}

/// One execution of a firework.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    pub launch_dir: PathBuf,
    pub state: FwState,
    pub trackers: Vec<Tracker>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    firework: Firework,
    state: FwState,
    workflow: usize,
    launches: Vec<Launch>,
}

#[derive(Debug, Clone)]
struct StoredWorkflow {
    links: Links,
}

impl StoredWorkflow {
    fn parents(&self, fw_id: FwId) -> impl Iterator<Item = FwId> + '_ {
        self.links
            .iter()
            .filter(move |(_, children)| children.contains(&fw_id))
            .map(|(parent, _)| *parent)
    }
}

/// In-memory store of fireworks awaiting execution.
#[derive(Debug, Clone)]
pub struct LaunchPad {
    name: String,
    workflows: Vec<StoredWorkflow>,
    fireworks: BTreeMap<FwId, Entry>,
    next_fw_id: FwId,
    launch_count: usize,
}

impl LaunchPad {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workflows: Vec::new(),
            fireworks: BTreeMap::new(),
            next_fw_id: 1,
            launch_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a workflow, giving its fireworks fresh positive ids.
    ///
    /// Returns the mapping from the workflow's ids to the stored ids. Roots
    /// start READY, every other firework WAITING.
    pub fn add_wf(&mut self, wf: Workflow) -> Result<HashMap<FwId, FwId>, EngineError> {
        wf.validate()?;
        let mut id_map = HashMap::with_capacity(wf.len());
        for fw in wf.fws() {
            id_map.insert(fw.fw_id, self.next_fw_id);
            self.next_fw_id += 1;
        }

        let links: Links = wf
            .links()
            .iter()
            .map(|(parent, children)| {
                (
                    id_map[parent],
                    children.iter().map(|c| id_map[c]).collect(),
                )
            })
            .collect();
        let roots = wf.root_fw_ids();
        let workflow = self.workflows.len();

        for fw in wf.fws() {
            let mut firework = fw.clone();
            firework.fw_id = id_map[&fw.fw_id];
            let state = if roots.contains(&fw.fw_id) {
                FwState::Ready
            } else {
                FwState::Waiting
            };
            self.fireworks.insert(
                firework.fw_id,
                Entry {
                    firework,
                    state,
                    workflow,
                    launches: Vec::new(),
                },
            );
        }
        info!(
            "Added workflow '{}' with {} firework(s) to launchpad '{}'.",
            wf.name(),
            wf.len(),
            self.name
        );
        self.workflows.push(StoredWorkflow { links });
        Ok(id_map)
    }

    /// The READY firework with the highest priority; ties go to the lowest id.
    pub fn fetch_ready(&self) -> Option<FwId> {
        self.fireworks
            .iter()
            .filter(|(_, e)| e.state == FwState::Ready)
            .max_by_key(|(id, e)| (e.firework.priority().unwrap_or(i64::MIN), Reverse(**id)))
            .map(|(id, _)| *id)
    }

    /// Marks a firework RUNNING and hands out a copy of it.
    pub fn checkout(&mut self, fw_id: FwId) -> Result<Firework, EngineError> {
        let entry = self.entry_mut(fw_id)?;
        entry.state = FwState::Running;
        Ok(entry.firework.clone())
    }

    /// Records a successful launch and readies children whose parents are all done.
    pub fn complete(&mut self, fw_id: FwId, launch: Launch) -> Result<(), EngineError> {
        self.finish(fw_id, FwState::Completed, launch)?;
        let workflow = &self.workflows[self.entry(fw_id)?.workflow];
        let children = workflow.links.get(&fw_id).cloned().unwrap_or_default();

        let mut ready = Vec::new();
        for child in children {
            let parents_done = workflow
                .parents(child)
                .all(|p| self.state(p) == Some(FwState::Completed));
            if parents_done && self.state(child) == Some(FwState::Waiting) {
                ready.push(child);
            }
        }
        for child in ready {
            debug!("Firework {} is now READY.", child);
            self.entry_mut(child)?.state = FwState::Ready;
        }
        Ok(())
    }

    /// Records a failed launch. Children stay WAITING.
    pub fn fizzle(&mut self, fw_id: FwId, launch: Launch) -> Result<(), EngineError> {
        self.finish(fw_id, FwState::Fizzled, launch)
    }

    pub fn state(&self, fw_id: FwId) -> Option<FwState> {
        self.fireworks.get(&fw_id).map(|e| e.state)
    }

    pub fn firework(&self, fw_id: FwId) -> Option<&Firework> {
        self.fireworks.get(&fw_id).map(|e| &e.firework)
    }

    pub fn launches(&self, fw_id: FwId) -> &[Launch] {
        self.fireworks
            .get(&fw_id)
            .map(|e| e.launches.as_slice())
            .unwrap_or(&[])
    }

    pub fn fw_ids(&self) -> impl Iterator<Item = FwId> + '_ {
        self.fireworks.keys().copied()
    }

    /// Hands out the next launch sequence number.
    pub fn next_launch_number(&mut self) -> usize {
        self.launch_count += 1;
        self.launch_count
    }

    /// Removes every workflow and firework.
    pub fn reset(&mut self) {
        info!("Resetting launchpad '{}'.", self.name);
        self.workflows.clear();
        self.fireworks.clear();
        self.next_fw_id = 1;
        self.launch_count = 0;
    }

    fn finish(&mut self, fw_id: FwId, state: FwState, launch: Launch) -> Result<(), EngineError> {
        let entry = self.entry_mut(fw_id)?;
        entry.state = state;
        entry.launches.push(launch);
        Ok(())
    }

    fn entry(&self, fw_id: FwId) -> Result<&Entry, EngineError> {
        self.fireworks
            .get(&fw_id)
            .ok_or(EngineError::UnknownFirework(fw_id))
    }

    fn entry_mut(&mut self, fw_id: FwId) -> Result<&mut Entry, EngineError> {
        self.fireworks
            .get_mut(&fw_id)
            .ok_or(EngineError::UnknownFirework(fw_id))
    }
}
