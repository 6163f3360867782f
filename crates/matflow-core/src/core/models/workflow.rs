use super::error::ModelError;
use super::firework::Firework;
use super::ids::FwId;
use super::task::Task;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Parent firework id -> ids of the fireworks that depend on it.
pub type Links = BTreeMap<FwId, Vec<FwId>>;

/// An ordered set of fireworks and the dependencies between them.
///
/// The serialized form follows the FireWorks dictionary layout
/// (`fws`, `links`, `name`, `metadata`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    fws: Vec<Firework>,
    #[serde(default)]
    links: Links,
    name: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl Workflow {
    /// Builds a workflow and checks that ids are unique, links point at known
    /// fireworks and the dependency graph has no cycle.
    pub fn new(
        fws: Vec<Firework>,
        links: Links,
        name: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let wf = Self {
            fws,
            links,
            name: name.into(),
            metadata: Map::new(),
        };
        wf.validate()?;
        Ok(wf)
    }

    /// A workflow made of a single firework.
    pub fn from_firework(fw: Firework, name: impl Into<String>) -> Self {
        Self {
            fws: vec![fw],
            links: Links::new(),
            name: name.into(),
            metadata: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn fws(&self) -> &[Firework] {
        &self.fws
    }

    pub fn fws_mut(&mut self) -> impl Iterator<Item = &mut Firework> {
        self.fws.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fws.is_empty()
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn firework(&self, index: usize) -> Option<&Firework> {
        self.fws.get(index)
    }

    pub fn firework_mut(&mut self, index: usize) -> Result<&mut Firework, ModelError> {
        let len = self.fws.len();
        self.fws
            .get_mut(index)
            .ok_or(ModelError::FireworkIndexOutOfBounds { index, len })
    }

    pub fn index_of(&self, fw_id: FwId) -> Option<usize> {
        self.fws.iter().position(|fw| fw.fw_id == fw_id)
    }

    /// Ids of the fireworks that `fw_id` depends on.
    pub fn parents(&self, fw_id: FwId) -> Vec<FwId> {
        self.links
            .iter()
            .filter(|(_, children)| children.contains(&fw_id))
            .map(|(parent, _)| *parent)
            .collect()
    }

    pub fn children(&self, fw_id: FwId) -> &[FwId] {
        self.links.get(&fw_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of the fireworks without incoming links, in firework order.
    pub fn root_fw_ids(&self) -> Vec<FwId> {
        let with_parent: HashSet<FwId> = self.links.values().flatten().copied().collect();
        self.fws
            .iter()
            .map(|fw| fw.fw_id)
            .filter(|id| !with_parent.contains(id))
            .collect()
    }

    /// Ids of the fireworks nothing depends on, in firework order.
    pub fn leaf_fw_ids(&self) -> Vec<FwId> {
        self.fws
            .iter()
            .map(|fw| fw.fw_id)
            .filter(|id| self.children(*id).is_empty())
            .collect()
    }

    /// Replaces one task, returning the task that was there.
    pub fn replace_task(
        &mut self,
        fw_index: usize,
        task_index: usize,
        task: Task,
    ) -> Result<Task, ModelError> {
        self.firework_mut(fw_index)?.replace_task(task_index, task)
    }

    pub fn insert_task(
        &mut self,
        fw_index: usize,
        task_index: usize,
        task: Task,
    ) -> Result<(), ModelError> {
        self.firework_mut(fw_index)?.insert_task(task_index, task)
    }

    /// Firework ids in an order where every parent precedes its children.
    pub fn topological_order(&self) -> Result<Vec<FwId>, ModelError> {
        let mut indegree: HashMap<FwId, usize> = self.fws.iter().map(|fw| (fw.fw_id, 0)).collect();
        for child in self.links.values().flatten() {
            *indegree
                .get_mut(child)
                .ok_or(ModelError::UnknownFwId(*child))? += 1;
        }

        let mut queue: VecDeque<FwId> = self
            .fws
            .iter()
            .map(|fw| fw.fw_id)
            .filter(|id| indegree[id] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.fws.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for child in self.children(id) {
                if let Some(d) = indegree.get_mut(child) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }

        if order.len() != self.fws.len() {
            let stuck = self
                .fws
                .iter()
                .map(|fw| fw.fw_id)
                .find(|id| !order.contains(id))
                .unwrap_or_default();
            return Err(ModelError::Cycle(stuck));
        }
        Ok(order)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for fw in &self.fws {
            if !seen.insert(fw.fw_id) {
                return Err(ModelError::DuplicateFwId(fw.fw_id));
            }
        }
        for (parent, children) in &self.links {
            if !seen.contains(parent) {
                return Err(ModelError::UnknownFwId(*parent));
            }
            if let Some(child) = children.iter().find(|c| !seen.contains(*c)) {
                return Err(ModelError::UnknownFwId(*child));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Converts the workflow to its generic dictionary form.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
