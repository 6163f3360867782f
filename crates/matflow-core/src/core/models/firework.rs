use super::error::ModelError;
use super::ids::FwId;
use super::task::{SimulationCode, Task};
use super::tracker::Tracker;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Orchestration settings of a firework.
///
/// `_tasks`, `_priority` and `_trackers` are modeled explicitly; any other key
/// is preserved as-is in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FireworkSpec {
    #[serde(rename = "_tasks")]
    pub tasks: Vec<Task>,
    #[serde(rename = "_priority", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(rename = "_trackers", default, skip_serializing_if = "Vec::is_empty")]
    pub trackers: Vec<Tracker>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One job of a workflow: an ordered task list plus settings.
///
/// Top-level keys other than `fw_id`, `name` and `spec` (`created_on`,
/// `updated_on`, ...) are carried in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firework {
    pub fw_id: FwId,
    pub name: String,
    pub spec: FireworkSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Firework {
    pub fn new(fw_id: FwId, name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            fw_id,
            name: name.into(),
            spec: FireworkSpec {
                tasks,
                ..Default::default()
            },
            extra: Map::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.spec.tasks
    }

    pub fn priority(&self) -> Option<i64> {
        self.spec.priority
    }

    pub fn set_priority(&mut self, priority: i64) {
        self.spec.priority = Some(priority);
    }

    pub fn trackers(&self) -> &[Tracker] {
        &self.spec.trackers
    }

    /// Appends trackers after the existing ones.
    pub fn add_trackers(&mut self, trackers: impl IntoIterator<Item = Tracker>) {
        self.spec.trackers.extend(trackers);
    }

    /// Replaces the task at `index`, returning the task that was there.
    pub fn replace_task(&mut self, index: usize, task: Task) -> Result<Task, ModelError> {
        let len = self.spec.tasks.len();
        if index >= len {
            return Err(ModelError::TaskIndexOutOfBounds {
                firework: self.name.clone(),
                index,
                len,
            });
        }
        Ok(std::mem::replace(&mut self.spec.tasks[index], task))
    }

    /// Inserts a task so that it ends up at `index`; `index == len` appends.
    pub fn insert_task(&mut self, index: usize, task: Task) -> Result<(), ModelError> {
        let len = self.spec.tasks.len();
        if index > len {
            return Err(ModelError::TaskIndexOutOfBounds {
                firework: self.name.clone(),
                index,
                len,
            });
        }
        self.spec.tasks.insert(index, task);
        Ok(())
    }

    /// Puts a task in front of all others.
    pub fn prepend_task(&mut self, task: Task) {
        self.spec.tasks.insert(0, task);
    }

    /// Indices of the tasks running the given code.
    pub fn runner_indices(&self, code: SimulationCode) -> impl Iterator<Item = usize> + '_ {
        self.spec
            .tasks
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.runs(code))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn static_fw() -> Firework {
        Firework::new(
            -1,
            "Si-static",
            vec![
                Task::empty_file("marker"),
                Task::run_vasp_direct("vasp"),
            ],
        )
    }

    #[test]
    fn replace_returns_previous_task() {
        let mut fw = static_fw();
        let old = fw.replace_task(1, Task::run_vasp_fake("/ref")).unwrap();
        assert_eq!(old.name(), "RunVaspDirect");
        assert_eq!(fw.tasks()[1].name(), "RunVaspFake");
        assert_eq!(fw.tasks().len(), 2);
    }

    #[test]
    fn out_of_range_edits_are_rejected() {
        let mut fw = static_fw();
        let err = fw.replace_task(2, Task::empty_file("x")).unwrap_err();
        assert_eq!(
            err,
            ModelError::TaskIndexOutOfBounds {
                firework: "Si-static".into(),
                index: 2,
                len: 2
            }
        );
        assert!(fw.insert_task(2, Task::empty_file("end")).is_ok());
        assert!(fw.insert_task(5, Task::empty_file("x")).is_err());
    }

    #[test]
    fn runner_indices_skip_preparation_tasks() {
        let fw = static_fw();
        let found: Vec<usize> = fw.runner_indices(SimulationCode::Vasp).collect();
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn spec_keeps_unknown_keys() {
        let fw: Firework = serde_json::from_value(json!({
            "fw_id": 3,
            "name": "static",
            "spec": {
                "_tasks": [],
                "_category": "gpu",
                "vasp_cmd": "vasp_gpu"
            }
        }))
        .unwrap();
        assert_eq!(fw.spec.extra["_category"], json!("gpu"));
        let out = serde_json::to_value(&fw).unwrap();
        assert_eq!(out["spec"]["vasp_cmd"], json!("vasp_gpu"));
        assert!(out["spec"].get("_priority").is_none());
    }

    #[test]
    fn top_level_keys_survive_a_round_trip() {
        let doc = json!({
            "fw_id": 7,
            "name": "Si-static",
            "spec": {"_tasks": [{"_fw_name": "RunVaspDirect", "vasp_cmd": "vasp"}]},
            "created_on": "2016-05-04T17:01:23.123456",
            "state": "READY"
        });
        let fw: Firework = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(fw.extra["created_on"], json!("2016-05-04T17:01:23.123456"));
        assert_eq!(serde_json::to_value(&fw).unwrap(), doc);
    }
}
