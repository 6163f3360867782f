use super::input_set::VaspInputSet;
use super::structure::Structure;
use crate::core::lammps::input::LammpsInput;
use crate::core::utils::env::EnvChk;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// INCAR parameters keyed by tag name (e.g. `"ENCUT"`).
pub type IncarParams = BTreeMap<String, Value>;

const FW_NAME_KEY: &str = "_fw_name";

const KNOWN_TASKS: &[&str] = &[
    "WriteLammpsInputFromDictInput",
    "RunLammpsDirect",
    "WriteVaspFromIOSet",
    "ModifyIncar",
    "RunVaspDirect",
    "RunVaspCustodian",
    "RunVaspFake",
    "FileWriteTask",
];

/// The simulation code a task runs, if it runs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationCode {
    Vasp,
    Lammps,
}

/// A file written by [`Task::FileWrite`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToWrite {
    pub filename: String,
    pub contents: String,
}

/// One unit of work inside a firework.
///
/// Serialized in the FireWorks layout: a map whose `_fw_name` key names the task
/// and whose remaining keys are the task parameters. Keys a known task does not
/// model are kept in its `extra` map. Tasks with any other `_fw_name` load as
/// [`Task::Other`] and are written back exactly as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "_fw_name")]
pub enum Task {
    /// Renders a LAMMPS input (and its data file) into the launch directory.
    #[serde(rename = "WriteLammpsInputFromDictInput")]
    WriteLammpsInput {
        lammps_input: LammpsInput,
        input_file: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Runs the LAMMPS binary directly.
    RunLammpsDirect {
        lammps_cmd: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Writes INCAR, POSCAR and KPOINTS for a structure from a named input set.
    #[serde(rename = "WriteVaspFromIOSet")]
    WriteVaspFromIoSet {
        structure: Structure,
        vasp_input_set: VaspInputSet,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Edits an existing INCAR, typically right before VASP starts.
    ModifyIncar {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_update: Option<EnvChk<IncarParams>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_multiply: Option<EnvChk<IncarParams>>,
        #[serde(default = "default_incar_name")]
        input_filename: String,
        #[serde(default = "default_incar_name")]
        output_filename: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Runs the VASP binary directly.
    RunVaspDirect {
        vasp_cmd: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Runs VASP under an error-correcting supervisor.
    RunVaspCustodian {
        vasp_cmd: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handler_group: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scratch_dir: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gzip_output: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_errors: Option<u32>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Replays a pre-recorded VASP run instead of invoking the binary.
    RunVaspFake {
        fake_dir: PathBuf,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// Writes plain files, optionally into a destination directory.
    #[serde(rename = "FileWriteTask")]
    FileWrite {
        files_to_write: Vec<FileToWrite>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// A task this library does not model, including its `_fw_name`.
    #[serde(skip)]
    Other(Map<String, Value>),
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Task::Other(raw) => raw.serialize(serializer),
            known => Task::serialize(known, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let name = raw
            .get(FW_NAME_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field(FW_NAME_KEY))?;
        if !KNOWN_TASKS.contains(&name) {
            return Ok(Task::Other(raw));
        }
        Task::deserialize(Value::Object(raw)).map_err(de::Error::custom)
    }
}

pub(crate) fn default_incar_name() -> String {
    "INCAR".to_string()
}

impl Task {
    /// The task name as it appears under `_fw_name`.
    pub fn name(&self) -> &str {
        match self {
            Task::WriteLammpsInput { .. } => "WriteLammpsInputFromDictInput",
            Task::RunLammpsDirect { .. } => "RunLammpsDirect",
            Task::WriteVaspFromIoSet { .. } => "WriteVaspFromIOSet",
            Task::ModifyIncar { .. } => "ModifyIncar",
            Task::RunVaspDirect { .. } => "RunVaspDirect",
            Task::RunVaspCustodian { .. } => "RunVaspCustodian",
            Task::RunVaspFake { .. } => "RunVaspFake",
            Task::FileWrite { .. } => "FileWriteTask",
            Task::Other(raw) => raw
                .get(FW_NAME_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }

    /// Which simulation code this task runs, or `None` for preparation tasks.
    pub fn simulation_code(&self) -> Option<SimulationCode> {
        match self {
            Task::RunVaspDirect { .. }
            | Task::RunVaspCustodian { .. }
            | Task::RunVaspFake { .. } => Some(SimulationCode::Vasp),
            Task::RunLammpsDirect { .. } => Some(SimulationCode::Lammps),
            Task::WriteLammpsInput { .. }
            | Task::WriteVaspFromIoSet { .. }
            | Task::ModifyIncar { .. }
            | Task::FileWrite { .. }
            | Task::Other(_) => None,
        }
    }

    pub fn runs(&self, code: SimulationCode) -> bool {
        self.simulation_code() == Some(code)
    }

    /// The VASP command line of a run task, when the task carries one.
    pub fn vasp_cmd(&self) -> Option<&str> {
        match self {
            Task::RunVaspDirect { vasp_cmd, .. } | Task::RunVaspCustodian { vasp_cmd, .. } => {
                Some(vasp_cmd)
            }
            _ => None,
        }
    }

    pub fn run_vasp_direct(vasp_cmd: impl Into<String>) -> Self {
        Task::RunVaspDirect {
            vasp_cmd: vasp_cmd.into(),
            extra: Map::new(),
        }
    }

    pub fn run_vasp_fake(fake_dir: impl Into<PathBuf>) -> Self {
        Task::RunVaspFake {
            fake_dir: fake_dir.into(),
            extra: Map::new(),
        }
    }

    pub fn run_lammps_direct(lammps_cmd: impl Into<String>) -> Self {
        Task::RunLammpsDirect {
            lammps_cmd: lammps_cmd.into(),
            extra: Map::new(),
        }
    }

    /// A task writing one empty file, used to tag launch directories.
    pub fn empty_file(filename: impl Into<String>) -> Self {
        Task::FileWrite {
            files_to_write: vec![FileToWrite {
                filename: filename.into(),
                contents: String::new(),
            }],
            dest: None,
            extra: Map::new(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
