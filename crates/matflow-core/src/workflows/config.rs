use crate::core::lammps::input::LammpsData;
use crate::core::models::task::{IncarParams, Task, default_incar_name};
use crate::core::utils::env::EnvChk;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Job-type label (matched against firework names) -> directory holding a
/// pre-recorded run (`inputs/` and `outputs/`).
pub type FakeDirs = BTreeMap<String, PathBuf>;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateWorkflowConfig {
    pub job_name: String,
    pub template_path: PathBuf,
    pub data: LammpsData,
    pub data_filename: String,
    pub user_settings: Map<String, Value>,
    pub is_forcefield: bool,
    pub input_filename: String,
    pub lammps_bin: String,
}

#[derive(Default)]
pub struct TemplateWorkflowConfigBuilder {
    job_name: Option<String>,
    template_path: Option<PathBuf>,
    data: Option<LammpsData>,
    data_filename: Option<String>,
    user_settings: Option<Map<String, Value>>,
    is_forcefield: Option<bool>,
    input_filename: Option<String>,
    lammps_bin: Option<String>,
}

impl TemplateWorkflowConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }
    pub fn template_path(mut self, path: PathBuf) -> Self {
        self.template_path = Some(path);
        self
    }
    pub fn data(mut self, data: LammpsData) -> Self {
        self.data = Some(data);
        self
    }
    pub fn data_filename(mut self, name: impl Into<String>) -> Self {
        self.data_filename = Some(name.into());
        self
    }
    pub fn user_settings(mut self, settings: Map<String, Value>) -> Self {
        self.user_settings = Some(settings);
        self
    }
    pub fn is_forcefield(mut self, flag: bool) -> Self {
        self.is_forcefield = Some(flag);
        self
    }
    pub fn input_filename(mut self, name: impl Into<String>) -> Self {
        self.input_filename = Some(name.into());
        self
    }
    pub fn lammps_bin(mut self, bin: impl Into<String>) -> Self {
        self.lammps_bin = Some(bin.into());
        self
    }

    pub fn build(self) -> Result<TemplateWorkflowConfig, ConfigError> {
        Ok(TemplateWorkflowConfig {
            job_name: self
                .job_name
                .ok_or(ConfigError::MissingParameter("job_name"))?,
            template_path: self
                .template_path
                .ok_or(ConfigError::MissingParameter("template_path"))?,
            data: self.data.ok_or(ConfigError::MissingParameter("data"))?,
            data_filename: self
                .data_filename
                .ok_or(ConfigError::MissingParameter("data_filename"))?,
            user_settings: self.user_settings.unwrap_or_default(),
            is_forcefield: self.is_forcefield.unwrap_or(false),
            input_filename: self
                .input_filename
                .unwrap_or_else(|| "lammps.inp".to_string()),
            lammps_bin: self.lammps_bin.unwrap_or_else(|| "lammps".to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NvtWorkflowConfig {
    pub data: LammpsData,
    pub input_filename: String,
    pub data_filename: String,
    pub user_settings: Map<String, Value>,
    pub is_forcefield: bool,
    pub lammps_bin: String,
}

#[derive(Default)]
pub struct NvtWorkflowConfigBuilder {
    data: Option<LammpsData>,
    input_filename: Option<String>,
    data_filename: Option<String>,
    user_settings: Option<Map<String, Value>>,
    is_forcefield: Option<bool>,
    lammps_bin: Option<String>,
}

impl NvtWorkflowConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: LammpsData) -> Self {
        self.data = Some(data);
        self
    }
    pub fn input_filename(mut self, name: impl Into<String>) -> Self {
        self.input_filename = Some(name.into());
        self
    }
    pub fn data_filename(mut self, name: impl Into<String>) -> Self {
        self.data_filename = Some(name.into());
        self
    }
    pub fn user_settings(mut self, settings: Map<String, Value>) -> Self {
        self.user_settings = Some(settings);
        self
    }
    pub fn is_forcefield(mut self, flag: bool) -> Self {
        self.is_forcefield = Some(flag);
        self
    }
    pub fn lammps_bin(mut self, bin: impl Into<String>) -> Self {
        self.lammps_bin = Some(bin.into());
        self
    }

    pub fn build(self) -> Result<NvtWorkflowConfig, ConfigError> {
        Ok(NvtWorkflowConfig {
            data: self.data.ok_or(ConfigError::MissingParameter("data"))?,
            input_filename: self.input_filename.unwrap_or_else(|| "nvt.inp".to_string()),
            data_filename: self.data_filename.unwrap_or_else(|| "in.data".to_string()),
            user_settings: self.user_settings.unwrap_or_default(),
            is_forcefield: self.is_forcefield.unwrap_or(false),
            lammps_bin: self.lammps_bin.unwrap_or_else(|| "lammps".to_string()),
        })
    }
}

/// Parameters for the error-correcting VASP runner.
///
/// Without `vasp_cmd`, the command of the task being replaced is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustodianParams {
    pub vasp_cmd: Option<String>,
    pub job_type: Option<String>,
    pub handler_group: Option<String>,
    pub scratch_dir: Option<String>,
    pub gzip_output: Option<bool>,
    pub max_errors: Option<u32>,
}

impl CustodianParams {
    pub fn to_task(&self, vasp_cmd: String) -> Task {
        Task::RunVaspCustodian {
            vasp_cmd,
            job_type: self.job_type.clone(),
            handler_group: self.handler_group.clone(),
            scratch_dir: self.scratch_dir.clone(),
            gzip_output: self.gzip_output,
            max_errors: self.max_errors,
            extra: Map::new(),
        }
    }
}

/// Parameters for the INCAR-editing task inserted before VASP runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifyIncarParams {
    pub key_update: Option<EnvChk<IncarParams>>,
    pub key_multiply: Option<EnvChk<IncarParams>>,
    pub input_filename: Option<String>,
    pub output_filename: Option<String>,
}

impl ModifyIncarParams {
    /// Updates read from the worker's `incar_update` environment entry.
    pub fn from_worker_env() -> Self {
        Self {
            key_update: Some(EnvChk::reference("incar_update")),
            ..Default::default()
        }
    }

    pub fn to_task(&self) -> Task {
        Task::ModifyIncar {
            key_update: self.key_update.clone(),
            key_multiply: self.key_multiply.clone(),
            input_filename: self
                .input_filename
                .clone()
                .unwrap_or_else(default_incar_name),
            output_filename: self
                .output_filename
                .clone()
                .unwrap_or_else(default_incar_name),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvt_builder_fills_defaults() {
        let config = NvtWorkflowConfigBuilder::new()
            .data(LammpsData::Inline {
                contents: String::new(),
            })
            .build()
            .unwrap();
        assert_eq!(config.input_filename, "nvt.inp");
        assert_eq!(config.data_filename, "in.data");
        assert_eq!(config.lammps_bin, "lammps");
        assert!(!config.is_forcefield);
    }

    #[test]
    fn template_builder_requires_template_path() {
        let err = TemplateWorkflowConfigBuilder::new()
            .job_name("melt")
            .data(PathBuf::from("melt.data").into())
            .data_filename("melt.data")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("template_path"));
    }

    #[test]
    fn custodian_params_carry_options_into_task() {
        let params = CustodianParams {
            handler_group: Some("strict".into()),
            max_errors: Some(5),
            ..Default::default()
        };
        match params.to_task("vasp_std".into()) {
            Task::RunVaspCustodian {
                vasp_cmd,
                handler_group,
                max_errors,
                job_type,
                ..
            } => {
                assert_eq!(vasp_cmd, "vasp_std");
                assert_eq!(handler_group.as_deref(), Some("strict"));
                assert_eq!(max_errors, Some(5));
                assert_eq!(job_type, None);
            }
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn env_modify_incar_references_incar_update() {
        match ModifyIncarParams::from_worker_env().to_task() {
            Task::ModifyIncar {
                key_update: Some(EnvChk::Env(reference)),
                output_filename,
                ..
            } => {
                assert_eq!(reference, ">>incar_update<<");
                assert_eq!(output_filename, "INCAR");
            }
            other => panic!("unexpected task {other:?}"),
        }
    }
}
