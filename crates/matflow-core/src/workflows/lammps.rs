use super::config::{NvtWorkflowConfig, TemplateWorkflowConfig};
use crate::core::lammps::input::{LammpsError, LammpsInput};
use crate::core::models::firework::Firework;
use crate::core::models::task::Task;
use crate::core::models::workflow::Workflow;
use serde_json::Map;
use tracing::{info, instrument};

const FIREWORK_NAME: &str = "Run lammps";

/// Workflow whose input file settings come from a template file.
///
/// One firework, `Run lammps`: write the input (and data) file, then run
/// `<lammps_bin> -in <input_filename>`.
#[instrument(skip_all, name = "lammps_template_workflow")]
pub fn wf_from_input_template(config: &TemplateWorkflowConfig) -> Result<Workflow, LammpsError> {
    let input = LammpsInput::from_template_file(
        config.job_name.clone(),
        &config.template_path,
        config.data.clone(),
        config.data_filename.clone(),
        &config.user_settings,
        config.is_forcefield,
    )?;
    let name = format!(
        "LAMMPS Wflow from input template {}",
        config.template_path.display()
    );
    info!("Built LAMMPS input '{}' from template.", input.job_name);
    Ok(single_run_workflow(
        input,
        &config.input_filename,
        &config.lammps_bin,
        name,
    ))
}

/// NVT workflow: `Run lammps` = [write input, run binary].
#[instrument(skip_all, name = "lammps_nvt_workflow")]
pub fn nvt_wf(config: &NvtWorkflowConfig) -> Workflow {
    let input = LammpsInput::nvt(
        config.data.clone(),
        config.data_filename.clone(),
        &config.user_settings,
        config.is_forcefield,
    );
    single_run_workflow(input, &config.input_filename, &config.lammps_bin, "LAMMPS NVT")
}

fn single_run_workflow(
    input: LammpsInput,
    input_filename: &str,
    lammps_bin: &str,
    name: impl Into<String>,
) -> Workflow {
    let write = Task::WriteLammpsInput {
        lammps_input: input,
        input_file: input_filename.to_string(),
        extra: Map::new(),
    };
    let run = Task::run_lammps_direct(format!("{lammps_bin} -in {input_filename}"));
    Workflow::from_firework(Firework::new(-1, FIREWORK_NAME, vec![write, run]), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lammps::input::LammpsData;
    use crate::workflows::config::{NvtWorkflowConfigBuilder, TemplateWorkflowConfigBuilder};
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn nvt_workflow_writes_then_runs() {
        let config = NvtWorkflowConfigBuilder::new()
            .data(PathBuf::from("test_files/nvt.data").into())
            .data_filename("nvt.data")
            .is_forcefield(true)
            .lammps_bin("lmp_serial")
            .build()
            .unwrap();
        let wf = nvt_wf(&config);

        assert_eq!(wf.name(), "LAMMPS NVT");
        assert_eq!(wf.len(), 1);
        let fw = &wf.fws()[0];
        assert_eq!(fw.name, "Run lammps");
        match &fw.tasks()[0] {
            Task::WriteLammpsInput {
                lammps_input,
                input_file,
                ..
            } => {
                assert_eq!(input_file, "nvt.inp");
                assert_eq!(lammps_input.data_filename, "nvt.data");
                assert!(lammps_input.is_forcefield);
            }
            other => panic!("unexpected first task {other:?}"),
        }
        assert_eq!(fw.tasks()[1], Task::run_lammps_direct("lmp_serial -in nvt.inp"));
    }

    #[test]
    fn template_workflow_names_the_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("npt.json");
        std::fs::write(&template, r#"{"units": "real", "run": 1000}"#).unwrap();

        let mut settings = Map::new();
        settings.insert("run".into(), json!(50));
        let config = TemplateWorkflowConfigBuilder::new()
            .job_name("npt")
            .template_path(template.clone())
            .data(LammpsData::Inline {
                contents: "data".into(),
            })
            .data_filename("npt.data")
            .user_settings(settings)
            .build()
            .unwrap();
        let wf = wf_from_input_template(&config).unwrap();

        assert_eq!(
            wf.name(),
            format!("LAMMPS Wflow from input template {}", template.display())
        );
        let fw = &wf.fws()[0];
        assert_eq!(fw.tasks()[1], Task::run_lammps_direct("lammps -in lammps.inp"));
        match &fw.tasks()[0] {
            Task::WriteLammpsInput { lammps_input, .. } => {
                assert_eq!(lammps_input.settings["run"], json!(50));
            }
            other => panic!("unexpected first task {other:?}"),
        }
    }

    #[test]
    fn template_errors_propagate() {
        let config = TemplateWorkflowConfigBuilder::new()
            .job_name("x")
            .template_path(PathBuf::from("/no/such/template.json"))
            .data(LammpsData::Inline {
                contents: String::new(),
            })
            .data_filename("x.data")
            .build()
            .unwrap();
        assert!(matches!(
            wf_from_input_template(&config),
            Err(LammpsError::Io { .. })
        ));
    }
}
