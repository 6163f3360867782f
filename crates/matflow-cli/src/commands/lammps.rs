use super::write_workflow;
use crate::cli::{LammpsCommonArgs, NvtArgs, TemplateArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use matflow::core::lammps::input::LammpsData;
use matflow::core::models::workflow::Workflow;
use matflow::workflows::config::{NvtWorkflowConfigBuilder, TemplateWorkflowConfigBuilder};
use matflow::workflows::lammps::{nvt_wf, wf_from_input_template};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

pub fn run_nvt(args: NvtArgs) -> Result<()> {
    let common = &args.common;
    let (data, settings) = load_common(common)?;

    let mut builder = NvtWorkflowConfigBuilder::new()
        .data(data)
        .user_settings(settings)
        .is_forcefield(common.forcefield);
    if let Some(name) = &common.data_filename {
        builder = builder.data_filename(name);
    }
    if let Some(name) = &common.input_filename {
        builder = builder.input_filename(name);
    }
    if let Some(bin) = &common.lammps_bin {
        builder = builder.lammps_bin(bin);
    }
    let config = builder.build()?;

    finish(nvt_wf(&config), &common.output)
}

pub fn run_template(args: TemplateArgs) -> Result<()> {
    let common = &args.common;
    let (data, settings) = load_common(common)?;

    // The data file keeps its own name unless told otherwise.
    let data_filename = match &common.data_filename {
        Some(name) => name.clone(),
        None => file_name(&common.data)?,
    };
    let mut builder = TemplateWorkflowConfigBuilder::new()
        .job_name(&args.job_name)
        .template_path(args.template.clone())
        .data(data)
        .data_filename(data_filename)
        .user_settings(settings)
        .is_forcefield(common.forcefield);
    if let Some(name) = &common.input_filename {
        builder = builder.input_filename(name);
    }
    if let Some(bin) = &common.lammps_bin {
        builder = builder.lammps_bin(bin);
    }
    let config = builder.build()?;

    finish(wf_from_input_template(&config)?, &common.output)
}

fn load_common(common: &LammpsCommonArgs) -> Result<(LammpsData, Map<String, Value>)> {
    let settings = parser::parse_key_values(&common.set_values)
        .map_err(|e| CliError::Argument(e.to_string()))?;
    let data = if common.inline {
        info!("Embedding data file {:?} in the workflow.", common.data);
        LammpsData::Inline {
            contents: std::fs::read_to_string(&common.data)?,
        }
    } else {
        if !common.data.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Data file does not exist: {}", common.data.display()),
            )));
        }
        LammpsData::from(std::path::absolute(&common.data)?)
    };
    Ok((data, settings))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| CliError::Argument(format!("'{}' is not a file path", path.display())))
}

fn finish(workflow: Workflow, output: &Path) -> Result<()> {
    write_workflow(&workflow, output)?;
    println!(
        "✓ Workflow '{}' ({} firework(s)) written to: {}",
        workflow.name(),
        workflow.len(),
        output.display()
    );
    Ok(())
}
