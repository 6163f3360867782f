use crate::error::{CliError, Result};
use matflow::core::models::task::IncarParams;
use matflow::core::utils::env::EnvChk;
use matflow::workflows::config::{CustodianParams, FakeDirs, ModifyIncarParams};
use matflow::workflows::powerups::Powerup;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCustodianParams {
    vasp_cmd: Option<String>,
    job_type: Option<String>,
    handler_group: Option<String>,
    scratch_dir: Option<String>,
    gzip_output: Option<bool>,
    max_errors: Option<u32>,
}

impl From<PartialCustodianParams> for CustodianParams {
    fn from(p: PartialCustodianParams) -> Self {
        Self {
            vasp_cmd: p.vasp_cmd,
            job_type: p.job_type,
            handler_group: p.handler_group,
            scratch_dir: p.scratch_dir,
            gzip_output: p.gzip_output,
            max_errors: p.max_errors,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialModifyIncarParams {
    key_update: Option<EnvChk<IncarParams>>,
    key_multiply: Option<EnvChk<IncarParams>>,
    input_filename: Option<String>,
    output_filename: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
enum PartialPowerup {
    DecoratePriority {
        root_priority: i64,
        child_priority: Option<i64>,
    },
    UseCustodian {
        fw_name_filter: Option<String>,
        #[serde(default)]
        params: PartialCustodianParams,
    },
    UseFakeVasp {
        fake_dirs: BTreeMap<String, PathBuf>,
    },
    DecorateWriteName {
        use_slug: Option<bool>,
    },
    AddTrackers {},
    AddModifyIncar {
        fw_name_filter: Option<String>,
        params: PartialModifyIncarParams,
    },
    AddModifyIncarEnvchk {
        fw_name_filter: Option<String>,
    },
}

impl PartialPowerup {
    /// Relative fake-run directories are taken relative to `base_dir`.
    fn resolve(self, base_dir: &Path) -> Result<Powerup> {
        Ok(match self {
            PartialPowerup::DecoratePriority {
                root_priority,
                child_priority,
            } => Powerup::DecoratePriority {
                root_priority,
                child_priority,
            },
            PartialPowerup::UseCustodian {
                fw_name_filter,
                params,
            } => Powerup::UseCustodian {
                fw_name_filter,
                params: params.into(),
            },
            PartialPowerup::UseFakeVasp { fake_dirs } => {
                if fake_dirs.is_empty() {
                    return Err(CliError::Config(
                        "'use-fake-vasp' needs at least one entry in 'fake-dirs'".to_string(),
                    ));
                }
                let fake_dirs: FakeDirs = fake_dirs
                    .into_iter()
                    .map(|(label, dir)| {
                        let dir = if dir.is_relative() {
                            base_dir.join(dir)
                        } else {
                            dir
                        };
                        (label, dir)
                    })
                    .collect();
                Powerup::UseFakeVasp { fake_dirs }
            }
            PartialPowerup::DecorateWriteName { use_slug } => Powerup::DecorateWriteName {
                use_slug: use_slug.unwrap_or(true),
            },
            PartialPowerup::AddTrackers {} => Powerup::AddTrackers,
            PartialPowerup::AddModifyIncar {
                fw_name_filter,
                params,
            } => {
                if params.key_update.is_none() && params.key_multiply.is_none() {
                    return Err(CliError::Config(
                        "'add-modify-incar' needs 'key-update' or 'key-multiply' in its params"
                            .to_string(),
                    ));
                }
                Powerup::AddModifyIncar {
                    fw_name_filter,
                    params: ModifyIncarParams {
                        key_update: params.key_update,
                        key_multiply: params.key_multiply,
                        input_filename: params.input_filename,
                        output_filename: params.output_filename,
                    },
                }
            }
            PartialPowerup::AddModifyIncarEnvchk { fw_name_filter } => {
                Powerup::AddModifyIncarEnvChk { fw_name_filter }
            }
        })
    }
}

/// A powerup pipeline file: an ordered `[[powerup]]` array.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialPowerupPipeline {
    #[serde(default, rename = "powerup")]
    powerups: Vec<PartialPowerup>,
}

impl PartialPowerupPipeline {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading powerup pipeline from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        content.parse().map_err(|e: toml::de::Error| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn into_powerups(self, base_dir: &Path) -> Result<Vec<Powerup>> {
        if self.powerups.is_empty() {
            return Err(CliError::Config(
                "The pipeline does not contain any [[powerup]] entry.".to_string(),
            ));
        }
        self.powerups
            .into_iter()
            .map(|p| p.resolve(base_dir))
            .collect()
    }
}

impl std::str::FromStr for PartialPowerupPipeline {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
