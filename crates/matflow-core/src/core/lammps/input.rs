use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Commands that must precede `read_data` in an input file.
const SETUP_COMMANDS: &[&str] = &["log", "units", "atom_style", "dimension", "boundary"];

#[derive(Debug, Error)]
pub enum LammpsError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON template error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("TOML template error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Template '{path}' must be a table of LAMMPS commands")]
    NotATable { path: String },
}

/// Where the LAMMPS data file comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LammpsData {
    /// An existing data file, copied next to the input file.
    File { path: PathBuf },
    /// Data file contents held in memory.
    Inline { contents: String },
}

impl From<PathBuf> for LammpsData {
    fn from(path: PathBuf) -> Self {
        LammpsData::File { path }
    }
}

/// A LAMMPS input: ordered commands plus the data file they read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LammpsInput {
    pub job_name: String,
    pub settings: Map<String, Value>,
    pub data: LammpsData,
    pub data_filename: String,
    /// Whether the data file already carries force-field coefficients.
    pub is_forcefield: bool,
}

impl LammpsInput {
    /// Builds an input from an in-memory template and user overrides.
    ///
    /// Overrides replace template values in place and append new commands.
    pub fn from_template(
        job_name: impl Into<String>,
        template: Map<String, Value>,
        data: LammpsData,
        data_filename: impl Into<String>,
        user_settings: &Map<String, Value>,
        is_forcefield: bool,
    ) -> Self {
        let mut settings = template;
        for (key, value) in user_settings {
            settings.insert(key.clone(), value.clone());
        }
        Self {
            job_name: job_name.into(),
            settings,
            data,
            data_filename: data_filename.into(),
            is_forcefield,
        }
    }

    /// Reads a template file: `.toml` files as TOML, everything else as JSON.
    pub fn from_template_file(
        job_name: impl Into<String>,
        template_path: &Path,
        data: LammpsData,
        data_filename: impl Into<String>,
        user_settings: &Map<String, Value>,
        is_forcefield: bool,
    ) -> Result<Self, LammpsError> {
        let template = load_template(template_path)?;
        debug!(
            "Loaded LAMMPS template {:?} with {} command(s).",
            template_path,
            template.len()
        );
        Ok(Self::from_template(
            job_name,
            template,
            data,
            data_filename,
            user_settings,
            is_forcefield,
        ))
    }

    /// Canned constant-volume, constant-temperature (Nose-Hoover) template at 300 K.
    pub fn nvt(
        data: LammpsData,
        data_filename: impl Into<String>,
        user_settings: &Map<String, Value>,
        is_forcefield: bool,
    ) -> Self {
        Self::from_template(
            "nvt",
            nvt_template(),
            data,
            data_filename,
            user_settings,
            is_forcefield,
        )
    }

    /// Renders the input file text, one command per line.
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n", self.job_name);
        let mut data_written = false;
        for (command, value) in &self.settings {
            if command == "read_data" {
                if !data_written {
                    push_line(&mut out, command, &self.data_filename);
                    data_written = true;
                }
                continue;
            }
            if !data_written && !SETUP_COMMANDS.contains(&command.as_str()) {
                push_line(&mut out, "read_data", &self.data_filename);
                data_written = true;
            }
            match value {
                Value::Array(items) => {
                    for item in items {
                        push_line(&mut out, command, &render_value(item));
                    }
                }
                other => push_line(&mut out, command, &render_value(other)),
            }
        }
        if !data_written {
            push_line(&mut out, "read_data", &self.data_filename);
        }
        out
    }

    /// Writes the input file and the data file into `dir`.
    pub fn write_to_dir(&self, dir: &Path, input_file: &str) -> Result<PathBuf, LammpsError> {
        let input_path = dir.join(input_file);
        std::fs::write(&input_path, self.render()).map_err(|e| io_error(&input_path, e))?;

        let data_path = dir.join(&self.data_filename);
        match &self.data {
            LammpsData::File { path } => {
                if path != &data_path {
                    std::fs::copy(path, &data_path).map_err(|e| io_error(path, e))?;
                }
            }
            LammpsData::Inline { contents } => {
                std::fs::write(&data_path, contents).map_err(|e| io_error(&data_path, e))?;
            }
        }
        Ok(input_path)
    }
}

fn load_template(path: &Path) -> Result<Map<String, Value>, LammpsError> {
    let display = path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let value: Value = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|source| LammpsError::Toml {
            path: display.clone(),
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|source| LammpsError::Json {
            path: display.clone(),
            source,
        })?
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(LammpsError::NotATable { path: display }),
    }
}

fn nvt_template() -> Map<String, Value> {
    let commands = [
        ("log", json!("log.lammps")),
        ("units", json!("real")),
        ("atom_style", json!("full")),
        ("dimension", json!(3)),
        ("boundary", json!("p p p")),
        ("read_data", json!("in.data")),
        ("pair_style", json!("lj/cut/coul/long 10.0")),
        ("kspace_style", json!("pppm 1.0e-4")),
        ("neighbor", json!("2.0 bin")),
        ("neigh_modify", json!("delay 0 every 1 check yes")),
        ("velocity", json!("all create 300.0 4928459 rot yes dist gaussian")),
        ("timestep", json!(1.0)),
        ("thermo_style", json!("custom step temp press etotal pe ke")),
        ("thermo", json!(100)),
        ("fix", json!("1 all nvt temp 300.0 300.0 100.0")),
        ("dump", json!("1 all custom 1000 nvt.dump id type x y z")),
        ("run", json!(10000)),
    ];
    commands
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(" "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k} {}", render_value(v)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn push_line(out: &mut String, command: &str, args: &str) {
    if args.is_empty() {
        let _ = writeln!(out, "{command}");
    } else {
        let _ = writeln!(out, "{command:<16}{args}");
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LammpsError {
    LammpsError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_data() -> LammpsData {
        LammpsData::Inline {
            contents: "LAMMPS data\n\n2 atoms\n".into(),
        }
    }

    #[test]
    fn nvt_render_points_read_data_at_data_file() {
        let input = LammpsInput::nvt(inline_data(), "nvt.data", &Map::new(), true);
        let text = input.render();
        assert!(text.contains("read_data       nvt.data\n"));
        assert!(!text.contains("in.data"));
        let read_pos = text.find("read_data").unwrap();
        assert!(text.find("boundary").unwrap() < read_pos);
        assert!(read_pos < text.find("pair_style").unwrap());
    }

    #[test]
    fn user_settings_override_in_place_and_append() {
        let mut user = Map::new();
        user.insert("run".into(), json!(500));
        user.insert("restart".into(), json!("1000 nvt.restart"));
        let input = LammpsInput::nvt(inline_data(), "in.data", &user, false);

        let keys: Vec<&String> = input.settings.keys().collect();
        assert_eq!(keys[keys.len() - 2], "run");
        assert_eq!(keys[keys.len() - 1], "restart");
        assert!(input.render().contains("run             500\n"));
    }

    #[test]
    fn list_values_repeat_the_command() {
        let mut template = Map::new();
        template.insert("units".into(), json!("metal"));
        template.insert("fix".into(), json!(["1 all nve", "2 all langevin 300 300 100 48279"]));
        let no_settings = Map::new();
        let input = LammpsInput::from_template(
            "md",
            template,
            inline_data(),
            "md.data",
            &no_settings,
            true,
        );
        let text = input.render();
        assert_eq!(text.matches("\nfix ").count(), 2);
        // read_data is inserted after the setup commands when the template omits it.
        assert!(text.find("read_data").unwrap() < text.find("fix").unwrap());
        assert!(text.find("units").unwrap() < text.find("read_data").unwrap());
    }

    #[test]
    fn template_files_load_as_json_or_toml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("npt.json");
        std::fs::write(&json_path, r#"{"units": "real", "run": 100}"#).unwrap();
        let toml_path = dir.path().join("npt.toml");
        std::fs::write(&toml_path, "units = \"real\"\nrun = 100\n").unwrap();

        for path in [&json_path, &toml_path] {
            let input = LammpsInput::from_template_file(
                "npt",
                path,
                inline_data(),
                "in.data",
                &Map::new(),
                true,
            )
            .unwrap();
            assert_eq!(input.settings["run"], json!(100));
        }
    }

    #[test]
    fn non_table_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let no_settings = Map::new();
        let err = LammpsInput::from_template_file(
            "bad",
            &path,
            inline_data(),
            "in.data",
            &no_settings,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, LammpsError::NotATable { .. }));
    }

    #[test]
    fn missing_template_propagates_io_error() {
        let err = LammpsInput::from_template_file(
            "missing",
            Path::new("/definitely/not/here.json"),
            inline_data(),
            "in.data",
            &Map::new(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, LammpsError::Io { .. }));
    }

    #[test]
    fn write_to_dir_emits_input_and_data() {
        let src = tempfile::tempdir().unwrap();
        let data_src = src.path().join("source.data");
        std::fs::write(&data_src, "data body").unwrap();

        let out = tempfile::tempdir().unwrap();
        let input = LammpsInput::nvt(data_src.into(), "in.data", &Map::new(), true);
        let input_path = input.write_to_dir(out.path(), "nvt.inp").unwrap();

        assert!(std::fs::read_to_string(input_path).unwrap().contains("fix"));
        assert_eq!(
            std::fs::read_to_string(out.path().join("in.data")).unwrap(),
            "data body"
        );
    }
}
