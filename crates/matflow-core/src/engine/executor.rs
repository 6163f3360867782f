use super::error::EngineError;
use super::worker::Worker;
use crate::core::io::incar::Incar;
use crate::core::io::poscar::{kpoints_string, poscar_string};
use crate::core::models::task::{IncarParams, Task};
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

const INCAR_TOLERANCE: f64 = 1e-8;
const COORD_TOLERANCE: f64 = 1e-6;

/// Runs one task inside `launch_dir`.
pub(crate) fn execute_task(
    task: &Task,
    launch_dir: &Path,
    worker: &Worker,
) -> Result<(), EngineError> {
    debug!("Executing {} in {:?}", task, launch_dir);
    match task {
        Task::FileWrite {
            files_to_write,
            dest,
            ..
        } => {
            let dir = match dest {
                Some(d) => launch_dir.join(d),
                None => launch_dir.to_path_buf(),
            };
            std::fs::create_dir_all(&dir).map_err(|e| EngineError::io(&dir, e))?;
            for file in files_to_write {
                let path = dir.join(&file.filename);
                std::fs::write(&path, &file.contents).map_err(|e| EngineError::io(&path, e))?;
            }
            Ok(())
        }
        Task::WriteLammpsInput {
            lammps_input,
            input_file,
            ..
        } => {
            lammps_input.write_to_dir(launch_dir, input_file)?;
            Ok(())
        }
        Task::WriteVaspFromIoSet {
            structure,
            vasp_input_set,
            ..
        } => {
            Incar::new(vasp_input_set.incar.clone()).write_to_path(&launch_dir.join("INCAR"))?;
            write_text(
                &launch_dir.join("POSCAR"),
                &poscar_string(structure, &structure.formula()),
            )?;
            write_text(
                &launch_dir.join("KPOINTS"),
                &kpoints_string(vasp_input_set.kpoints_grid(structure)),
            )
        }
        Task::ModifyIncar {
            key_update,
            key_multiply,
            input_filename,
            output_filename,
            ..
        } => {
            let mut incar = Incar::read_from_path(&launch_dir.join(input_filename))?;
            if let Some(update) = key_update {
                incar.update(&update.resolve(&worker.env)?);
            }
            if let Some(factors) = key_multiply {
                incar.multiply(&factors.resolve(&worker.env)?)?;
            }
            incar.write_to_path(&launch_dir.join(output_filename))?;
            Ok(())
        }
        Task::RunVaspDirect { vasp_cmd, .. } => run_command(vasp_cmd, launch_dir, "vasp.out"),
        Task::RunLammpsDirect { lammps_cmd, .. } => {
            run_command(lammps_cmd, launch_dir, "lammps.out")
        }
        Task::RunVaspFake { fake_dir, .. } => replay_vasp_run(fake_dir, launch_dir),
        Task::RunVaspCustodian { .. } | Task::Other(_) => Err(EngineError::Unsupported {
            task: task.name().to_string(),
        }),
    }
}

fn write_text(path: &Path, text: &str) -> Result<(), EngineError> {
    std::fs::write(path, text).map_err(|e| EngineError::io(path, e))
}

fn run_command(command: &str, dir: &Path, stdout_name: &str) -> Result<(), EngineError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(EngineError::EmptyCommand)?;
    let stdout_path = dir.join(stdout_name);
    let stdout = File::create(&stdout_path).map_err(|e| EngineError::io(&stdout_path, e))?;

    info!("Running '{}' in {:?}", command, dir);
    let status = Command::new(program)
        .args(parts)
        .current_dir(dir)
        .stdout(Stdio::from(stdout))
        .status()
        .map_err(|e| EngineError::io(Path::new(program), e))?;
    if !status.success() {
        return Err(EngineError::CommandFailed {
            command: command.to_string(),
            status: status.code(),
        });
    }
    Ok(())
}

/// Checks the launch inputs against `<fake_dir>/inputs` and copies
/// `<fake_dir>/outputs` into the launch directory.
///
/// Only INCAR tags present in the reference are compared; POSCAR and KPOINTS are
/// compared token by token (numbers within tolerance) after their comment line.
fn replay_vasp_run(fake_dir: &Path, launch_dir: &Path) -> Result<(), EngineError> {
    let inputs = fake_dir.join("inputs");

    let ref_incar_path = inputs.join("INCAR");
    if ref_incar_path.exists() {
        let reference = Incar::read_from_path(&ref_incar_path)?;
        let actual = Incar::read_from_path(&launch_dir.join("INCAR"))?;
        check_incar(reference.params(), actual.params())?;
    }
    for name in ["POSCAR", "KPOINTS"] {
        let ref_path = inputs.join(name);
        if ref_path.exists() {
            let expected = read_text(&ref_path)?;
            let actual = read_text(&launch_dir.join(name))?;
            if !same_tokens(&expected, &actual) {
                return Err(EngineError::ReplayMismatch {
                    file: name.to_string(),
                    detail: format!("launch {name} differs from {:?}", ref_path),
                });
            }
        }
    }

    let outputs = fake_dir.join("outputs");
    let entries = std::fs::read_dir(&outputs).map_err(|e| EngineError::io(&outputs, e))?;
    let mut copied = 0;
    for entry in entries {
        let path = entry.map_err(|e| EngineError::io(&outputs, e))?.path();
        if path.is_file()
            && let Some(name) = path.file_name()
        {
            let target = launch_dir.join(name);
            std::fs::copy(&path, &target).map_err(|e| EngineError::io(&path, e))?;
            copied += 1;
        }
    }
    info!("Replayed VASP run from {:?} ({} file(s)).", fake_dir, copied);
    Ok(())
}

fn read_text(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))
}

fn check_incar(reference: &IncarParams, actual: &IncarParams) -> Result<(), EngineError> {
    for (key, expected) in reference {
        let found = actual.get(key);
        let matches = match (expected, found) {
            (Value::Number(a), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => (x - y).abs() <= INCAR_TOLERANCE * x.abs().max(1.0),
                _ => false,
            },
            (_, Some(v)) => v == expected,
            (_, None) => false,
        };
        if !matches {
            return Err(EngineError::ReplayMismatch {
                file: "INCAR".to_string(),
                detail: format!("{key}: expected {expected}, found {found:?}"),
            });
        }
    }
    Ok(())
}

fn same_tokens(expected: &str, actual: &str) -> bool {
    let body = |s: &str| -> Vec<String> {
        s.lines()
            .skip(1)
            .flat_map(|l| l.split_whitespace())
            .map(str::to_string)
            .collect()
    };
    let (a, b) = (body(expected), body(actual));
    a.len() == b.len()
        && a.iter().zip(&b).all(|(x, y)| {
            match (x.parse::<f64>(), y.parse::<f64>()) {
                (Ok(p), Ok(q)) => (p - q).abs() <= COORD_TOLERANCE,
                _ => x.eq_ignore_ascii_case(y),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::input_set::VaspInputSet;
    use crate::core::models::structure::fixtures::silicon;
    use crate::core::models::task::FileToWrite;
    use crate::core::utils::env::EnvChk;
    use crate::workflows::config::CustodianParams;
    use serde_json::{Map, json};
    use std::path::PathBuf;

    fn write_inputs(dir: &Path) {
        execute_task(
            &Task::WriteVaspFromIoSet {
                structure: silicon(),
                vasp_input_set: VaspInputSet::mp_relax(),
                extra: Map::new(),
            },
            dir,
            &Worker::default(),
        )
        .unwrap();
    }

    fn fake_dir_from(launch: &Path) -> tempfile::TempDir {
        let fake = tempfile::tempdir().unwrap();
        let inputs = fake.path().join("inputs");
        let outputs = fake.path().join("outputs");
        std::fs::create_dir_all(&inputs).unwrap();
        std::fs::create_dir_all(&outputs).unwrap();
        for name in ["INCAR", "POSCAR", "KPOINTS"] {
            std::fs::copy(launch.join(name), inputs.join(name)).unwrap();
        }
        std::fs::write(outputs.join("OUTCAR"), "reached required accuracy\n").unwrap();
        std::fs::write(outputs.join("OSZICAR"), "1 F= -.10E+02\n").unwrap();
        fake
    }

    #[test]
    fn file_write_honors_destination() {
        let dir = tempfile::tempdir().unwrap();
        let task = Task::FileWrite {
            files_to_write: vec![FileToWrite {
                filename: "note.txt".into(),
                contents: "hello".into(),
            }],
            dest: Some("sub".into()),
            extra: Map::new(),
        };
        execute_task(&task, dir.path(), &Worker::default()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("sub/note.txt")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn vasp_inputs_are_written() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let incar = Incar::read_from_path(&dir.path().join("INCAR")).unwrap();
        assert_eq!(incar.get("NSW"), Some(&json!(99)));
        let kpoints = std::fs::read_to_string(dir.path().join("KPOINTS")).unwrap();
        assert!(kpoints.contains("7 7 7"));
        assert!(dir.path().join("POSCAR").exists());
    }

    #[test]
    fn modify_incar_resolves_worker_env() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let worker = Worker::default().with_env("incar_update", json!({"NCORE": 8}));
        let task = Task::ModifyIncar {
            key_update: Some(EnvChk::reference("incar_update")),
            key_multiply: Some(EnvChk::Value([("ENCUT".to_string(), json!(2))].into())),
            input_filename: "INCAR".into(),
            output_filename: "INCAR".into(),
            extra: Map::new(),
        };
        execute_task(&task, dir.path(), &worker).unwrap();

        let incar = Incar::read_from_path(&dir.path().join("INCAR")).unwrap();
        assert_eq!(incar.get("NCORE"), Some(&json!(8)));
        assert_eq!(incar.get("ENCUT"), Some(&json!(1040)));
    }

    #[test]
    fn replay_copies_outputs_when_inputs_match() {
        let launch = tempfile::tempdir().unwrap();
        write_inputs(launch.path());
        let fake = fake_dir_from(launch.path());

        let task = Task::run_vasp_fake(fake.path());
        execute_task(&task, launch.path(), &Worker::default()).unwrap();
        assert!(launch.path().join("OUTCAR").exists());
        assert!(launch.path().join("OSZICAR").exists());
    }

    #[test]
    fn replay_rejects_changed_incar() {
        let launch = tempfile::tempdir().unwrap();
        write_inputs(launch.path());
        let fake = fake_dir_from(launch.path());
        std::fs::write(launch.path().join("INCAR"), "NSW = 0\n").unwrap();

        let err = replay_vasp_run(fake.path(), launch.path()).unwrap_err();
        assert!(matches!(err, EngineError::ReplayMismatch { file, .. } if file == "INCAR"));
    }

    #[test]
    fn replay_rejects_changed_structure() {
        let launch = tempfile::tempdir().unwrap();
        write_inputs(launch.path());
        let fake = fake_dir_from(launch.path());
        let poscar = std::fs::read_to_string(launch.path().join("POSCAR")).unwrap();
        std::fs::write(launch.path().join("POSCAR"), poscar.replace("0.75", "0.70")).unwrap();

        let err = replay_vasp_run(fake.path(), launch.path()).unwrap_err();
        assert!(matches!(err, EngineError::ReplayMismatch { file, .. } if file == "POSCAR"));
    }

    #[test]
    fn custodian_is_not_replayable() {
        let dir = tempfile::tempdir().unwrap();
        let task = CustodianParams::default().to_task("vasp".into());
        assert!(matches!(
            execute_task(&task, dir.path(), &Worker::default()),
            Err(EngineError::Unsupported { task }) if task == "RunVaspCustodian"
        ));
    }

    #[test]
    fn foreign_tasks_are_not_executed() {
        let dir = tempfile::tempdir().unwrap();
        let task: Task = serde_json::from_value(json!({
            "_fw_name": "{{atomate.vasp.firetasks.parse_outputs.VaspToDb}}",
            "db_file": ">>db_file<<"
        }))
        .unwrap();
        let err = execute_task(&task, dir.path(), &Worker::default()).unwrap_err();
        assert!(matches!(
            &err,
            EngineError::Unsupported { task } if task.ends_with("parse_outputs.VaspToDb}}")
        ));
        assert!(err.to_string().contains("cannot run on the replay backend"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let task = Task::run_lammps_direct("   ");
        assert!(matches!(
            execute_task(&task, dir.path(), &Worker::default()),
            Err(EngineError::EmptyCommand)
        ));
    }

    #[test]
    fn missing_replay_outputs_is_an_io_error() {
        let launch = tempfile::tempdir().unwrap();
        let err = replay_vasp_run(&PathBuf::from("/no/such/fake"), launch.path()).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
