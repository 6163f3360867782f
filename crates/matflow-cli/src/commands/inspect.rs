use super::read_workflow;
use crate::cli::InspectArgs;
use crate::error::Result;
use matflow::core::models::workflow::Workflow;
use matflow::workflows::powerups::find_vasp_run_tasks;
use std::fmt::Write as _;

pub fn run(args: InspectArgs) -> Result<()> {
    let workflow = read_workflow(&args.input)?;
    print!("{}", summary(&workflow)?);
    Ok(())
}

/// Human-readable overview: fireworks in execution order, then the VASP run
/// tasks the powerups would act on.
fn summary(workflow: &Workflow) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Workflow '{}' ({} firework(s))",
        workflow.name(),
        workflow.len()
    );

    for fw_id in workflow.topological_order()? {
        let Some(index) = workflow.index_of(fw_id) else {
            continue;
        };
        let fw = &workflow.fws()[index];
        let priority = fw
            .priority()
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let _ = writeln!(out, "  [{}] {} (priority {})", fw.fw_id, fw.name, priority);
        for (i, task) in fw.tasks().iter().enumerate() {
            let _ = writeln!(out, "      {i}: {task}");
        }
        if !fw.trackers().is_empty() {
            let files: Vec<&str> = fw.trackers().iter().map(|t| t.filename.as_str()).collect();
            let _ = writeln!(out, "      trackers: {}", files.join(", "));
        }
        let children = workflow.children(fw.fw_id);
        if !children.is_empty() {
            let ids: Vec<String> = children.iter().map(|c| c.to_string()).collect();
            let _ = writeln!(out, "      -> {}", ids.join(", "));
        }
    }

    let matches = find_vasp_run_tasks(workflow);
    let _ = writeln!(out, "VASP run task matches: {}", matches.len());
    for (idx_fw, idx_t) in matches {
        let fw = &workflow.fws()[idx_fw];
        let _ = writeln!(
            out,
            "  {} task {}: {}",
            fw.name,
            idx_t,
            fw.tasks()[idx_t]
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use matflow::core::models::structure::Structure;
    use matflow::workflows::powerups::{add_trackers, decorate_priority};
    use matflow::workflows::vasp::basic_vasp_workflow;

    #[test]
    fn summary_lists_fireworks_links_and_matches() {
        let si = Structure::new(
            [[3.84, 0.0, 0.0], [0.0, 3.84, 0.0], [0.0, 0.0, 3.84]],
            &["Si"],
            &[[0.0, 0.0, 0.0]],
        )
        .unwrap();
        let wf = basic_vasp_workflow(&si, "vasp_std").unwrap();
        let wf = add_trackers(decorate_priority(wf, 3, Some(1)));

        let text = summary(&wf).unwrap();
        assert!(text.starts_with("Workflow 'Si basic workflow' (2 firework(s))\n"));
        assert!(text.contains("  [-1] Si-structure optimization (priority 3)\n"));
        assert!(text.contains("  [-2] Si-static (priority 1)\n"));
        assert!(text.contains("      1: RunVaspDirect\n"));
        assert!(text.contains("      trackers: OUTCAR, OSZICAR\n"));
        assert!(text.contains("      -> -2\n"));
        assert!(text.contains("VASP run task matches: 2\n"));
        assert!(text.contains("  Si-static task 1: RunVaspDirect\n"));
    }

    #[test]
    fn foreign_tasks_are_listed_but_never_matched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.json");
        let doc = serde_json::json!({
            "fws": [{
                "fw_id": 1,
                "name": "Si-static",
                "spec": {"_tasks": [
                    {"_fw_name": "RunVaspDirect", "vasp_cmd": "vasp"},
                    {"_fw_name": "VaspToDbTask", "db_file": ">>db_file<<"}
                ]}
            }],
            "name": "with db"
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let wf = read_workflow(&path).unwrap();
        let text = summary(&wf).unwrap();
        assert!(text.contains("      1: VaspToDbTask\n"));
        assert!(text.contains("VASP run task matches: 1\n"));
    }
}
