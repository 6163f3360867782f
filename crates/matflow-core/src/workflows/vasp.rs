use crate::core::models::error::ModelError;
use crate::core::models::firework::Firework;
use crate::core::models::input_set::VaspInputSet;
use crate::core::models::structure::Structure;
use crate::core::models::task::Task;
use crate::core::models::workflow::{Links, Workflow};
use serde_json::Map;
use tracing::{debug, instrument};

/// Structure optimization followed by a static run on the relaxed cell.
///
/// Fireworks are named `<formula>-structure optimization` and
/// `<formula>-static`, which is what the powerups match on.
#[instrument(skip_all, name = "basic_vasp_workflow")]
pub fn basic_vasp_workflow(structure: &Structure, vasp_cmd: &str) -> Result<Workflow, ModelError> {
    let formula = structure.formula();
    debug!("Building basic VASP workflow for {}", formula);

    let run = || Task::run_vasp_direct(vasp_cmd);
    let relax = Firework::new(
        -1,
        format!("{formula}-structure optimization"),
        vec![
            Task::WriteVaspFromIoSet {
                structure: structure.clone(),
                vasp_input_set: VaspInputSet::mp_relax(),
                extra: Map::new(),
            },
            run(),
        ],
    );
    let static_run = Firework::new(
        -2,
        format!("{formula}-static"),
        vec![
            Task::WriteVaspFromIoSet {
                structure: structure.clone(),
                vasp_input_set: VaspInputSet::mp_static(),
                extra: Map::new(),
            },
            run(),
        ],
    );
    Workflow::new(
        vec![relax, static_run],
        Links::from([(-1, vec![-2])]),
        format!("{formula} basic workflow"),
    )
}
