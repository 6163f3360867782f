use super::structure::Structure;
use super::task::IncarParams;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A named set of VASP parameters applied to any structure.
///
/// K-points are generated automatically from `kpoints_length` in the VASP
/// "fully automatic" sense: subdivisions along each reciprocal vector are
/// `max(1, round(length / |a_i|))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaspInputSet {
    pub name: String,
    pub incar: IncarParams,
    pub kpoints_length: f64,
}

impl VaspInputSet {
    pub fn new(name: impl Into<String>, incar: IncarParams, kpoints_length: f64) -> Self {
        Self {
            name: name.into(),
            incar,
            kpoints_length,
        }
    }

    /// Materials Project style relaxation parameters.
    pub fn mp_relax() -> Self {
        let incar = [
            ("ALGO", json!("Fast")),
            ("EDIFF", json!(1e-5)),
            ("ENCUT", json!(520)),
            ("IBRION", json!(2)),
            ("ISIF", json!(3)),
            ("ISMEAR", json!(-5)),
            ("ISPIN", json!(2)),
            ("LORBIT", json!(11)),
            ("LREAL", json!("Auto")),
            ("LWAVE", json!(false)),
            ("NELM", json!(100)),
            ("NSW", json!(99)),
            ("PREC", json!("Accurate")),
            ("SIGMA", json!(0.05)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self::new("MPRelaxSet", incar, 25.0)
    }

    /// Materials Project style static parameters: the relaxation set without ionic steps.
    pub fn mp_static() -> Self {
        let mut set = Self::mp_relax();
        set.name = "MPStaticSet".to_string();
        set.incar.insert("IBRION".into(), json!(-1));
        set.incar.insert("NSW".into(), json!(0));
        set.incar.insert("LCHARG".into(), json!(true));
        set.incar.insert("LAECHG".into(), json!(true));
        set.incar.remove("ISIF");
        set.kpoints_length = 40.0;
        set
    }

    pub fn kpoints_grid(&self, structure: &Structure) -> [u32; 3] {
        structure
            .lattice_lengths()
            .map(|a| ((self.kpoints_length / a).round() as u32).max(1))
    }
}
