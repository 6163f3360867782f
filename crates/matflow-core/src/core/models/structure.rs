use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StructureError {
    #[error("Species count ({species}) does not match coordinate count ({coords})")]
    SiteCountMismatch { species: usize, coords: usize },
    #[error("Lattice is singular (zero volume)")]
    SingularLattice,
    #[error("Lattice has non-finite entries")]
    NonFiniteLattice,
    #[error("Structure has no sites")]
    Empty,
}

/// One atomic site: an element symbol and fractional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub species: String,
    pub frac_coords: Vector3<f64>,
}

/// A periodic crystal structure.
///
/// Lattice rows are the lattice vectors in Angstrom. Deserialized structures go
/// through the same checks as [`Structure::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStructure")]
pub struct Structure {
    #[serde(serialize_with = "serialize_lattice_rows")]
    lattice: Matrix3<f64>,
    sites: Vec<Site>,
}

#[derive(Deserialize)]
struct RawStructure {
    lattice: [[f64; 3]; 3],
    sites: Vec<Site>,
}

impl TryFrom<RawStructure> for Structure {
    type Error = StructureError;

    fn try_from(raw: RawStructure) -> Result<Self, Self::Error> {
        Self::checked(lattice_from_rows(raw.lattice), raw.sites)
    }
}

fn lattice_from_rows(rows: [[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_rows(&rows.map(|row| Vector3::from(row).transpose()))
}

fn serialize_lattice_rows<S: Serializer>(m: &Matrix3<f64>, s: S) -> Result<S::Ok, S::Error> {
    let rows: [[f64; 3]; 3] = [0, 1, 2].map(|i| [m[(i, 0)], m[(i, 1)], m[(i, 2)]]);
    rows.serialize(s)
}

impl Structure {
    pub fn new(
        lattice: [[f64; 3]; 3],
        species: &[&str],
        frac_coords: &[[f64; 3]],
    ) -> Result<Self, StructureError> {
        if species.len() != frac_coords.len() {
            return Err(StructureError::SiteCountMismatch {
                species: species.len(),
                coords: frac_coords.len(),
            });
        }
        let sites = species
            .iter()
            .zip(frac_coords)
            .map(|(s, c)| Site {
                species: (*s).to_string(),
                frac_coords: Vector3::from(*c),
            })
            .collect();
        Self::checked(lattice_from_rows(lattice), sites)
    }

    fn checked(lattice: Matrix3<f64>, sites: Vec<Site>) -> Result<Self, StructureError> {
        if sites.is_empty() {
            return Err(StructureError::Empty);
        }
        if lattice.iter().any(|x| !x.is_finite()) {
            return Err(StructureError::NonFiniteLattice);
        }
        if lattice.determinant().abs() < f64::EPSILON {
            return Err(StructureError::SingularLattice);
        }
        Ok(Self { lattice, sites })
    }

    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn volume(&self) -> f64 {
        self.lattice.determinant().abs()
    }

    /// Lengths of the three lattice vectors.
    pub fn lattice_lengths(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| self.lattice.row(i).norm())
    }

    pub fn cart_coords(&self, site: &Site) -> Vector3<f64> {
        self.lattice.transpose() * site.frac_coords
    }

    /// Species with their counts, in order of first appearance.
    pub fn composition(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for site in &self.sites {
            match counts.iter_mut().find(|(s, _)| *s == site.species) {
                Some((_, n)) => *n += 1,
                None => counts.push((site.species.clone(), 1)),
            }
        }
        counts
    }

    /// Chemical formula such as `Si2` or `Fe2O3`.
    pub fn formula(&self) -> String {
        self.composition()
            .into_iter()
            .map(|(s, n)| if n == 1 { s } else { format!("{s}{n}") })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::silicon;
    use super::*;

    #[test]
    fn formula_groups_species() {
        assert_eq!(silicon().formula(), "Si2");
        let fe2o3 = Structure::new(
            [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]],
            &["Fe", "O", "Fe", "O", "O"],
            &[[0.0; 3], [0.1; 3], [0.2; 3], [0.3; 3], [0.4; 3]],
        )
        .unwrap();
        assert_eq!(fe2o3.formula(), "Fe2O3");
    }

    #[test]
    fn volume_matches_determinant() {
        let s = silicon();
        let expected = 3.8401979337 * 3.3257101909 * 3.1355090603;
        assert!((s.volume() - expected).abs() < 1e-6);
    }

    #[test]
    fn mismatched_sites_are_rejected() {
        let err = Structure::new(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &["Si"],
            &[[0.0; 3], [0.5; 3]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            StructureError::SiteCountMismatch {
                species: 1,
                coords: 2
            }
        );
    }

    #[test]
    fn lattice_serializes_as_rows() {
        let s = silicon();
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["lattice"][1][1], serde_json::json!(3.3257101909));
        let back: Structure = serde_json::from_value(value).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn cartesian_coordinates_use_lattice_rows() {
        let s = silicon();
        let cart = s.cart_coords(&s.sites()[1]);
        let expected_x = 0.75 * 3.8401979337 + 0.5 * 1.9200989668;
        assert!((cart.x - expected_x).abs() < 1e-9);
    }

    #[test]
    fn deserializing_checks_the_lattice() {
        let mut value = serde_json::to_value(silicon()).unwrap();
        value["lattice"][2] = serde_json::json!([0.0, 0.0, 0.0]);
        let err = serde_json::from_value::<Structure>(value.clone()).unwrap_err();
        assert!(err.to_string().contains("singular"));

        value["lattice"] = serde_json::json!([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        value["sites"] = serde_json::json!([]);
        let err = serde_json::from_value::<Structure>(value).unwrap_err();
        assert!(err.to_string().contains("no sites"));
    }
}
