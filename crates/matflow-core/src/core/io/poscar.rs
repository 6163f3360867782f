use crate::core::models::structure::Structure;
use std::fmt::Write as _;

/// Renders a structure as a VASP 5 POSCAR with direct coordinates.
///
/// Sites are grouped by species in order of first appearance, matching the
/// species/count header lines.
pub fn poscar_string(structure: &Structure, comment: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{comment}");
    let _ = writeln!(out, "1.0");
    let lattice = structure.lattice();
    for i in 0..3 {
        let _ = writeln!(
            out,
            "  {:>16.10} {:>16.10} {:>16.10}",
            lattice[(i, 0)],
            lattice[(i, 1)],
            lattice[(i, 2)]
        );
    }

    let composition = structure.composition();
    let species: Vec<&str> = composition.iter().map(|(s, _)| s.as_str()).collect();
    let counts: Vec<String> = composition.iter().map(|(_, n)| n.to_string()).collect();
    let _ = writeln!(out, "{}", species.join(" "));
    let _ = writeln!(out, "{}", counts.join(" "));
    let _ = writeln!(out, "Direct");
    for symbol in &species {
        for site in structure.sites().iter().filter(|s| s.species == *symbol) {
            let c = site.frac_coords;
            let _ = writeln!(out, "  {:>14.10} {:>14.10} {:>14.10} {}", c.x, c.y, c.z, symbol);
        }
    }
    out
}

/// Renders a Gamma-centered automatic KPOINTS file.
pub fn kpoints_string(grid: [u32; 3]) -> String {
    format!(
        "Automatic mesh\n0\nGamma\n{} {} {}\n0 0 0\n",
        grid[0], grid[1], grid[2]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::fixtures::silicon;

    #[test]
    fn poscar_has_header_species_and_direct_block() {
        let text = poscar_string(&silicon(), "Si2");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Si2");
        assert_eq!(lines[1], "1.0");
        assert_eq!(lines[5], "Si");
        assert_eq!(lines[6], "2");
        assert_eq!(lines[7], "Direct");
        assert_eq!(lines.len(), 10);
        assert!(lines[9].trim_start().starts_with("0.75"));
    }

    #[test]
    fn kpoints_lists_grid() {
        assert_eq!(
            kpoints_string([4, 4, 2]),
            "Automatic mesh\n0\nGamma\n4 4 2\n0 0 0\n"
        );
    }
}
