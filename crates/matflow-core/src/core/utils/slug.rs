/// Makes a string safe to use as a file name.
///
/// Keeps ASCII letters, digits and `-_.() `, drops everything else, then turns
/// spaces into underscores: `"FW--Si-structure optimization"` becomes
/// `"FW--Si-structure_optimization"`.
pub fn slugify(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-_.() ".contains(*c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}
