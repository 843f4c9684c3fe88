/// Official document identifier: `<prefix>-<seq:02>/<yy>`, e.g. `14-03/24`.
///
/// Fully determined by (`seq`, `year`) for a given association prefix.
pub fn format_doc_number(prefix: &str, seq: u32, year: i32) -> String {
    format!("{}-{:02}/{:02}", prefix, seq, year.rem_euclid(100))
}
