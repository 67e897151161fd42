//! Human-readable names for chunk sources.

/// `"uploads/3__Annual Report.txt"` -> `"Annual Report"`.
///
/// Backslashes count as separators; a leading `<digits>__` is the upload
/// counter and is dropped.
pub fn normalize_source(source_id: &str) -> String {
    let path = source_id.replace('\\', "/");
    let base = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    match stem.split_once("__") {
        Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => stem.to_string(),
    }
}

/// Normalised names, first appearance kept.
pub fn dedup_sources<'a>(source_ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in source_ids {
        let name = normalize_source(id);
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_and_extension() {
        assert_eq!(normalize_source("/data/docs/france.txt"), "france");
        assert_eq!(normalize_source(r"C:\docs\notes.v2.pdf"), "notes.v2");
        assert_eq!(normalize_source("README"), "README");
        assert_eq!(normalize_source(".env"), ".env");
    }

    #[test]
    fn strips_numeric_upload_prefix_only() {
        assert_eq!(normalize_source("uploads/12__Annual Report.txt"), "Annual Report");
        assert_eq!(normalize_source("draft__plan.txt"), "draft__plan");
        assert_eq!(normalize_source("7__"), "7__");
    }

    #[test]
    fn dedup_keeps_first_appearance() {
        let ids = ["a/france.txt", "b/germany.md", "c/france.txt", "1__germany.txt"];
        assert_eq!(dedup_sources(ids), vec!["france", "germany"]);
    }
}
