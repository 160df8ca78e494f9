//! Canonicalisation of typed-dependency relation labels into argument roles.

/// Raw relations that never bind an argument to an event.
const UNBINDABLE: &[&str] = &[
    "det", "predet", "quantmod", "tmod", "num", "number", "cc", "rel", "rcmod", "ccomp", "cop",
    "aux", "auxpass", "prt",
];

/// Map a raw grammatical relation onto the small role vocabulary
/// (`s`, `o`, `p`/`p_<type>`, `conj`, `comp`, `mod`, or the raw label).
///
/// Rules are applied in order; the first one that matches wins. Passive
/// subjects (`nsubjpass`) are objects.
pub fn normalize_relation(raw: &str, full_prep: bool) -> String {
    if raw.chars().count() == 1 {
        return raw.to_string();
    }
    if raw.contains("conj") {
        return "conj".to_string();
    }
    if raw.contains("comp") && raw != "complm" {
        return "comp".to_string();
    }
    if raw.contains("mod") && !matches!(raw, "advmod" | "tmod" | "quantmod") {
        return "mod".to_string();
    }
    if (raw.contains("subj") && !raw.contains("pass"))
        || raw.starts_with('s')
        || raw.starts_with('S')
        || raw == "agent"
    {
        return "s".to_string();
    }
    if raw.starts_with("prep") || raw.starts_with("pp") || raw == "PPOBJ" {
        if full_prep {
            if let Some((_, suffix)) = raw.split_once('_') {
                if !suffix.is_empty() {
                    return format!("p_{suffix}");
                }
            }
        }
        return "p".to_string();
    }
    if raw.ends_with("obj") || raw == "nsubjpass" {
        return "o".to_string();
    }
    raw.to_string()
}

/// Whether a raw relation may bind an entity argument to its governor.
///
/// Determiners, quantifiers, temporal and numeric modifiers, conjunctions,
/// relative and complement clauses, copulas and auxiliaries are excluded.
pub fn is_bindable(raw: &str) -> bool {
    !(UNBINDABLE.contains(&raw) || raw.starts_with("conj"))
}
