/// Municipality registry for the Rogaland population dashboard.
///
/// Defines the canonical list of municipalities queried from SSB table
/// 01222, in the order SSB lists them. This is the single source of truth
/// for region codes; all other modules should reference municipalities
/// from here rather than hardcoding codes.

// ---------------------------------------------------------------------------
// Municipality metadata
// ---------------------------------------------------------------------------

/// A municipality as SSB identifies it in the `Region` dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Municipality {
    /// Region code in the `agg:KommSummer` grouping, e.g. `K-1103`.
    pub code: &'static str,
    pub name: &'static str,
}

/// Name of the county the registry covers. Used for the total row.
pub const REGION_NAME: &str = "Rogaland";

/// All municipalities of Rogaland (2020 municipal structure).
pub static MUNICIPALITY_REGISTRY: &[Municipality] = &[
    Municipality { code: "K-1101", name: "Eigersund" },
    Municipality { code: "K-1103", name: "Stavanger" },
    Municipality { code: "K-1106", name: "Haugesund" },
    Municipality { code: "K-1108", name: "Sandnes" },
    Municipality { code: "K-1111", name: "Sokndal" },
    Municipality { code: "K-1112", name: "Lund" },
    Municipality { code: "K-1114", name: "Bjerkreim" },
    Municipality { code: "K-1119", name: "Hå" },
    Municipality { code: "K-1120", name: "Klepp" },
    Municipality { code: "K-1121", name: "Time" },
    Municipality { code: "K-1122", name: "Gjesdal" },
    Municipality { code: "K-1124", name: "Sola" },
    Municipality { code: "K-1127", name: "Randaberg" },
    Municipality { code: "K-1130", name: "Strand" },
    Municipality { code: "K-1133", name: "Hjelmeland" },
    Municipality { code: "K-1134", name: "Suldal" },
    Municipality { code: "K-1135", name: "Sauda" },
    Municipality { code: "K-1144", name: "Kvitsøy" },
    Municipality { code: "K-1145", name: "Bokn" },
    Municipality { code: "K-1146", name: "Tysvær" },
    Municipality { code: "K-1149", name: "Karmøy" },
    Municipality { code: "K-1151", name: "Utsira" },
    Municipality { code: "K-1160", name: "Vindafjord" },
];

/// Returns the region codes for all municipalities, suitable for passing
/// directly to `ingest::ssb::build_query`.
pub fn all_codes() -> Vec<&'static str> {
    MUNICIPALITY_REGISTRY.iter().map(|m| m.code).collect()
}

/// Looks up a municipality by region code. Returns `None` if not found.
pub fn find_municipality(code: &str) -> Option<&'static Municipality> {
    MUNICIPALITY_REGISTRY.iter().find(|m| m.code == code)
}

/// Resolves user input to a municipality.
///
/// Accepts the region code (`K-1103`), the bare municipality number
/// (`1103`) or the name, case-insensitively (`stavanger`).
pub fn resolve(input: &str) -> Option<&'static Municipality> {
    let needle = input.trim();
    MUNICIPALITY_REGISTRY.iter().find(|m| {
        m.code.eq_ignore_ascii_case(needle)
            || m.code.trim_start_matches("K-") == needle
            || m.name.to_lowercase() == needle.to_lowercase()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_codes_are_valid_kommsummer_format() {
        // Codes in the agg:KommSummer grouping are "K-" plus a 4-digit
        // municipality number. Anything else is silently dropped by the API.
        for m in MUNICIPALITY_REGISTRY {
            let number = m.code.strip_prefix("K-").unwrap_or_else(|| {
                panic!("code for '{}' should start with 'K-', got '{}'", m.name, m.code)
            });
            assert_eq!(number.len(), 4, "code for '{}' should have 4 digits", m.name);
            assert!(
                number.chars().all(|c| c.is_ascii_digit()),
                "code for '{}' should be numeric, got '{}'",
                m.name,
                m.code
            );
            assert!(number.starts_with("11"), "'{}' is not a Rogaland number", m.name);
        }
    }

    #[test]
    fn test_no_duplicate_codes() {
        let mut seen = std::collections::HashSet::new();
        for m in MUNICIPALITY_REGISTRY {
            assert!(seen.insert(m.code), "duplicate code '{}' in registry", m.code);
        }
    }

    #[test]
    fn test_registry_has_23_municipalities() {
        assert_eq!(MUNICIPALITY_REGISTRY.len(), 23);
        assert_eq!(all_codes().len(), MUNICIPALITY_REGISTRY.len());
    }

    #[test]
    fn test_find_municipality_returns_correct_entry() {
        let m = find_municipality("K-1103").expect("Stavanger should be in registry");
        assert_eq!(m.name, "Stavanger");
        assert!(find_municipality("K-0301").is_none());
    }

    #[test]
    fn test_resolve_accepts_code_number_and_name() {
        assert_eq!(resolve("K-1149").map(|m| m.name), Some("Karmøy"));
        assert_eq!(resolve("1149").map(|m| m.name), Some("Karmøy"));
        assert_eq!(resolve("karmøy").map(|m| m.code), Some("K-1149"));
        assert_eq!(resolve("  Sola ").map(|m| m.code), Some("K-1124"));
        assert!(resolve("Oslo").is_none());
    }
}
