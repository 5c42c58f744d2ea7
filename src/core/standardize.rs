//! Label standardization for station names and repair codes
//!
//! Station names and repair codes arrive as free text typed on the line.
//! These rule tables fold the common synonyms into canonical labels so
//! downstream counts (Pareto, station performance) group correctly.
//!
//! Repair-code rules are ordered and the first match wins. Most rules only
//! fire when the code describes a single action: a code joining several
//! actions with `&` is kept as entered so distinct repairs are not
//! collapsed into one category.

/// Separator used on repair tickets to join several actions
const ACTION_SEPARATOR: char = '&';

/// Station alias sets, matched exactly after trim + uppercase
const STATION_ALIASES: &[(&[&str], &str)] = &[
    (&["FI", "FI1"], "FI"),
    (&["VI!", "VI"], "VI1"),
    (&["ICT", "ICT1"], "ICT"),
    (&["FCT", "FT", "FT1"], "FCT"),
    (&["PACK", "PACKING", "PK"], "PACK"),
];

/// A repair-code rule
struct RepairRule {
    /// Only apply when the code has no action separator
    sole_action: bool,
    /// Returns the canonical label when the normalized code matches
    apply: fn(&str) -> Option<&'static str>,
}

const REPAIR_RULES: &[RepairRule] = &[
    RepairRule {
        sole_action: false,
        apply: heatsink_and_thermal_pad,
    },
    RepairRule {
        sole_action: true,
        apply: no_fault_found,
    },
    RepairRule {
        sole_action: true,
        apply: bent_pin,
    },
    RepairRule {
        sole_action: true,
        apply: heatsink_fins,
    },
    RepairRule {
        sole_action: true,
        apply: cleaning,
    },
    RepairRule {
        sole_action: true,
        apply: top_shroud,
    },
    RepairRule {
        sole_action: true,
        apply: stiffener,
    },
    RepairRule {
        sole_action: true,
        apply: missing_screw,
    },
];

/// Trim and uppercase a raw label
fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn mentions_heatsink(code: &str) -> bool {
    code.contains("HEATSINK") || code.contains("HEAT SINK")
}

fn heatsink_and_thermal_pad(code: &str) -> Option<&'static str> {
    (code.contains("REPLACE")
        && mentions_heatsink(code)
        && code.contains("THERMAL PAD")
        && !code.contains("CLEAN"))
    .then_some("REPLACED HEATSINK AND THERMAL PAD")
}

fn no_fault_found(code: &str) -> Option<&'static str> {
    const VARIANTS: &[&str] = &[
        "NFF",
        "NO FAULT FOUND",
        "NO FAILURE FOUND",
        "NO DEFECT FOUND",
        "NDF",
    ];
    VARIANTS
        .iter()
        .any(|v| code.contains(v))
        .then_some("NFF")
}

fn bent_pin(code: &str) -> Option<&'static str> {
    if !(code.contains("PIN") && (code.contains("BENT") || code.contains("ALIGN"))) {
        return None;
    }
    // Connector-specific pins are tracked separately
    if code.contains("J501") {
        Some("ALIGNED BENT PIN J501")
    } else if code.contains("J502") {
        Some("ALIGNED BENT PIN J502")
    } else {
        Some("ALIGNED BENT PIN")
    }
}

fn heatsink_fins(code: &str) -> Option<&'static str> {
    (code.contains("FIN")
        && mentions_heatsink(code)
        && (code.contains("ALIGN") || code.contains("BENT") || code.contains("STRAIGHT")))
    .then_some("ALIGNED HEATSINK FINS")
}

fn cleaning(code: &str) -> Option<&'static str> {
    if !code.contains("CLEAN") {
        return None;
    }
    if code.contains("CONNECTOR") {
        Some("CLEANED CONNECTOR")
    } else if mentions_heatsink(code) {
        Some("CLEANED HEATSINK")
    } else {
        None
    }
}

fn top_shroud(code: &str) -> Option<&'static str> {
    (code.contains("REPLACE")
        && (code.contains("SHROUD") || code.contains("TOP COVER")))
    .then_some("REPLACED TOP SHROUD")
}

fn stiffener(code: &str) -> Option<&'static str> {
    if !(code.contains("STIFFENER") && code.contains("REPLACE")) {
        return None;
    }
    if code.contains("BOTTOM") || code.contains("LOWER") {
        Some("REPLACED BOTTOM STIFFENER")
    } else if code.contains("TOP") {
        Some("REPLACED TOP STIFFENER")
    } else {
        None
    }
}

fn missing_screw(code: &str) -> Option<&'static str> {
    (code.contains("SCREW") && (code.contains("MISSING") || code.contains("ADD")))
        .then_some("ADDED MISSING SCREW")
}

/// Standardize a station name
///
/// `None` passes through. Unknown stations come back trimmed and uppercased.
pub fn standardize_station(raw: Option<&str>) -> Option<String> {
    let station = normalize(raw?);
    let canonical = STATION_ALIASES
        .iter()
        .find(|(aliases, _)| aliases.contains(&station.as_str()))
        .map(|(_, canonical)| canonical.to_string());
    Some(canonical.unwrap_or(station))
}

/// Standardize a repair code
///
/// `None` passes through. Codes no rule recognizes (including multi-action
/// codes) come back trimmed and uppercased.
pub fn standardize_repair_code(raw: Option<&str>) -> Option<String> {
    let code = normalize(raw?);
    let single_action = !code.contains(ACTION_SEPARATOR);

    let canonical = REPAIR_RULES
        .iter()
        .filter(|rule| single_action || !rule.sole_action)
        .find_map(|rule| (rule.apply)(&code));

    Some(canonical.map(str::to_string).unwrap_or(code))
}
