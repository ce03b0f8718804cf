/// Registrar brands recognized anywhere in the text when no explicit field is
/// present. Display-cased as returned.
const KNOWN_REGISTRARS: &[&str] = &[
    "MarkMonitor",
    "GoDaddy",
    "Namecheap",
    "Network Solutions",
    "Gandi",
    "Tucows",
    "eNom",
    "Porkbun",
    "Dynadot",
    "NameSilo",
    "Cloudflare",
    "Google Domains",
    "IONOS",
    "OVH",
    "Hover",
];

/// Best-effort registrar name. Explicit `Registrar:` field first, then
/// `Sponsoring Registrar:`, then known brand strings. Never fails: the
/// fallback is the literal `"UNKNOWN"`.
pub fn extract_registrar(raw: &str) -> String {
    if let Some(value) = field_value(raw, "registrar:") {
        return value;
    }
    if let Some(value) = field_value(raw, "sponsoring registrar:") {
        return value;
    }

    let lowered = raw.to_lowercase();
    for brand in KNOWN_REGISTRARS {
        if lowered.contains(&brand.to_lowercase()) {
            return (*brand).to_string();
        }
    }
    "UNKNOWN".to_string()
}

fn field_value(raw: &str, field: &str) -> Option<String> {
    let n = field.len();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.len() < n || !trimmed.is_char_boundary(n) {
            continue;
        }
        if trimmed[..n].eq_ignore_ascii_case(field) {
            let value = trimmed[n..].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
