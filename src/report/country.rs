//! Source-country resolution for the country breakdown (PIT/ZG).
//!
//! The ISIN prefix is authoritative when present; otherwise the exchange
//! suffix of the ticker gives a usable hint. Plain tickers default to US,
//! which matches the brokers this pipeline ingests.

/// Two-letter country code from an ISIN prefix, if one is present.
pub fn country_from_isin(isin: Option<&str>) -> Option<String> {
    let isin = isin?.trim();
    // get() instead of slicing: broker exports carry garbage ISINs and a
    // multi-byte first character must not abort the run
    let prefix = isin.get(..2)?;
    prefix
        .chars()
        .all(|c| c.is_ascii_alphabetic())
        .then(|| prefix.to_ascii_uppercase())
}

/// Best-effort country code for a ticker symbol, used when no ISIN is known.
pub fn country_from_symbol(symbol: &str) -> String {
    if let Some((_, suffix)) = symbol.rsplit_once('.') {
        let suffix = suffix.to_ascii_uppercase();
        let code = match suffix.as_str() {
            "DE" => "DE",
            "L" => "GB",
            "AS" => "NL",
            "PA" => "FR",
            "MI" => "IT",
            "MC" => "ES",
            "SW" => "CH",
            "TO" => "CA",
            "AX" => "AU",
            "HK" => "HK",
            "T" => "JP",
            "SS" => "SE",
            "CO" => "DK",
            "HE" => "FI",
            "OL" => "NO",
            "WA" => "PL",
            // Unknown exchange suffix: pass it through rather than guess
            other => return other.to_string(),
        };
        return code.to_string();
    }
    "US".to_string()
}

/// Country code for a transaction: explicit country wins, then ISIN,
/// then the symbol heuristic.
pub fn resolve_country(
    country: Option<&str>,
    isin: Option<&str>,
    symbol: &str,
) -> String {
    if let Some(c) = country {
        let c = c.trim();
        if !c.is_empty() {
            return c.to_ascii_uppercase();
        }
    }
    country_from_isin(isin).unwrap_or_else(|| country_from_symbol(symbol))
}

/// English display name for a two-letter country code. Falls back to the
/// code itself for anything not in the table.
pub fn country_display_name(code: &str) -> String {
    let name = match code {
        "US" => "United States",
        "GB" => "United Kingdom",
        "DE" => "Germany",
        "NL" => "Netherlands",
        "FR" => "France",
        "IT" => "Italy",
        "ES" => "Spain",
        "CH" => "Switzerland",
        "CA" => "Canada",
        "AU" => "Australia",
        "HK" => "Hong Kong",
        "JP" => "Japan",
        "SE" => "Sweden",
        "DK" => "Denmark",
        "FI" => "Finland",
        "NO" => "Norway",
        "PL" => "Poland",
        "IE" => "Ireland",
        "LU" => "Luxembourg",
        "BE" => "Belgium",
        "AT" => "Austria",
        "PT" => "Portugal",
        "JE" => "Jersey",
        "MX" => "Mexico",
        other => return other.to_string(),
    };
    name.to_string()
}
