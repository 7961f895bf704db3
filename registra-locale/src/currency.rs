use registra_core::Currency;

/// The currency used in a country, by ISO-3166 alpha-2 code.
///
/// Returns `None` for countries outside the table; callers fall back to their default.
pub fn currency_for_country(country: &str) -> Option<Currency> {
    let code = match country.trim().to_ascii_uppercase().as_str() {
        "MX" => "MXN",
        "US" | "EC" | "SV" | "PR" | "PA" => "USD",
        "CA" => "CAD",
        "GT" => "GTQ",
        "HN" => "HNL",
        "NI" => "NIO",
        "CR" => "CRC",
        "CU" => "CUP",
        "DO" => "DOP",
        "CO" => "COP",
        "VE" => "VES",
        "PE" => "PEN",
        "BO" => "BOB",
        "CL" => "CLP",
        "AR" => "ARS",
        "UY" => "UYU",
        "PY" => "PYG",
        "BR" => "BRL",
        "GB" => "GBP",
        "CH" => "CHF",
        "ES" | "FR" | "DE" | "IT" | "PT" | "NL" | "BE" | "AT" | "IE" | "FI" | "GR" => "EUR",
        "JP" => "JPY",
        "CN" => "CNY",
        "IN" => "INR",
        "AU" => "AUD",
        _ => return None,
    };
    code.parse().ok()
}
