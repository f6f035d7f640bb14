//! Symbol and chain name normalization for published pool records.

/// Collapse pair separators to `-` and strip whitespace.
///
/// `_`, `:`, `/` and `+` become `-`. Symbols containing `USD+` keep their `+`
/// so that ticker is not split in two.
pub fn format_symbol(symbol: &str) -> String {
    let keep_plus = symbol.contains("USD+");

    symbol
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '_' | ':' | '/' => '-',
            '+' if !keep_plus => '-',
            other => other,
        })
        .collect()
}

/// Display casing for chain names: `avalanche` -> `Avalanche`, `xdai` -> `xDai`.
pub fn format_chain(chain: &str) -> String {
    if chain.eq_ignore_ascii_case("xdai") {
        return "xDai".to_string();
    }

    let mut chars = chain.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Chain identifier understood by the block and price services.
pub fn llama_chain(chain: &str) -> String {
    let chain = chain.to_lowercase();
    if chain == "avalanche" {
        "avax".to_string()
    } else {
        chain
    }
}
