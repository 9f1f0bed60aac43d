/// Well-known ticker symbols and their CoinGecko ids. Lookups that miss fall back to the
/// search endpoint. Several symbols may share one id; the first listed is the display symbol.
pub const KNOWN_SYMBOLS: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("bnb", "binancecoin"),
    ("ada", "cardano"),
    ("sol", "solana"),
    ("doge", "dogecoin"),
    ("matic", "matic-network"),
    ("polygon", "matic-network"),
    ("link", "chainlink"),
    ("dot", "polkadot"),
    ("ltc", "litecoin"),
    ("bch", "bitcoin-cash"),
    ("xlm", "stellar"),
    ("xrp", "ripple"),
    ("avax", "avalanche-2"),
    ("atom", "cosmos"),
    ("near", "near"),
    ("ftm", "fantom"),
    ("algo", "algorand"),
    ("tron", "tron"),
    ("trx", "tron"),
    ("icp", "internet-computer"),
    ("apt", "aptos"),
    ("arb", "arbitrum"),
    ("op", "optimism"),
    ("ldo", "lido-dao"),
    ("shib", "shiba-inu"),
    ("uni", "uniswap"),
    ("mkr", "maker"),
    ("crv", "curve-dao-token"),
    ("snx", "synthetix-network-token"),
    ("comp", "compound-governance-token"),
    ("sushi", "sushi"),
];

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_lowercase()
}

/// Id for a known symbol (case-insensitive).
pub fn lookup_id(symbol: &str) -> Option<&'static str> {
    let wanted = normalize_symbol(symbol);
    KNOWN_SYMBOLS
        .iter()
        .find(|(known, _)| *known == wanted)
        .map(|(_, id)| *id)
}

/// Short upper-case label for an asset id, e.g. `matic-network` -> `MATIC`.
pub fn display_symbol(id: &str) -> String {
    if let Some((symbol, _)) = KNOWN_SYMBOLS.iter().find(|(_, known)| *known == id) {
        return symbol.to_uppercase();
    }

    id.split('-')
        .next()
        .unwrap_or(id)
        .to_uppercase()
        .chars()
        .take(4)
        .collect()
}

/// Human-friendly name for an asset id, e.g. `bitcoin-cash` -> `Bitcoin Cash`.
pub fn display_name(id: &str) -> String {
    id.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
