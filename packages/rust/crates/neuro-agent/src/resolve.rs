pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// CLI value, then non-empty env var, then `current`.
pub(crate) fn resolve_string(cli_value: Option<String>, env_name: &str, current: &str) -> String {
    if let Some(value) = cli_value.filter(|value| !value.trim().is_empty()) {
        return value;
    }
    if let Some(value) = non_empty_env(env_name) {
        return value;
    }
    current.to_string()
}

/// Positive CLI value, then positive env var, then `current`.
pub(crate) fn resolve_positive_u32(cli_value: Option<u32>, env_name: &str, current: u32) -> u32 {
    if let Some(value) = cli_value
        && value > 0
    {
        return value;
    }
    if let Some(value) = parse_positive_u32_from_env(env_name) {
        return value;
    }
    current
}

pub(crate) fn parse_positive_u32_from_env(name: &str) -> Option<u32> {
    let raw = non_empty_env(name)?;
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(env_var = %name, value = %raw, "invalid positive integer env value; ignoring");
            None
        }
    }
}
