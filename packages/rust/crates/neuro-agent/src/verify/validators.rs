//! Per-tool domain validators: independent pure functions keyed by tool name.

use std::collections::BTreeMap;
use std::sync::Arc;

use neuro_types::ToolCall;

/// `Err` carries a human-readable reason.
pub type Validator = Arc<dyn Fn(&ToolCall) -> Result<(), String> + Send + Sync>;

/// Validators grouped by tool; run in registration order, first failure wins.
#[derive(Clone, Default)]
pub struct ValidatorSet {
    by_tool: BTreeMap<String, Vec<Validator>>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rules for the EEG tool set.
    #[must_use]
    pub fn eeg_defaults() -> Self {
        Self::new()
            .with("apply_filter", frequency_range)
            .with("apply_notch", |call: &ToolCall| positive_number(call, "freq"))
            .with("resample", |call: &ToolCall| {
                positive_integers(call, &["target_rate"])
            })
            .with("configure_training", |call: &ToolCall| {
                positive_integers(call, &["epochs", "batch_size"])
            })
            .with("configure_training", probability_ranges)
            .with("load_data", non_empty_path)
    }

    pub fn register<F>(&mut self, tool_name: &str, validator: F)
    where
        F: Fn(&ToolCall) -> Result<(), String> + Send + Sync + 'static,
    {
        self.by_tool
            .entry(tool_name.to_string())
            .or_default()
            .push(Arc::new(validator));
    }

    #[must_use]
    pub fn with<F>(mut self, tool_name: &str, validator: F) -> Self
    where
        F: Fn(&ToolCall) -> Result<(), String> + Send + Sync + 'static,
    {
        self.register(tool_name, validator);
        self
    }

    /// Run every validator registered for `call.tool_name`. Tools without validators pass.
    pub fn validate(&self, call: &ToolCall) -> Result<(), String> {
        self.by_tool
            .get(&call.tool_name)
            .map_or(Ok(()), |validators| {
                validators.iter().try_for_each(|validator| validator(call))
            })
    }

    /// Number of validators for `tool_name`.
    pub fn count_for(&self, tool_name: &str) -> usize {
        self.by_tool.get(tool_name).map_or(0, Vec::len)
    }
}

/// `low < high`, both positive; `high` below Nyquist when `sampling_rate` is given.
pub fn frequency_range(call: &ToolCall) -> Result<(), String> {
    let (Some(low), Some(high)) = (call.param_f64("low"), call.param_f64("high")) else {
        return Err("frequency band needs numeric `low` and `high`".to_string());
    };
    if low <= 0.0 || high <= 0.0 {
        return Err(format!(
            "cutoff frequencies must be positive (low={low}, high={high})"
        ));
    }
    if low >= high {
        return Err(format!(
            "low cutoff must be below high cutoff (low={low}, high={high})"
        ));
    }
    if let Some(rate) = call.param_f64("sampling_rate") {
        let nyquist = rate / 2.0;
        if high >= nyquist {
            return Err(format!(
                "high cutoff {high} Hz must be below the Nyquist frequency {nyquist} Hz"
            ));
        }
    }
    Ok(())
}

/// Listed fields, when present, are whole numbers ≥ 1.
pub fn positive_integers(call: &ToolCall, fields: &[&str]) -> Result<(), String> {
    for field in fields {
        let Some(value) = call.param(field) else {
            continue;
        };
        let whole = value
            .as_f64()
            .filter(|number| number.is_finite() && number.fract() == 0.0);
        match whole {
            Some(number) if number >= 1.0 => {}
            _ => return Err(format!("`{field}` must be a positive integer, got {value}")),
        }
    }
    Ok(())
}

/// `field`, when present, is a number > 0.
pub fn positive_number(call: &ToolCall, field: &str) -> Result<(), String> {
    match call.param(field) {
        None => Ok(()),
        Some(value) => match value.as_f64() {
            Some(number) if number > 0.0 => Ok(()),
            _ => Err(format!("`{field}` must be a positive number, got {value}")),
        },
    }
}

/// `learning_rate` in (0, 1], `validation_split` in [0, 1).
pub fn probability_ranges(call: &ToolCall) -> Result<(), String> {
    if let Some(rate) = call.param_f64("learning_rate")
        && !(rate > 0.0 && rate <= 1.0)
    {
        return Err(format!("`learning_rate` must be in (0, 1], got {rate}"));
    }
    if let Some(split) = call.param_f64("validation_split")
        && !(0.0..1.0).contains(&split)
    {
        return Err(format!("`validation_split` must be in [0, 1), got {split}"));
    }
    Ok(())
}

/// `path` is a non-blank string.
pub fn non_empty_path(call: &ToolCall) -> Result<(), String> {
    match call.param_str("path") {
        Some(path) if !path.trim().is_empty() => Ok(()),
        _ => Err("`path` must name a file".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nyquist_bounds_high_cutoff() {
        let call = ToolCall::new("apply_filter")
            .with_param("low", 1)
            .with_param("high", 60)
            .with_param("sampling_rate", 100);
        assert!(frequency_range(&call).unwrap_err().contains("Nyquist"));
        let call = call.with_param("sampling_rate", 250);
        assert!(frequency_range(&call).is_ok());
    }

    #[test]
    fn configure_training_runs_both_validators() {
        let set = ValidatorSet::eeg_defaults();
        assert_eq!(set.count_for("configure_training"), 2);
        let call = ToolCall::new("configure_training").with_param("epochs", 0);
        assert!(set.validate(&call).unwrap_err().contains("epochs"));
        let call = ToolCall::new("configure_training").with_param("learning_rate", 1.5);
        assert!(set.validate(&call).unwrap_err().contains("learning_rate"));
        let call = ToolCall::new("configure_training")
            .with_param("epochs", 20.0)
            .with_param("validation_split", 0.2);
        assert!(set.validate(&call).is_ok());
    }

    #[test]
    fn unregistered_tools_pass() {
        assert!(ValidatorSet::eeg_defaults()
            .validate(&ToolCall::new("get_status"))
            .is_ok());
    }
}
