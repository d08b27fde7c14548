//! Verification layer: every call is gated here before dispatch.
//!
//! Order: visible-name resolution and schema (reject), domain validators
//! (reject), then the destructive and low-confidence gates, which compound into
//! one `needs_confirmation`. An explicit confirmation bound to the exact call
//! signature clears both gates.

mod confidence;
mod schema;
mod validators;

use neuro_types::{ConfirmationGate, ToolCall, VerificationResult};

use crate::tools::VisibleTools;

pub use confidence::{ConfidenceSignals, contains_hedging};
pub use validators::{
    Validator, ValidatorSet, frequency_range, non_empty_path, positive_integers, positive_number,
    probability_ranges,
};

/// What the parser observed about the response the call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseShape {
    /// The response was exactly one structured block.
    pub clean_output: bool,
    /// The surrounding prose hedges.
    pub hedging: bool,
}

/// Verification result plus the call with its name canonicalized to the catalog's spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub result: VerificationResult,
    pub call: ToolCall,
}

/// Schema check, validators and confidence gate.
#[derive(Clone)]
pub struct Verifier {
    validators: ValidatorSet,
    threshold: f32,
}

impl Verifier {
    pub fn new(validators: ValidatorSet, threshold: f32) -> Self {
        Self {
            validators,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Gate `call` against the tools visible right now.
    ///
    /// `confirmed_signature` is the signature of a call a human already approved;
    /// it only counts when it equals the canonicalized call's signature.
    pub fn verify(
        &self,
        call: &ToolCall,
        visible: &VisibleTools<'_>,
        shape: ResponseShape,
        confirmed_signature: Option<&str>,
    ) -> Verification {
        let Some((definition, exact_name)) = visible.resolve(&call.tool_name) else {
            let available = visible.names();
            let reason = if available.is_empty() {
                format!(
                    "tool `{}` is not available: no actions are available at stage `{}`",
                    call.tool_name,
                    visible.stage().stage
                )
            } else {
                format!(
                    "tool `{}` is not available at stage `{}`; available: {}",
                    call.tool_name,
                    visible.stage().stage,
                    available.join(", ")
                )
            };
            return Verification {
                result: VerificationResult::reject(0.0, reason),
                call: call.clone(),
            };
        };

        let canonical = ToolCall {
            tool_name: definition.name.clone(),
            parameters: call.parameters.clone(),
        };
        let confidence = ConfidenceSignals {
            clean_output: shape.clean_output,
            exact_name,
            has_parameters: !canonical.parameters.is_empty(),
            expects_parameters: !definition.parameters.is_empty(),
            hedging: shape.hedging,
        }
        .score();

        if let Err(reason) = schema::check_schema(definition, &canonical) {
            return Verification {
                result: VerificationResult::reject(confidence, reason),
                call: canonical,
            };
        }
        if let Err(reason) = self.validators.validate(&canonical) {
            return Verification {
                result: VerificationResult::reject(confidence, reason),
                call: canonical,
            };
        }

        let confirmed = confirmed_signature.is_some_and(|signature| signature == canonical.signature());
        let low_confidence = confidence < self.threshold;
        let result = match ConfirmationGate::from_flags(definition.is_destructive, low_confidence) {
            Some(_) if confirmed => {
                VerificationResult::accept(confidence, "confirmed by the user")
            }
            Some(gate) => VerificationResult::needs_confirmation(
                gate,
                confidence,
                gate_reason(gate, &definition.name, confidence, self.threshold),
            ),
            None => VerificationResult::accept(confidence, "schema and validators passed"),
        };
        Verification {
            result,
            call: canonical,
        }
    }
}

fn gate_reason(gate: ConfirmationGate, tool: &str, confidence: f32, threshold: f32) -> String {
    match gate {
        ConfirmationGate::Destructive => {
            format!("`{tool}` is destructive and needs explicit confirmation")
        }
        ConfirmationGate::LowConfidence => format!(
            "confidence {confidence:.2} is below the threshold {threshold:.2} for `{tool}`"
        ),
        ConfirmationGate::Both => format!(
            "`{tool}` is destructive and confidence {confidence:.2} is below the threshold {threshold:.2}"
        ),
    }
}
