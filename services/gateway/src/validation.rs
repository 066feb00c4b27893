// Validation Pipeline (§4.7). Re-expressed per the REDESIGN FLAGS as two
// explicit interfaces instead of the source's positional-argument/arity
// reflection trick:
//
//   - `Validator` (preferred): takes a structured `ValidationRequest`.
//   - `LegacyValidator`: the variadic form, for validators that genuinely
//     want the arity-handshake shape (padded/truncated argument slots plus
//     a completion channel standing in for the spliced continuation arg).
//
// Both ultimately implement `Validator` so the registry only has to know
// one trait object shape.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{oneshot, RwLock};

use crate::connection::ConnId;

#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub event: String,
    pub args: Vec<Value>,
    pub user: ConnId,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Accepted { data: Vec<Value> },
    Rejected { reason: String },
}

#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, req: ValidationRequest) -> ValidationOutcome;
}

/// The legacy variadic interface: `arity` fixes how many positional slots
/// (including the trailing continuation) the validator expects. `invoke`
/// receives `arity - 1` slots, padded with `None` past the supplied data
/// and truncated if the caller supplied more than that, plus a completion
/// channel that stands in for "the continuation placed at position
/// `arity - 1`".
pub trait LegacyValidator: Send + Sync {
    fn arity(&self) -> usize;
    fn invoke(&self, args: Vec<Option<Value>>, complete: oneshot::Sender<ValidationOutcome>);
}

pub struct LegacyAdapter<V>(pub V);

#[async_trait]
impl<V: LegacyValidator + Send + Sync> Validator for LegacyAdapter<V> {
    async fn validate(&self, req: ValidationRequest) -> ValidationOutcome {
        let slot_count = self.0.arity().saturating_sub(1);
        let mut slots: Vec<Option<Value>> = req.args.into_iter().map(Some).collect();
        slots.truncate(slot_count);
        slots.resize(slot_count, None);

        let (tx, rx) = oneshot::channel();
        self.0.invoke(slots, tx);
        rx.await.unwrap_or(ValidationOutcome::Rejected {
            reason: "validator dropped its completion".to_owned(),
        })
    }
}

/// Per-node mapping from event name to registered validators (§4.7:
/// "multiple registrations for the same event are permitted; each is
/// attached as an independent listener").
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: RwLock<HashMap<String, Vec<Arc<dyn Validator>>>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, event: impl Into<String>, validator: Arc<dyn Validator>) {
        self.validators
            .write()
            .await
            .entry(event.into())
            .or_default()
            .push(validator);
    }

    pub async fn has_validator(&self, event: &str) -> bool {
        self.validators
            .read()
            .await
            .get(event)
            .is_some_and(|v| !v.is_empty())
    }

    /// Runs every validator registered for `req.event`, in registration
    /// order, and returns the last one's outcome. Returns `None` if no
    /// validator is registered -- the caller emits `error::validation`
    /// with kind "Validator missing" in that case (§4.7, §7).
    pub async fn invoke(&self, req: ValidationRequest) -> Option<ValidationOutcome> {
        let validators = self.validators.read().await.get(&req.event)?.clone();
        let mut outcome = None;
        for validator in validators {
            outcome = Some(validator.validate(req.clone()).await);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysAccept;

    #[async_trait]
    impl Validator for AlwaysAccept {
        async fn validate(&self, req: ValidationRequest) -> ValidationOutcome {
            ValidationOutcome::Accepted { data: req.args }
        }
    }

    struct AlwaysReject;

    #[async_trait]
    impl Validator for AlwaysReject {
        async fn validate(&self, _req: ValidationRequest) -> ValidationOutcome {
            ValidationOutcome::Rejected {
                reason: "nope".to_owned(),
            }
        }
    }

    fn request(event: &str, args: Vec<Value>) -> ValidationRequest {
        ValidationRequest {
            event: event.to_owned(),
            args,
            user: "conn-1".to_owned(),
            raw: "raw".to_owned(),
        }
    }

    #[tokio::test]
    async fn missing_validator_returns_none() {
        let registry = ValidatorRegistry::new();
        assert!(registry.invoke(request("foo", vec![])).await.is_none());
        assert!(!registry.has_validator("foo").await);
    }

    #[tokio::test]
    async fn registered_validator_is_invoked() {
        let registry = ValidatorRegistry::new();
        registry.register("foo", Arc::new(AlwaysAccept)).await;
        assert!(registry.has_validator("foo").await);

        let outcome = registry
            .invoke(request("foo", vec![Value::from("meh")]))
            .await
            .unwrap();
        assert!(matches!(outcome, ValidationOutcome::Accepted { .. }));
    }

    #[tokio::test]
    async fn rejecting_validator_reports_reason() {
        let registry = ValidatorRegistry::new();
        registry.register("foo", Arc::new(AlwaysReject)).await;

        let outcome = registry.invoke(request("foo", vec![])).await.unwrap();
        match outcome {
            ValidationOutcome::Rejected { reason } => assert_eq!(reason, "nope"),
            _ => panic!("expected rejection"),
        }
    }

    struct Arity5Validator;

    impl LegacyValidator for Arity5Validator {
        fn arity(&self) -> usize {
            5
        }

        fn invoke(&self, args: Vec<Option<Value>>, complete: oneshot::Sender<ValidationOutcome>) {
            assert_eq!(args.len(), 4);
            assert_eq!(args[0], Some(Value::from("foo")));
            assert_eq!(args[1], None);
            assert_eq!(args[2], None);
            assert_eq!(args[3], None);
            complete
                .send(ValidationOutcome::Accepted {
                    data: vec![args[0].clone().unwrap()],
                })
                .ok();
        }
    }

    #[tokio::test]
    async fn legacy_adapter_pads_and_truncates_to_arity_minus_one() {
        let registry = ValidatorRegistry::new();
        registry
            .register("foo", Arc::new(LegacyAdapter(Arity5Validator)))
            .await;

        let outcome = registry
            .invoke(request("foo", vec![Value::from("foo")]))
            .await
            .unwrap();
        match outcome {
            ValidationOutcome::Accepted { data } => assert_eq!(data, vec![Value::from("foo")]),
            _ => panic!("expected acceptance"),
        }
    }

    struct Arity2TruncatingValidator;

    impl LegacyValidator for Arity2TruncatingValidator {
        fn arity(&self) -> usize {
            2
        }

        fn invoke(&self, args: Vec<Option<Value>>, complete: oneshot::Sender<ValidationOutcome>) {
            assert_eq!(args.len(), 1);
            complete
                .send(ValidationOutcome::Accepted {
                    data: args.into_iter().flatten().collect(),
                })
                .ok();
        }
    }

    #[tokio::test]
    async fn legacy_adapter_truncates_extra_data_arguments() {
        let registry = ValidatorRegistry::new();
        registry
            .register("foo", Arc::new(LegacyAdapter(Arity2TruncatingValidator)))
            .await;

        registry
            .invoke(request("foo", vec![Value::from(1), Value::from(2), Value::from(3)]))
            .await
            .unwrap();
    }
}
