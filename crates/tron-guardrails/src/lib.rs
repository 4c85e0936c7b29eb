//! # tron-guardrails
//!
//! Guardrail engine and rule system for safety enforcement.
//!
//! - Rule types: pattern rules, path rules, resource rules, context rules, composite rules
//! - Severity levels: block, warn, audit
//! - Rule tiers: core (non-negotiable), standard, custom

#![deny(unsafe_code)]

pub mod audit;
pub mod core_rules;
pub mod engine;
pub mod errors;
pub mod rules;
pub mod types;

pub use audit::AuditLogger;
pub use engine::GuardrailEngine;
pub use errors::GuardrailError;
pub use types::{
    AuditEntry, AuditEntryParams, AuditStats, EvaluationContext, GuardrailEngineOptions,
    GuardrailEvaluation, RuleEvaluationResult, RuleOverride, RuleTier, Scope, Severity,
};
