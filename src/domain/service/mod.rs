pub mod rule_chain;

pub use rule_chain::{run_rule_chain, ClaimRule, RuleViolation, RULE_CHAIN};
