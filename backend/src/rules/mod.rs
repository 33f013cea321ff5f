//! Event rules: reactive condition → action bindings
//!
//! Rules react to world occurrences instead of the clock. They come from two
//! places: world configuration ([`RuleDefinition`]s resolved through the
//! [`RuleFunctionTable`]) and request handlers, which arm one-shot
//! expedition rules ([`EventRule::expedite`]) to run an operation the moment
//! its requestor arrives in range.
//!
//! Every rule is registered under a [`PartitionKey`]; clearing the key
//! discards all of them at once.

pub mod api;
pub mod event_rule;
pub mod functions;
pub mod partition;
pub mod types;

pub use api::{EventRulesApi, RuleId};
pub use event_rule::{EventRule, RuleAction, RuleCondition, RuleView};
pub use functions::RuleFunctionTable;
pub use partition::PartitionKey;
pub use types::{
    ArgumentKind, EventRuleType, ExecutionCount, FunctionCall, RuleArgument, RuleDefinition,
    RuleError, RuleSubjects, RuleThing, Subject,
};
