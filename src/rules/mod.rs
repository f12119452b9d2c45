//! Notification routing rules
//!
//! A tracked type carries an ordered list of [`ChangeRule`]s. On each
//! audited mutation the [`RuleEvaluator`] picks the first rule that matches
//! and builds the title, comment and receiver of the resulting audit record.

mod evaluator;
mod resolve;
mod rule;

pub use evaluator::{NotificationPayload, RuleEvaluator};
pub use resolve::{default_title, receiver_id, try_resolve, ResolutionError};
pub use rule::{AttributeSetRule, ChangeRule, ForeignLookup, PolymorphicRule};
