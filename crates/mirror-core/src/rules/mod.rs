//! Extension-driven materialization rules
//!
//! A task carries an ordered rule table. Each rule claims a set of file
//! extensions and names the method used to mirror matching files.

mod resolver;
mod rule;

pub use resolver::{RuleResolver, STRM_SUFFIX};
pub use rule::{Method, Rule};
