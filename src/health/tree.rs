//! Building check trees from configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CheckConfig;
use crate::context::Context;
use crate::health::{AsyncCheck, Check, DelayedErrorCheck, GroupedCheck, StaticCheck};

/// A composed check tree plus handles to its background checks.
pub struct CheckTree {
    pub root: Arc<dyn Check>,
    pub background: Vec<AsyncCheck>,
}

impl CheckTree {
    /// Start every background check, innermost first so outer caches are
    /// primed from already populated inner ones.
    pub async fn start(&self, ctx: &Context) {
        for check in &self.background {
            check.start(ctx).await;
        }
    }

    pub fn stop(&self) {
        for check in &self.background {
            check.stop();
        }
    }
}

/// Build the checks described by `config`.
pub fn build_tree(config: &CheckConfig) -> CheckTree {
    let mut background = Vec::new();
    let root = build_node(config, &mut background);
    CheckTree { root, background }
}

fn build_node(config: &CheckConfig, background: &mut Vec<AsyncCheck>) -> Arc<dyn Check> {
    match config {
        CheckConfig::Group { name, checks } => {
            let mut group = GroupedCheck::new(name.clone());
            for child in checks {
                group.add_shared(build_node(child, background));
            }
            Arc::new(group)
        }
        CheckConfig::Async { interval_ms, check } => {
            let inner = build_node(check, background);
            let check = AsyncCheck::from_shared(inner, Duration::from_millis(*interval_ms));
            background.push(check.clone());
            Arc::new(check)
        }
        CheckConfig::Delayed {
            max_ignored_errors,
            check,
        } => Arc::new(DelayedErrorCheck::new(
            build_node(check, background),
            *max_ignored_errors,
        )),
        CheckConfig::Static {
            name,
            status,
            message,
        } => Arc::new(StaticCheck::new(name.clone(), *status, message.clone())),
    }
}
