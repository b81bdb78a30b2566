//! Depth-tracking context threaded through recursive resolution
//!
//! Every externally-initiated call starts at level 0; every internal
//! recursive fetch descends one level and forwards the depth limit
//! unchanged. Once the level reaches the limit, resolution is skipped and
//! raw ids pass through untouched.

use serde_json::{Map, Value};

/// Resolution state carried across nested fetch calls
///
/// The context is passed by value through the call chain and never shared
/// mutably; `params` is an arbitrary passthrough bag forwarded unchanged to
/// every nested fetch.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Current recursion depth; 0 for externally-initiated calls
    pub level: usize,
    /// Maximum depth at which resolution still runs
    pub max_depth: usize,
    /// Caller-supplied passthrough parameters
    pub params: Map<String, Value>,
}

impl ResolutionContext {
    /// Context for an externally-initiated call
    pub fn root(max_depth: usize) -> Self {
        Self {
            level: 0,
            max_depth,
            params: Map::new(),
        }
    }

    /// Attach passthrough parameters
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Context for a nested fetch, one level deeper
    pub fn descend(&self) -> Self {
        Self {
            level: self.level + 1,
            max_depth: self.max_depth,
            params: self.params.clone(),
        }
    }

    /// True once the depth limit has been reached
    pub fn exhausted(&self) -> bool {
        self.level >= self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_starts_at_level_zero() {
        let ctx = ResolutionContext::root(12);
        assert_eq!(ctx.level, 0);
        assert_eq!(ctx.max_depth, 12);
        assert!(!ctx.exhausted());
    }

    #[test]
    fn test_descend_increments_level_and_keeps_depth() {
        let ctx = ResolutionContext::root(3).descend().descend();
        assert_eq!(ctx.level, 2);
        assert_eq!(ctx.max_depth, 3);
    }

    #[test]
    fn test_exhausted_at_limit() {
        let ctx = ResolutionContext::root(1);
        assert!(!ctx.exhausted());
        assert!(ctx.descend().exhausted());
    }

    #[test]
    fn test_zero_depth_is_exhausted_immediately() {
        assert!(ResolutionContext::root(0).exhausted());
    }

    #[test]
    fn test_params_are_forwarded_on_descend() {
        let mut params = Map::new();
        params.insert("tenant".to_string(), Value::String("acme".to_string()));
        let ctx = ResolutionContext::root(12).with_params(params);
        assert_eq!(
            ctx.descend().params.get("tenant"),
            Some(&Value::String("acme".to_string()))
        );
    }
}
