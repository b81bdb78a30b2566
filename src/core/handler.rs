//! Host-facing async API handler seam
//!
//! The host composition framework exposes each entity's api as a set of
//! async functions (`get_one(id)`, `get_some(ids)`, `get_all()`). This
//! module defines the trait those functions are adapted through, so the
//! denormalizer can wrap them without knowing concrete types at compile
//! time.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// An async api function taking positional JSON arguments
///
/// Entity results are returned as JSON: a single entity object for
/// `get_one`-shaped functions, an array of entities for `get_some`/`get_all`.
#[async_trait]
pub trait ApiHandler: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> Result<Value>;
}

/// Shared handle to an api function
pub type ApiFnHandle = Arc<dyn ApiHandler>;

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ApiHandler for FnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn call(&self, args: Vec<Value>) -> Result<Value> {
        (self.0)(args).await
    }
}

/// Adapt an async closure into an [`ApiFnHandle`]
pub fn handler_fn<F, Fut>(f: F) -> ApiFnHandle
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_handler_fn_forwards_args() {
        let handler = handler_fn(|args| async move { Ok(json!({ "got": args })) });
        let result = handler.call(vec![json!("x")]).await.unwrap();
        assert_eq!(result, json!({ "got": ["x"] }));
    }

    #[tokio::test]
    async fn test_handler_fn_propagates_errors() {
        let handler = handler_fn(|_| async { Err(anyhow::anyhow!("boom")) });
        let err = handler.call(vec![]).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
