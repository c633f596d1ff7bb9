//! Flow definitions.

use crate::FlowSchema;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use taleweaver_error::{FlowError, FlowErrorKind, TaleweaverResult};
use taleweaver_interface::{FlowContext, FlowHandler};

/// A named handler with optional input and output schemas.
#[derive(Clone, derive_getters::Getters)]
pub struct Flow {
    /// Registry key
    name: String,
    /// Checked before the handler runs
    input_schema: Option<FlowSchema>,
    /// Checked against the handler's result
    output_schema: Option<FlowSchema>,
    /// The work itself
    handler: Arc<dyn FlowHandler>,
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("input_schema", &self.input_schema.is_some())
            .field("output_schema", &self.output_schema.is_some())
            .finish()
    }
}

impl Flow {
    /// A flow with no schemas.
    pub fn new(name: impl Into<String>, handler: Arc<dyn FlowHandler>) -> Self {
        Self {
            name: name.into(),
            input_schema: None,
            output_schema: None,
            handler,
        }
    }

    /// Validate input against `schema`.
    pub fn with_input_schema(mut self, schema: FlowSchema) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Validate output against `schema`.
    pub fn with_output_schema(mut self, schema: FlowSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Wrap a [`TypedFlow`], deriving both schemas from its types.
    ///
    /// # Errors
    ///
    /// Returns an error if either generated schema fails to compile.
    pub fn typed<T: TypedFlow>(flow: T) -> TaleweaverResult<Self> {
        Ok(Self::new(T::NAME, Arc::new(TypedHandler(flow)))
            .with_input_schema(FlowSchema::for_type::<T::Input>()?)
            .with_output_schema(FlowSchema::for_type::<T::Output>()?))
    }
}

/// A flow with strongly typed input and output.
///
/// Schemas are generated from the associated types, so the wire contract and
/// the Rust types cannot drift apart.
#[async_trait]
pub trait TypedFlow: Send + Sync + 'static {
    /// Request payload
    type Input: DeserializeOwned + JsonSchema + Send;
    /// Response payload
    type Output: Serialize + JsonSchema + Send;

    /// Registry key
    const NAME: &'static str;

    /// Run the flow.
    async fn run(&self, input: Self::Input, ctx: FlowContext) -> TaleweaverResult<Self::Output>;
}

struct TypedHandler<T>(T);

#[async_trait]
impl<T: TypedFlow> FlowHandler for TypedHandler<T> {
    async fn handle(
        &self,
        input: serde_json::Value,
        ctx: FlowContext,
    ) -> TaleweaverResult<serde_json::Value> {
        let input: T::Input = serde_json::from_value(input)
            .map_err(|e| FlowError::new(FlowErrorKind::Serialization(e.to_string())))?;
        let output = self.0.run(input, ctx).await?;
        let value = serde_json::to_value(output)
            .map_err(|e| FlowError::new(FlowErrorKind::Serialization(e.to_string())))?;
        Ok(value)
    }
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> FlowHandler for FnHandler<F>
where
    F: Fn(serde_json::Value, FlowContext) -> Fut + Send + Sync,
    Fut: Future<Output = TaleweaverResult<serde_json::Value>> + Send,
{
    async fn handle(
        &self,
        input: serde_json::Value,
        ctx: FlowContext,
    ) -> TaleweaverResult<serde_json::Value> {
        (self.0)(input, ctx).await
    }
}

/// Turn an async closure over raw JSON into a handler.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taleweaver_flow::{Flow, handler_fn};
///
/// let flow = Flow::new(
///     "shout",
///     handler_fn(|input, _ctx| async move {
///         let text = input["text"].as_str().unwrap_or_default().to_uppercase();
///         Ok(json!(text))
///     }),
/// );
/// assert_eq!(flow.name(), "shout");
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn FlowHandler>
where
    F: Fn(serde_json::Value, FlowContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaleweaverResult<serde_json::Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
