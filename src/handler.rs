use crate::context::Context;

/// What a handler hands back to the framework. Returned text or bytes are
/// written to the response body verbatim; `None` means the handler either
/// wrote through the [`Context`] itself or has nothing to say.
pub enum ReturnValue {
    None,
    Text(String),
    Bytes(Vec<u8>),
}

impl From<()> for ReturnValue {
    fn from(_: ()) -> Self {
        ReturnValue::None
    }
}

impl From<String> for ReturnValue {
    fn from(s: String) -> Self {
        ReturnValue::Text(s)
    }
}

impl From<&str> for ReturnValue {
    fn from(s: &str) -> Self {
        ReturnValue::Text(s.to_string())
    }
}

impl From<Vec<u8>> for ReturnValue {
    fn from(b: Vec<u8>) -> Self {
        ReturnValue::Bytes(b)
    }
}

type NoArgsFn = Box<dyn Fn() -> ReturnValue + Send + Sync>;
type ContextFn = Box<dyn for<'a, 'b> Fn(&'b mut Context<'a>) -> ReturnValue + Send + Sync>;
type CapturesFn = Box<dyn Fn(&[String]) -> ReturnValue + Send + Sync>;
type FullFn =
    Box<dyn for<'a, 'b> Fn(&'b mut Context<'a>, &[String]) -> ReturnValue + Send + Sync>;

/// Closed set of handler shapes. Route captures bind positionally to the
/// capture parameters; the optional leading [`Context`] gives a handler
/// the response-writing surface. Arity is declared up front and checked
/// against the pattern's capture count at registration.
pub enum Handler {
    NoArgs(NoArgsFn),
    ContextOnly(ContextFn),
    CapturesOnly { arity: usize, call: CapturesFn },
    ContextAndCaptures { arity: usize, call: FullFn },
}

impl Handler {
    pub fn no_args<R, F>(f: F) -> Self
    where
        R: Into<ReturnValue>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Handler::NoArgs(Box::new(move || f().into()))
    }

    pub fn with_context<R, F>(f: F) -> Self
    where
        R: Into<ReturnValue>,
        F: for<'a, 'b> Fn(&'b mut Context<'a>) -> R + Send + Sync + 'static,
    {
        Handler::ContextOnly(Box::new(move |ctx| f(ctx).into()))
    }

    pub fn with_captures<R, F>(arity: usize, f: F) -> Self
    where
        R: Into<ReturnValue>,
        F: Fn(&[String]) -> R + Send + Sync + 'static,
    {
        Handler::CapturesOnly {
            arity,
            call: Box::new(move |caps| f(caps).into()),
        }
    }

    pub fn full<R, F>(arity: usize, f: F) -> Self
    where
        R: Into<ReturnValue>,
        F: for<'a, 'b> Fn(&'b mut Context<'a>, &[String]) -> R + Send + Sync + 'static,
    {
        Handler::ContextAndCaptures {
            arity,
            call: Box::new(move |ctx, caps| f(ctx, caps).into()),
        }
    }

    /// Number of capture parameters the handler binds, beyond the
    /// optional Context prefix.
    pub fn capture_arity(&self) -> usize {
        match self {
            Handler::NoArgs(_) | Handler::ContextOnly(_) => 0,
            Handler::CapturesOnly { arity, .. } => *arity,
            Handler::ContextAndCaptures { arity, .. } => *arity,
        }
    }
}

/// Invoke a handler with the live context and the captures extracted by
/// the router. Arity was validated at registration, so `captures` is
/// exactly as long as the handler expects.
pub fn invoke(handler: &Handler, ctx: &mut Context<'_>, captures: &[String]) -> ReturnValue {
    match handler {
        Handler::NoArgs(call) => call(),
        Handler::ContextOnly(call) => call(ctx),
        Handler::CapturesOnly { call, .. } => call(captures),
        Handler::ContextAndCaptures { call, .. } => call(ctx, captures),
    }
}
