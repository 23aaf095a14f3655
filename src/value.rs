//! Dynamic values interpolated into templates
//!
//! A [`Value`] is anything that can sit in a `${...}` slot of a template:
//! primitives, nested template results, lists, plain JSON objects, client-only
//! callbacks, directives, and values that are still pending.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::resolver::{PartContext, ResolveError};
use crate::template::TemplateResult;

/// A client-only callback, such as an event handler.
///
/// Callbacks never render on the server: in text position they emit nothing
/// and in attribute position they drop the attribute.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value])>);

impl Callback {
    pub fn new(f: impl Fn(&[Value]) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback with the given arguments
    pub fn call(&self, args: &[Value]) {
        (self.0)(args)
    }

    /// Whether both handles refer to the same function
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

type DirectiveFn = dyn Fn(&mut PartContext<'_>) -> Result<(), ResolveError>;

/// A function invoked with the part it is bound to.
///
/// The directive stores its result on the [`PartContext`] through
/// [`PartContext::set_value`]; the resolver reads it back immediately.
#[derive(Clone)]
pub struct Directive(Rc<DirectiveFn>);

impl Directive {
    pub fn new(f: impl Fn(&mut PartContext<'_>) -> Result<(), ResolveError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub(crate) fn apply(&self, cx: &mut PartContext<'_>) -> Result<(), ResolveError> {
        (self.0)(cx)
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Directive(..)")
    }
}

type PendingFuture = LocalBoxFuture<'static, Result<Value, String>>;

/// A value that is not available yet.
///
/// The future can be awaited exactly once; see [`crate::resolver::settle`].
#[derive(Clone)]
pub struct Pending(Rc<RefCell<Option<PendingFuture>>>);

impl Pending {
    pub fn new<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + 'static,
        E: fmt::Display,
    {
        let future = future.map(|res| res.map_err(|e| e.to_string())).boxed_local();
        Self(Rc::new(RefCell::new(Some(future))))
    }

    pub(crate) fn take(&self) -> Option<PendingFuture> {
        self.0.borrow_mut().take()
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.borrow().is_some() {
            "waiting"
        } else {
            "consumed"
        };
        write!(f, "Pending({state})")
    }
}

/// A dynamic template value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// `null` / `undefined`: renders as an empty string
    #[default]
    Null,
    /// Sentinel that removes an attribute entirely (renders nothing in text)
    Nothing,
    Bool(bool),
    Number(f64),
    String(String),
    /// Trusted markup, emitted without escaping
    Raw(String),
    /// A plain object (or any JSON value)
    Json(serde_json::Value),
    Template(TemplateResult),
    List(Vec<Value>),
    Function(Callback),
    Directive(Directive),
    Pending(Pending),
}

impl Value {
    /// Wrap a client-only callback
    pub fn function(f: impl Fn(&[Value]) + 'static) -> Self {
        Value::Function(Callback::new(f))
    }

    /// Wrap a future whose output is rendered once it settles
    pub fn pending<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + 'static,
        E: fmt::Display,
    {
        Value::Pending(Pending::new(future))
    }

    /// Convert a JSON value, turning arrays into lists so they render item by item
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(_) => Value::Json(json.clone()),
        }
    }

    /// JavaScript truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Nothing => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Json(json) => match json {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                serde_json::Value::String(s) => !s.is_empty(),
                _ => true,
            },
            Value::Raw(_)
            | Value::Template(_)
            | Value::List(_)
            | Value::Function(_)
            | Value::Directive(_)
            | Value::Pending(_) => true,
        }
    }

    /// String coercion for primitives, `None` for everything else
    pub fn primitive_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(number_to_string(*n)),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// The JSON form of this value, if it has one
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(json_number(*n)),
            Value::String(s) | Value::Raw(s) => Some(serde_json::Value::String(s.clone())),
            Value::Json(json) => Some(json.clone()),
            Value::List(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Option<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Nothing
            | Value::Template(_)
            | Value::Function(_)
            | Value::Directive(_)
            | Value::Pending(_) => None,
        }
    }

    /// Short name of the value's shape, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Nothing => "nothing",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Raw(_) => "raw markup",
            Value::Json(_) => "object",
            Value::Template(_) => "template result",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Directive(_) => "directive",
            Value::Pending(_) => "pending value",
        }
    }
}

/// Format a number the way JavaScript's `String(n)` does
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n < 0.0 {
        format!("-{}", number_to_string(-n))
    } else {
        // shortest round-trip digits, e.g. "1.2345e3"
        let scientific = format!("{n:e}");
        let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
        let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
        let exponent: i32 = exponent.parse().unwrap_or(0);
        place_decimal_point(&digits, exponent + 1)
    }
}

/// Lay out `digits` with the decimal point after `point` of them, switching
/// to exponent notation outside `1e-7 < n < 1e21`
fn place_decimal_point(digits: &str, point: i32) -> String {
    let len = digits.len() as i32;
    if len <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let exponent = point - 1;
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exponent.unsigned_abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exponent.unsigned_abs())
        }
    }
}

/// JSON number for `n`, integral values without a fraction, non-finite as `null`
pub fn json_number(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<TemplateResult> for Value {
    fn from(result: TemplateResult) -> Self {
        Value::Template(result)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl From<Directive> for Value {
    fn from(directive: Directive) -> Self {
        Value::Directive(directive)
    }
}

impl From<Callback> for Value {
    fn from(callback: Callback) -> Self {
        Value::Function(callback)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
