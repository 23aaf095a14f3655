//! Parsed templates and template results
//!
//! A [`Template`] is the immutable, cacheable analysis of a list of static
//! fragments. A [`TemplateResult`] pairs a template with the values of one
//! particular render.

mod parser;
pub mod part;
mod source;

pub use part::{AttributePart, Part, PartKind, TextPart};
pub use source::TemplateSource;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::TemplateError;
use crate::value::Value;

/// Static strings and the parts between them.
///
/// `strings.len() == parts.len() + 1`. Slots after a merged attribute part are
/// `None` in both lists; their values belong to that part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    strings: Vec<Option<String>>,
    parts: Vec<Option<Part>>,
}

impl Template {
    pub fn strings(&self) -> &[Option<String>] {
        &self.strings
    }

    pub fn parts(&self) -> &[Option<Part>] {
        &self.parts
    }

    /// Number of values a result of this template must carry
    pub fn slot_count(&self) -> usize {
        self.parts.len()
    }
}

/// A template together with the values for one render
#[derive(Debug, Clone)]
pub struct TemplateResult {
    template: Result<Rc<Template>, TemplateError>,
    values: Vec<Value>,
}

impl TemplateResult {
    pub fn new(template: Rc<Template>, values: Vec<Value>) -> Self {
        Self {
            template: Ok(template),
            values,
        }
    }

    /// Build a result from fragments with `'static` identity, parsing them at
    /// most once per thread. Used by [`html!`](crate::html!).
    pub fn from_static(fragments: &'static [&'static str], values: Vec<Value>) -> Self {
        let template = DEFAULT_CACHE.with(|cache| cache.get_or_parse(fragments));
        Self { template, values }
    }

    /// Build a result from a cache the caller owns
    pub fn with_cache(
        cache: &TemplateCache,
        fragments: &'static [&'static str],
        values: Vec<Value>,
    ) -> Self {
        Self {
            template: cache.get_or_parse(fragments),
            values,
        }
    }

    /// The parsed template, or the error that parsing it produced
    pub fn template(&self) -> Result<&Rc<Template>, TemplateError> {
        self.template.as_ref().map_err(Clone::clone)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn into_parts(self) -> (Result<Rc<Template>, TemplateError>, Vec<Value>) {
        (self.template, self.values)
    }

    pub(crate) fn from_parts(template: Result<Rc<Template>, TemplateError>, values: Vec<Value>) -> Self {
        Self { template, values }
    }
}

/// Parsed templates keyed by the address of their fragment list
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RefCell<HashMap<(usize, usize), Rc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached template for `fragments`, parsing it on first use.
    /// Failed parses are not cached.
    pub fn get_or_parse(
        &self,
        fragments: &'static [&'static str],
    ) -> Result<Rc<Template>, TemplateError> {
        let key = (fragments.as_ptr() as usize, fragments.len());
        if let Some(template) = self.templates.borrow().get(&key) {
            tracing::trace!(fragments = fragments.len(), "template cache hit");
            return Ok(Rc::clone(template));
        }

        let template = Rc::new(Template::parse(fragments)?);
        self.templates.borrow_mut().insert(key, Rc::clone(&template));
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.templates.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.borrow().is_empty()
    }
}

thread_local! {
    static DEFAULT_CACHE: TemplateCache = TemplateCache::new();
}

/// Build a [`TemplateResult`] from literal fragments and values.
///
/// ```
/// use tagged_ssr::{html, resolve_to_string};
///
/// let name = "world";
/// let page = html!(["<p>Hello ", "!</p>"], name);
/// assert_eq!(resolve_to_string(&page).unwrap(), "<p>Hello world!</p>");
/// ```
#[macro_export]
macro_rules! html {
    ([$($fragment:literal),+ $(,)?] $(, $value:expr)* $(,)?) => {{
        static FRAGMENTS: &[&str] = &[$($fragment),+];
        $crate::TemplateResult::from_static(
            FRAGMENTS,
            ::std::vec![$($crate::Value::from($value)),*],
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    static FRAGMENTS: &[&str] = &["<p>", "</p>"];

    #[test]
    fn test_cache_reuses_templates() {
        let cache = TemplateCache::new();
        let a = cache.get_or_parse(FRAGMENTS).unwrap();
        let b = cache.get_or_parse(FRAGMENTS).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_skips_failed_parses() {
        static BROKEN: &[&str] = &["<a title=\"", ">"];
        let cache = TemplateCache::new();
        assert!(cache.get_or_parse(BROKEN).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_html_macro_reuses_call_site() {
        fn row(n: i32) -> TemplateResult {
            crate::html!(["<li>", "</li>"], n)
        }
        let first = row(1);
        let second = row(2);
        assert!(Rc::ptr_eq(first.template().unwrap(), second.template().unwrap()));
        assert_eq!(second.values().len(), 1);
    }

    #[test]
    fn test_failed_parse_is_carried_by_result() {
        let result = crate::html!(["<a title=\"", ">"], "x");
        assert!(matches!(
            result.template(),
            Err(TemplateError::UnterminatedAttribute { .. })
        ));
    }
}
