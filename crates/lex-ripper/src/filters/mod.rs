//! Filter units and the ordered chain that runs them.
//!
//! A run has two ordered stages:
//!
//! - **pre-filters** ([`TextFilter`]) rewrite the raw column text before it
//!   reaches the tokenizer
//! - **plugins** and **post-filters** ([`TokenFilter`]) rewrite the token list
//!   after tokenization; plugins run first, then post-filters
//!
//! Within a stage, units run strictly in registration order and each one
//! sees exactly what the previous one produced. A unit that fails aborts the
//! whole row; no partial result leaves the chain.
//!
//! Built-in units live in [`text`] and [`token`]. For one-off logic, wrap a
//! closure with [`FnTextFilter`] or [`FnTokenFilter`].

pub mod text;
pub mod token;

pub use text::{LowercaseText, NormalizeWhitespace, RegexReplace, StripUrls};
pub use token::{BaseForm, KeepPartsOfSpeech, MinLength, StopWords, Truncate, Uppercase};

use crate::error::{FilterStage, RipperError};
use crate::types::Token;

/// Failure raised by a single filter unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FilterError(String);

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Transformation applied to raw text before tokenization.
pub trait TextFilter: Send + Sync {
    fn apply(&self, text: String) -> Result<String, FilterError>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Transformation applied to the token list after tokenization.
///
/// A filter may drop, merge, rewrite or add tokens.
pub trait TokenFilter: Send + Sync {
    fn apply(&self, tokens: Vec<Token>) -> Result<Vec<Token>, FilterError>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Wrapper that implements [`TextFilter`] using a closure.
///
/// # Example
///
/// ```rust,ignore
/// ripper.add_pre_filter(FnTextFilter::new("trim", |text| Ok(text.trim().to_string())))?;
/// ```
pub struct FnTextFilter<F>
where
    F: Fn(String) -> Result<String, FilterError> + Send + Sync,
{
    name: String,
    callback: F,
}

impl<F> FnTextFilter<F>
where
    F: Fn(String) -> Result<String, FilterError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> TextFilter for FnTextFilter<F>
where
    F: Fn(String) -> Result<String, FilterError> + Send + Sync,
{
    fn apply(&self, text: String) -> Result<String, FilterError> {
        (self.callback)(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrapper that implements [`TokenFilter`] using a closure.
pub struct FnTokenFilter<F>
where
    F: Fn(Vec<Token>) -> Result<Vec<Token>, FilterError> + Send + Sync,
{
    name: String,
    callback: F,
}

impl<F> FnTokenFilter<F>
where
    F: Fn(Vec<Token>) -> Result<Vec<Token>, FilterError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> TokenFilter for FnTokenFilter<F>
where
    F: Fn(Vec<Token>) -> Result<Vec<Token>, FilterError> + Send + Sync,
{
    fn apply(&self, tokens: Vec<Token>) -> Result<Vec<Token>, FilterError> {
        (self.callback)(tokens)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Filter units handed to a ripper in one go, each list in execution order.
///
/// This is how a program that drives whole runs through
/// [`run`](crate::pipeline::run) contributes its own units.
///
/// # Example
///
/// ```rust,ignore
/// let filters = FilterSet::new()
///     .pre_filter(NormalizeWhitespace)
///     .plugin(KeepPartsOfSpeech::new(["noun"], false))
///     .post_filter(BaseForm);
/// let summary = run(&config, filters, Arc::new(LogProgressReporter))?;
/// ```
#[derive(Default)]
pub struct FilterSet {
    pub pre_filters: Vec<Box<dyn TextFilter>>,
    pub plugins: Vec<Box<dyn TokenFilter>>,
    pub post_filters: Vec<Box<dyn TokenFilter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre_filter(mut self, filter: impl TextFilter + 'static) -> Self {
        self.pre_filters.push(Box::new(filter));
        self
    }

    pub fn plugin(mut self, plugin: impl TokenFilter + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn post_filter(mut self, filter: impl TokenFilter + 'static) -> Self {
        self.post_filters.push(Box::new(filter));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre_filters.is_empty() && self.plugins.is_empty() && self.post_filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pre_filters.len() + self.plugins.len() + self.post_filters.len()
    }
}

impl std::fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pre: Vec<&str> = self.pre_filters.iter().map(|u| u.name()).collect();
        let plugins: Vec<&str> = self.plugins.iter().map(|u| u.name()).collect();
        let post: Vec<&str> = self.post_filters.iter().map(|u| u.name()).collect();
        f.debug_struct("FilterSet")
            .field("pre_filters", &pre)
            .field("plugins", &plugins)
            .field("post_filters", &post)
            .finish()
    }
}

/// Ordered pre-filters, plugins and post-filters of one run.
///
/// Registration is refused once the chain is frozen.
#[derive(Default)]
pub struct FilterChain {
    pre_filters: Vec<Box<dyn TextFilter>>,
    plugins: Vec<Box<dyn TokenFilter>>,
    post_filters: Vec<Box<dyn TokenFilter>>,
    frozen: bool,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_pre_filter(&mut self, filter: Box<dyn TextFilter>) -> bool {
        if self.frozen {
            return false;
        }
        self.pre_filters.push(filter);
        true
    }

    pub(crate) fn add_plugin(&mut self, plugin: Box<dyn TokenFilter>) -> bool {
        if self.frozen {
            return false;
        }
        self.plugins.push(plugin);
        true
    }

    pub(crate) fn add_post_filter(&mut self, filter: Box<dyn TokenFilter>) -> bool {
        if self.frozen {
            return false;
        }
        self.post_filters.push(filter);
        true
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Names of all units in execution order.
    pub fn unit_names(&self) -> Vec<String> {
        self.pre_filters
            .iter()
            .map(|f| f.name())
            .chain(self.token_stage().map(|f| f.name()))
            .map(str::to_string)
            .collect()
    }

    fn token_stage(&self) -> impl Iterator<Item = &Box<dyn TokenFilter>> {
        self.plugins.iter().chain(self.post_filters.iter())
    }

    /// Run every pre-filter over `text`. `row` is only used for errors.
    pub fn apply_pre(&self, text: String, row: u64) -> Result<String, RipperError> {
        self.pre_filters.iter().try_fold(text, |text, filter| {
            filter.apply(text).map_err(|source| RipperError::Filter {
                stage: FilterStage::Pre,
                name: filter.name().to_string(),
                row,
                source,
            })
        })
    }

    /// Run plugins, then post-filters, over `tokens`.
    pub fn apply_post(&self, tokens: Vec<Token>, row: u64) -> Result<Vec<Token>, RipperError> {
        self.token_stage().try_fold(tokens, |tokens, filter| {
            filter.apply(tokens).map_err(|source| RipperError::Filter {
                stage: FilterStage::Post,
                name: filter.name().to_string(),
                row,
                source,
            })
        })
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("units", &self.unit_names())
            .field("frozen", &self.frozen)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| Token::unknown(*w)).collect()
    }

    fn surfaces(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.surface.clone()).collect()
    }

    #[test]
    fn test_filter_set_keeps_order_per_stage() {
        let set = FilterSet::new()
            .post_filter(Truncate::new(3))
            .pre_filter(FnTextFilter::new("trim", |t: String| Ok(t.trim().to_string())))
            .plugin(Uppercase)
            .post_filter(StopWords::new(["x"]));

        assert_eq!(set.len(), 4);
        assert!(FilterSet::new().is_empty());
        assert_eq!(
            format!("{set:?}"),
            "FilterSet { pre_filters: [\"trim\"], plugins: [\"uppercase\"], \
             post_filters: [\"truncate\", \"stopwords\"] }"
        );
    }

    #[test]
    fn test_pre_filters_run_in_registration_order() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(Box::new(FnTextFilter::new("a", |t| Ok(format!("{t}a")))));
        chain.add_pre_filter(Box::new(FnTextFilter::new("b", |t| Ok(format!("{t}b")))));

        assert_eq!(chain.apply_pre("x".to_string(), 1).unwrap(), "xab");
    }

    #[test]
    fn test_plugins_run_before_post_filters() {
        let mut chain = FilterChain::new();
        chain.add_post_filter(Box::new(Truncate::new(3)));
        chain.add_plugin(Box::new(Uppercase));

        assert_eq!(chain.unit_names(), vec!["uppercase", "truncate"]);
        let out = chain.apply_post(tokens(&["house"]), 1).unwrap();
        assert_eq!(surfaces(&out), vec!["HOU"]);
    }

    #[test]
    fn test_non_commutative_post_filters_depend_on_order() {
        let stretch = || {
            FnTokenFilter::new("stretch", |tokens: Vec<Token>| {
                Ok(tokens
                    .into_iter()
                    .map(|mut t| {
                        t.surface = format!("{}!!", t.surface);
                        t
                    })
                    .collect())
            })
        };

        let mut first = FilterChain::new();
        first.add_post_filter(Box::new(stretch()));
        first.add_post_filter(Box::new(Truncate::new(3)));

        let mut second = FilterChain::new();
        second.add_post_filter(Box::new(Truncate::new(3)));
        second.add_post_filter(Box::new(stretch()));

        let input = tokens(&["cat", "house"]);
        let a = first.apply_post(input.clone(), 1).unwrap();
        let b = second.apply_post(input, 1).unwrap();

        assert_eq!(surfaces(&a), vec!["cat", "hou"]);
        assert_eq!(surfaces(&b), vec!["cat!!", "hou!!"]);
    }

    #[test]
    fn test_failing_unit_stops_the_chain() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(Box::new(FnTextFilter::new("reject", |_| {
            Err(FilterError::new("nope"))
        })));
        chain.add_pre_filter(Box::new(FnTextFilter::new("never", |_| {
            panic!("must not run after a failure")
        })));

        let err = chain.apply_pre("x".to_string(), 4).unwrap_err();
        assert_eq!(err.error_code(), "FILTER_ERROR");
        assert!(err.to_string().contains("pre-filter 'reject' failed at row 4"));
    }

    #[test]
    fn test_frozen_chain_refuses_registration() {
        let mut chain = FilterChain::new();
        chain.freeze();
        assert!(!chain.add_pre_filter(Box::new(NormalizeWhitespace)));
        assert!(!chain.add_plugin(Box::new(Uppercase)));
        assert!(!chain.add_post_filter(Box::new(MinLength::new(1))));
        assert!(chain.unit_names().is_empty());
    }

    #[test]
    fn test_same_input_same_output() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(Box::new(LowercaseText));
        chain.add_post_filter(Box::new(StopWords::new(["the"])));

        let text = chain.apply_pre("The House".to_string(), 1).unwrap();
        let once = chain.apply_post(tokens(&text.split(' ').collect::<Vec<_>>()), 1);
        let twice = chain.apply_post(tokens(&text.split(' ').collect::<Vec<_>>()), 1);
        assert_eq!(once.unwrap(), twice.unwrap());
    }
}
