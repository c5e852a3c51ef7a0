use gb_core::DEFAULT_USE_PREFIX;

/// Keywords that turn an inventory line into a currency change.
pub const DEFAULT_CURRENCY_KEYWORDS: &[&str] = &["золотых монет", "gold coins"];

/// Settings that affect how a script is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Chapter id prefix that marks a chapter as an item's use action.
    pub use_prefix: String,
    /// Lower-case phrases identifying money in `inv+` / `inv-` lines.
    pub currency_keywords: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            use_prefix: DEFAULT_USE_PREFIX.to_string(),
            currency_keywords: DEFAULT_CURRENCY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl CompileOptions {
    pub fn with_use_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.use_prefix = prefix.into().to_lowercase();
        self
    }

    pub fn with_currency_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.currency_keywords.push(keyword.into().to_lowercase());
        self
    }

    /// Whether a line mentions money rather than an item.
    pub fn is_currency(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.currency_keywords
            .iter()
            .any(|k| !k.is_empty() && line.contains(k.as_str()))
    }
}
