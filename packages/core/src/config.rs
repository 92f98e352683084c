use strand_dom::Document;

/// Configuration for a strand [`crate::Runtime`].
///
/// # Example
///
/// ```rust
/// use strand_core::{Config, Runtime};
///
/// let mut cfg = Config::default();
/// cfg.namespace("app");
/// let runtime = Runtime::new(cfg);
/// ```
#[derive(Clone)]
pub struct Config {
    pub(crate) namespace: String,
    pub(crate) document: Option<Document>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "x".to_string(),
            document: None,
        }
    }
}

impl Config {
    /// Set the prefix given to single-word component names.
    ///
    /// Custom element names must contain a hyphen, so a component declared as `counter` is registered as
    /// `<namespace>-counter`. Names that already contain a hyphen are left alone.
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = namespace.into();
        self
    }

    /// Declare components into an existing document instead of a fresh one.
    pub fn document(&mut self, document: Document) -> &mut Self {
        self.document = Some(document);
        self
    }
}
