//! Declared properties and the coercion rules applied to attribute text.
//!
//! Each property a component declares has a default value. The default's variant fixes the property's
//! [`PropKind`] once, at declaration time, and the kind decides how attribute text is interpreted:
//!
//! - `Number`: parsed as a float. Text that doesn't parse is kept as a string.
//! - `Boolean`: present means `true` unless the text is `"false"`; absent means `false`.
//! - `String`: taken as is.
//! - `Object`: only settable programmatically, attribute text is ignored.

use std::fmt::Display;

use serde_json::Value;

/// The kind of a declared property, inferred from its default value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Object,
}

/// The value of a component property.
#[derive(Clone, PartialEq, Debug)]
pub enum PropValue {
    String(String),
    Number(f64),
    Bool(bool),
    Object(Value),
}

/// What reflecting a value to its attribute should do.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum Reflection {
    Set(String),
    Remove,
    Skip,
}

impl PropValue {
    pub fn kind(&self) -> PropKind {
        match self {
            PropValue::String(_) => PropKind::String,
            PropValue::Number(_) => PropKind::Number,
            PropValue::Bool(_) => PropKind::Boolean,
            PropValue::Object(_) => PropKind::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Value> {
        match self {
            PropValue::Object(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn reflection(&self) -> Reflection {
        match self {
            PropValue::String(s) => Reflection::Set(s.clone()),
            PropValue::Number(n) => Reflection::Set(n.to_string()),
            PropValue::Bool(true) => Reflection::Set(String::new()),
            PropValue::Bool(false) => Reflection::Remove,
            PropValue::Object(_) => Reflection::Skip,
        }
    }
}

impl Display for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::String(s) => f.write_str(s),
            PropValue::Number(n) => write!(f, "{n}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Object(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

macro_rules! impl_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    PropValue::Number(value as f64)
                }
            }
        )*
    };
}

impl_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

/// Any JSON value. Numbers, strings and booleans map onto the scalar variants, everything else is an object.
impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => PropValue::String(s),
            Value::Bool(b) => PropValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(n) => PropValue::Number(n),
                None => PropValue::Object(Value::Number(n)),
            },
            other => PropValue::Object(other),
        }
    }
}

/// The properties a component declares, in declaration order, with their default values.
///
/// The names double as the component's observed attributes.
///
/// ```rust
/// use strand_core::DefaultProps;
///
/// let props = DefaultProps::new().prop("count", 0).prop("label", "clicks").prop("disabled", false);
/// assert_eq!(props.names().collect::<Vec<_>>(), ["count", "label", "disabled"]);
/// ```
#[derive(Clone, Default, Debug, PartialEq)]
pub struct DefaultProps {
    props: Vec<(String, PropValue)>,
}

impl DefaultProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property. Declaring the same name twice keeps the last default.
    pub fn prop(mut self, name: impl Into<String>, default: impl Into<PropValue>) -> Self {
        let name = name.into();
        let default = default.into();
        match self.props.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, value)) => *value = default,
            None => self.props.push((name, default)),
        }
        self
    }

    /// Declare every entry of a JSON object. Anything other than an object declares nothing.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            other => {
                tracing::warn!("default properties must be a JSON object, got {other}");
                Self::default()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.props
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn kind(&self, name: &str) -> Option<PropKind> {
        self.get(name).map(PropValue::kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.props.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.props.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for DefaultProps {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::default(), |props, (name, value)| props.prop(name, value))
    }
}

/// Interpret the attribute text of a declared property.
///
/// `attribute` is `None` when the attribute is absent. Removing a non-boolean attribute restores the default.
pub fn coerce(default: &PropValue, attribute: Option<&str>) -> PropValue {
    match (default.kind(), attribute) {
        (PropKind::Boolean, attribute) => PropValue::Bool(matches!(attribute, Some(text) if text != "false")),
        (PropKind::Object, _) | (_, None) => default.clone(),
        (PropKind::String, Some(text)) => PropValue::String(text.to_string()),
        (PropKind::Number, Some(text)) => match text.trim().parse::<f64>() {
            Ok(n) => PropValue::Number(n),
            Err(_) => {
                tracing::debug!("`{text}` is not a number, keeping it as a string");
                PropValue::String(text.to_string())
            }
        },
    }
}
