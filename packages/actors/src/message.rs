//! Message envelope exchanged between actors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use actor_core::StopCause;

use crate::Actor;

/// A single element of a [`Message`].
///
/// Payload typing is up to the caller: common scalars have their own
/// variants, anything else travels as an opaque shared value.
#[derive(Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    Actor(Actor),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wrap an arbitrary value.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    /// The string, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The JSON document, if this is a [`Value::Json`].
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    /// The actor handle, if this is a [`Value::Actor`].
    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            Value::Actor(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow an opaque value as `T`, if that is what it holds.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Json(v) => write!(f, "{}", v),
            Value::Actor(a) => write!(f, "Actor({})", a.name()),
            Value::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Actor(a), Value::Actor(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl From<Actor> for Value {
    fn from(value: Actor) -> Self {
        Value::Actor(value)
    }
}

impl From<&Actor> for Value {
    fn from(value: &Actor) -> Self {
        Value::Actor(value.clone())
    }
}

/// Notification that a monitored actor stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Down {
    pub cause: StopCause,
    pub actor: Actor,
}

/// Runtime-originated content of a message's reserved slot.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Tag {
    Down(Down),
}

/// An ordered sequence of values, plus a reserved slot for runtime tags.
///
/// Application code only ever builds untagged messages; the reserved slot is
/// filled by the runtime itself (for example when delivering [`Down`]), so an
/// application value can never be mistaken for a control tag.
#[derive(Clone, Default, PartialEq)]
pub struct Message {
    tag: Option<Tag>,
    values: Vec<Value>,
}

impl Message {
    /// Create an application message.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            tag: None,
            values: values.into_iter().collect(),
        }
    }

    /// Create an application message with no values.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn tagged(tag: Tag) -> Self {
        Self {
            tag: Some(tag),
            values: Vec::new(),
        }
    }

    pub(crate) fn down(cause: StopCause, actor: Actor) -> Self {
        Self::tagged(Tag::Down(Down { cause, actor }))
    }

    /// The runtime tag, if the runtime produced this message.
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Whether the runtime produced this message.
    pub fn is_control(&self) -> bool {
        self.tag.is_some()
    }

    /// The [`Down`] notification carried by this message, if any.
    pub fn as_down(&self) -> Option<&Down> {
        match &self.tag {
            Some(Tag::Down(down)) => Some(down),
            None => None,
        }
    }

    /// Number of application values; the tag is not counted.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the message carries no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// String at `index`, if that value is one.
    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Integer at `index`, if that value is one.
    pub fn int_at(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_int)
    }

    /// Actor handle at `index`, if that value is one.
    pub fn actor_at(&self, index: usize) -> Option<&Actor> {
        self.get(index).and_then(Value::as_actor)
    }

    /// Iterate over the values in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// The values as a slice.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Take the values out of the message.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Message {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(Tag::Down(down)) => {
                write!(f, "Down({} {})", down.actor.name(), down.cause)
            }
            None => f.debug_list().entries(&self.values).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg;

    #[test]
    fn builds_messages_from_mixed_values() {
        let message = msg!["hi", 42, true, 1.5];
        assert_eq!(message.len(), 4);
        assert_eq!(message.str_at(0), Some("hi"));
        assert_eq!(message.int_at(1), Some(42));
        assert_eq!(message.get(2).and_then(Value::as_bool), Some(true));
        assert_eq!(message.get(3).and_then(Value::as_float), Some(1.5));
        assert!(message.get(4).is_none());
        assert!(!message.is_control());
        assert!(message.as_down().is_none());
    }

    #[test]
    fn empty_message_has_no_values() {
        let message = msg![];
        assert!(message.is_empty());
        assert_eq!(format!("{:?}", message), "[]");
    }

    #[test]
    fn opaque_values_downcast() {
        #[derive(Debug, PartialEq)]
        struct Point(i32, i32);

        let value = Value::opaque(Point(1, 2));
        assert_eq!(value.downcast_ref::<Point>(), Some(&Point(1, 2)));
        assert!(value.downcast_ref::<String>().is_none());
        assert!(value.as_str().is_none());
        assert_eq!(value, value.clone());
        assert_ne!(value, Value::opaque(Point(1, 2)));
    }

    #[test]
    fn json_values_round_trip_through_messages() {
        let payload = serde_json::json!({ "seconds": 5 });
        let message = msg![payload.clone()];
        assert_eq!(message.get(0).and_then(Value::as_json), Some(&payload));
    }
}
