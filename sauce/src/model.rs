use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use crate::value::{Value, COUNT_KEY};

/// Gives the template engine access to the data it renders.
///
/// Whenever a key path is not bound in the scope stack of a render it is
/// resolved against the model.  A key path is a dotted sequence of keys
/// such as `user.address.city`.  Implementations return `None` if the
/// path cannot be resolved.
///
/// The engine never assumes a concrete representation of the model, so
/// applications can implement this trait for their own types:
///
/// ```
/// use sauce::{Model, Template, value::Value};
///
/// struct Env;
///
/// impl Model for Env {
///     fn resolve(&self, path: &str) -> Option<Value> {
///         std::env::var(path).ok().map(Value::from)
///     }
/// }
///
/// let tmpl = Template::new("{% SAUCE_DOES_NOT_EXIST %}");
/// assert_eq!(tmpl.render(&Env).unwrap(), "");
/// ```
///
/// Implementations are provided for [`Value`], [`serde_json::Value`], maps
/// of values and the unit type (an empty model).
pub trait Model {
    /// Resolves a dotted key path.
    fn resolve(&self, path: &str) -> Option<Value>;
}

fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

fn resolve_rest(value: Option<&Value>, rest: Option<&str>) -> Option<Value> {
    let value = some!(value);
    match rest {
        Some(rest) => value.get_path(rest),
        None => Some(value.clone()),
    }
}

impl Model for () {
    fn resolve(&self, _path: &str) -> Option<Value> {
        None
    }
}

impl Model for Value {
    fn resolve(&self, path: &str) -> Option<Value> {
        self.get_path(path)
    }
}

impl<S: BuildHasher> Model for HashMap<String, Value, S> {
    fn resolve(&self, path: &str) -> Option<Value> {
        let (head, rest) = split_path(path);
        resolve_rest(self.get(head), rest)
    }
}

impl Model for BTreeMap<String, Value> {
    fn resolve(&self, path: &str) -> Option<Value> {
        let (head, rest) = split_path(path);
        resolve_rest(self.get(head), rest)
    }
}

#[cfg(feature = "preserve_order")]
impl Model for crate::value::ValueMap {
    fn resolve(&self, path: &str) -> Option<Value> {
        let (head, rest) = split_path(path);
        resolve_rest(self.get(head), rest)
    }
}

impl Model for serde_json::Value {
    fn resolve(&self, path: &str) -> Option<Value> {
        let mut current = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let next = match current {
                serde_json::Value::Object(map) => map.get(segment),
                serde_json::Value::Array(items) => {
                    segment.parse::<usize>().ok().and_then(|idx| items.get(idx))
                }
                _ => None,
            };
            current = match next {
                Some(next) => next,
                None if segment == COUNT_KEY && segments.peek().is_none() => {
                    return Value::from(current.clone()).len().map(Value::from);
                }
                None => return None,
            };
        }
        Some(Value::from(current.clone()))
    }
}

impl<M: Model> Model for Option<M> {
    fn resolve(&self, path: &str) -> Option<Value> {
        self.as_ref().and_then(|model| model.resolve(path))
    }
}

impl<'a, M: Model + ?Sized> Model for &'a M {
    fn resolve(&self, path: &str) -> Option<Value> {
        (**self).resolve(path)
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn resolve(&self, path: &str) -> Option<Value> {
        (**self).resolve(path)
    }
}

impl<M: Model + ?Sized> Model for Rc<M> {
    fn resolve(&self, path: &str) -> Option<Value> {
        (**self).resolve(path)
    }
}

impl<M: Model + ?Sized> Model for Arc<M> {
    fn resolve(&self, path: &str) -> Option<Value> {
        (**self).resolve(path)
    }
}
