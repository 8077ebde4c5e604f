// `ok!` and `some!` are less bloaty alternatives to the standard library's try operator (`?`).
// Since we do not need type conversions in this crate we can fall back to much easier match
// patterns that compile faster and produce less bloaty code.

macro_rules! ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => return Err(err),
        }
    };
}

macro_rules! some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => return None,
        }
    };
}

/// Hidden utility module for the [`context!`](crate::context!) macro.
#[doc(hidden)]
pub mod __context {
    use crate::value::{Value, ValueMap};

    #[inline(always)]
    pub fn make() -> ValueMap {
        ValueMap::default()
    }

    #[inline(always)]
    pub fn add(ctx: &mut ValueMap, key: &'static str, value: Value) {
        ctx.insert(key.into(), value);
    }

    #[inline(always)]
    pub fn build(ctx: ValueMap) -> Value {
        Value::Map(ctx)
    }
}

/// Creates a model from keys and values.
///
/// ```rust
/// # use sauce::context;
/// let ctx = context!{
///     name => "Peter",
///     location => "World",
/// };
/// ```
///
/// Alternatively if the variable name matches the key name it can
/// be omitted:
///
/// ```rust
/// # use sauce::context;
/// let name = "Peter";
/// let ctx = context!{ name };
/// ```
///
/// The return value is a [`Value`](crate::value::Value) map which implements
/// [`Model`](crate::Model) and can be passed to
/// [`Template::render`](crate::Template::render) directly.  Values are
/// converted with [`Value::from_serialize`](crate::value::Value::from_serialize)
/// so anything that implements `Serialize` can be placed into it.  The macro
/// can also be nested:
///
/// ```rust
/// # use sauce::context;
/// let ctx = context! {
///     nav => vec![
///         context!(path => "/", title => "Index"),
///         context!(path => "/downloads", title => "Downloads"),
///     ]
/// };
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::__context::build($crate::__context::make())
    };
    (
        $($key:ident $(=> $value:expr)?),* $(,)?
    ) => {{
        let mut ctx = $crate::__context::make();
        $(
            $crate::__context_pair!(ctx, $key $(=> $value)?);
        )*
        $crate::__context::build(ctx)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! __context_pair {
    ($ctx:ident, $key:ident) => {{
        $crate::__context_pair!($ctx, $key => $key);
    }};
    ($ctx:ident, $key:ident => $value:expr) => {
        $crate::__context::add(
            &mut $ctx,
            stringify!($key),
            $crate::value::Value::from_serialize(&$value),
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::value::Value;

    use similar_asserts::assert_eq;

    #[test]
    fn test_context() {
        let name = "Peter";
        let ctx = context! { name, age => 42 };
        assert_eq!(ctx.get_path("name"), Some(Value::from("Peter")));
        assert_eq!(ctx.get_path("age"), Some(Value::from(42)));
    }

    #[test]
    fn test_nested_context() {
        let ctx = context! {
            nav => vec![context!(title => "Index"), context!(title => "Downloads")]
        };
        assert_eq!(
            ctx.get_path("nav.1.title"),
            Some(Value::from("Downloads"))
        );
    }

    #[test]
    fn test_empty_context() {
        let ctx = context!();
        assert_eq!(ctx.len(), Some(0));
    }
}
