use std::fmt;

use crate::model::Model;
use crate::value::{Value, ValueMap};

/// The scope stack of a single render.
///
/// Frames are searched innermost first.  Anything that is not bound in
/// any frame is resolved against the model.
pub struct Context<'m> {
    stack: Vec<ValueMap>,
    model: &'m dyn Model,
}

impl<'m> fmt::Debug for Context<'m> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stack.iter()).finish()
    }
}

impl<'m> Context<'m> {
    /// Creates a context without any frames.
    pub fn new(model: &'m dyn Model) -> Context<'m> {
        Context {
            stack: Vec::new(),
            model,
        }
    }

    /// Pushes a new empty frame.
    pub fn push_frame(&mut self) {
        self.stack.push(ValueMap::default());
    }

    /// Pops the innermost frame.
    pub fn pop_frame(&mut self) -> ValueMap {
        self.stack.pop().expect("pop from empty context stack")
    }

    /// Returns the number of frames.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drops all frames above the given depth.
    pub fn reset_depth(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    /// Looks up a key path.
    ///
    /// The first segment is looked up in the frames, the remaining
    /// segments are walked on the value found there.  If no frame binds
    /// the first segment the whole path goes to the model.
    pub fn load(&self, path: &str) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        for frame in self.stack.iter().rev() {
            if let Some(value) = frame.get(head) {
                return match rest {
                    Some(rest) => value.get_path(rest),
                    None => Some(value.clone()),
                };
            }
        }
        self.model.resolve(path)
    }

    /// Binds a name.
    ///
    /// If some frame already binds the name the value is replaced there,
    /// otherwise it is stored in the innermost frame.
    pub fn store(&mut self, name: &str, value: Value) {
        if let Some(frame) = self
            .stack
            .iter_mut()
            .rev()
            .find(|frame| frame.contains_key(name))
        {
            frame.insert(name.to_string(), value);
            return;
        }
        self.stack
            .last_mut()
            .expect("cannot store on empty stack")
            .insert(name.to_string(), value);
    }

    /// Removes a binding from the innermost frame that holds it.
    #[cfg_attr(not(feature = "unstable_machinery"), allow(dead_code))]
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let frame = some!(self
            .stack
            .iter_mut()
            .rev()
            .find(|frame| frame.contains_key(name)));
        #[cfg(feature = "preserve_order")]
        {
            frame.shift_remove(name)
        }
        #[cfg(not(feature = "preserve_order"))]
        {
            frame.remove(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_frames_shadow_outer_frames() {
        let mut ctx = Context::new(&());
        ctx.push_frame();
        ctx.store("a", Value::from(1));
        ctx.push_frame();
        assert_eq!(ctx.load("a"), Some(Value::from(1)));
        ctx.stack.last_mut().unwrap().insert("a".into(), Value::from(2));
        assert_eq!(ctx.load("a"), Some(Value::from(2)));
        ctx.pop_frame();
        assert_eq!(ctx.load("a"), Some(Value::from(1)));
    }

    #[test]
    fn test_store_updates_declaring_frame() {
        let mut ctx = Context::new(&());
        ctx.push_frame();
        ctx.store("a", Value::from(1));
        ctx.push_frame();
        ctx.store("a", Value::from(2));
        ctx.store("b", Value::from(3));
        ctx.pop_frame();
        assert_eq!(ctx.load("a"), Some(Value::from(2)));
        assert_eq!(ctx.load("b"), None);
    }

    #[test]
    fn test_falls_back_to_model() {
        let model = Value::from_serialize(&serde_json::json!({
            "user": {"name": "Peter"},
            "a": "model",
        }));
        let mut ctx = Context::new(&model);
        assert_eq!(ctx.load("user.name"), Some(Value::from("Peter")));
        ctx.push_frame();
        ctx.store("a", Value::from("frame"));
        assert_eq!(ctx.load("a"), Some(Value::from("frame")));
        assert_eq!(ctx.load("missing"), None);
    }

    #[test]
    fn test_paths_into_frames() {
        let mut ctx = Context::new(&());
        ctx.push_frame();
        ctx.store("item", Value::from_serialize(&serde_json::json!({"tags": ["x"]})));
        assert_eq!(ctx.load("item.tags.0"), Some(Value::from("x")));
        assert_eq!(ctx.load("item.nope"), None);
    }

    #[test]
    fn test_remove() {
        let mut ctx = Context::new(&());
        ctx.push_frame();
        ctx.store("a", Value::from(1));
        ctx.push_frame();
        assert_eq!(ctx.remove("a"), Some(Value::from(1)));
        assert_eq!(ctx.load("a"), None);
        assert_eq!(ctx.remove("a"), None);
    }

    #[test]
    fn test_reset_depth() {
        let mut ctx = Context::new(&());
        ctx.push_frame();
        ctx.push_frame();
        ctx.push_frame();
        ctx.reset_depth(1);
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    #[should_panic = "pop from empty context stack"]
    fn test_pop_empty() {
        Context::new(&()).pop_frame();
    }
}
