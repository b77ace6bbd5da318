use super::errors::{InterpreterError, RuntimeResult};
use super::function::{Function, OverloadSet};
use super::object::Value;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ScopeKind {
    Block,
    ClassDefinition,
    Instance,
}

struct ScopeData {
    name: String,
    depth: usize,
    kind: ScopeKind,
    symbols: HashMap<String, Value>,
    // Names in first-definition order.
    order: Vec<String>,
}

/// A shared symbol table. Blocks, call frames, class definitions and
/// class instances are all scopes.
#[derive(Clone)]
pub struct Scope(Rc<RefCell<ScopeData>>);

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Scope::with_kind(name.into(), ScopeKind::Block)
    }

    pub fn class_definition(name: impl Into<String>) -> Self {
        Scope::with_kind(name.into(), ScopeKind::ClassDefinition)
    }

    fn with_kind(name: String, kind: ScopeKind) -> Self {
        let data = ScopeData {
            name,
            depth: 0,
            kind,
            symbols: HashMap::new(),
            order: vec![],
        };
        Scope(Rc::new(RefCell::new(data)))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn kind(&self) -> ScopeKind {
        self.0.borrow().kind
    }

    pub fn is_definition(&self) -> bool {
        self.kind() == ScopeKind::ClassDefinition
    }

    pub fn is_instance(&self) -> bool {
        self.kind() == ScopeKind::Instance
    }

    pub fn depth(&self) -> usize {
        self.0.borrow().depth
    }

    pub fn set_depth(&self, depth: usize) {
        self.0.borrow_mut().depth = depth;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().symbols.get(name).cloned()
    }

    /// Binds `name`, overwriting an existing binding in place.
    pub fn define(&self, name: &str, value: Value) {
        let mut data = self.0.borrow_mut();
        if data.symbols.insert(name.to_owned(), value).is_none() {
            data.order.push(name.to_owned());
        }
    }

    /// Registers `function` as one more arity overload of its name in this
    /// scope. A non-function binding of the same name is replaced.
    pub fn add_overload(&self, function: Function) {
        let mut overloads = match self.get(function.name()) {
            Some(Value::Overloads(set)) => set,
            _ => OverloadSet::new(function.name()),
        };
        let name = function.name().to_owned();
        overloads.insert(function);
        self.define(&name, Value::Overloads(overloads));
    }

    pub fn overloads(&self, name: &str) -> Option<OverloadSet> {
        match self.get(name) {
            Some(Value::Overloads(set)) => Some(set),
            _ => None,
        }
    }

    /// Data attributes in definition order. Methods and nested class
    /// definitions are left out; instances held as attributes are kept.
    pub fn attrs(&self) -> Vec<(String, Value)> {
        let data = self.0.borrow();
        data.order
            .iter()
            .filter_map(|name| match data.symbols.get(name) {
                Some(Value::Overloads(_)) | None => None,
                Some(Value::Class(class)) if class.is_definition() => None,
                Some(value) => Some((name.clone(), value.clone())),
            })
            .collect()
    }

    /// Creates a fresh instance of this class. Nested class values are
    /// copied too, keeping their own kind.
    pub fn instantiate(&self) -> RuntimeResult<Scope> {
        let instance = self.deep_copy(&mut vec![])?;
        instance.0.borrow_mut().kind = ScopeKind::Instance;
        Ok(instance)
    }

    fn deep_copy(&self, visiting: &mut Vec<*const RefCell<ScopeData>>) -> RuntimeResult<Scope> {
        let ptr = Rc::as_ptr(&self.0);
        if visiting.contains(&ptr) {
            return Err(InterpreterError::CyclicClass(self.name()));
        }
        visiting.push(ptr);

        let data = self.0.borrow();
        let copy = Scope::with_kind(data.name.clone(), data.kind);
        for name in data.order.iter() {
            let value = match data.symbols.get(name) {
                Some(Value::Class(nested)) => Value::Class(nested.deep_copy(visiting)?),
                Some(value) => value.clone(),
                None => continue,
            };
            copy.define(name, value);
        }

        visiting.pop();
        Ok(copy)
    }
}

impl PartialEq<Scope> for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let data = self.0.borrow();
        write!(f, "<{:?} {} at depth {}>", data.kind, data.name, data.depth)
    }
}

impl Scope {
    /// Renders the scope and, recursively, any instances among its
    /// attributes. A scope already being rendered shows up as `...`.
    fn describe(&self, visiting: &mut Vec<*const RefCell<ScopeData>>) -> String {
        let ptr = Rc::as_ptr(&self.0);
        if visiting.contains(&ptr) {
            return "...".to_owned();
        }
        visiting.push(ptr);

        let attrs: Vec<_> = self
            .attrs()
            .iter()
            .map(|(name, value)| match value {
                Value::Class(scope) => format!("'{}': {}", name, scope.describe(visiting)),
                value => format!("'{}': {}", name, value.repr()),
            })
            .collect();
        visiting.pop();

        let attrs = format!("{{{}}}", attrs.join(", "));
        match self.kind() {
            ScopeKind::ClassDefinition => {
                format!("<Class Definition: {}, attrs: {} >", self.name(), attrs)
            }
            ScopeKind::Instance => {
                format!("<Instance of Class: {}, attrs: {} >", self.name(), attrs)
            }
            ScopeKind::Block => format!("<Scope: {}, attrs: {} >", self.name(), attrs),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.describe(&mut vec![]))
    }
}

/// The live path of scopes from the globals to the innermost block. Name
/// lookup walks it from the top down, so callers' bindings are visible to
/// callees.
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn new(globals: Scope) -> Self {
        globals.set_depth(0);
        ScopeStack {
            frames: vec![globals],
        }
    }

    pub fn globals(&self) -> &Scope {
        &self.frames[0]
    }

    pub fn top(&self) -> &Scope {
        &self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn push(&mut self, scope: Scope) {
        scope.set_depth(self.top().depth() + 1);
        self.frames.push(scope);
    }

    /// Pops the innermost scope. The globals are never popped.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.frames.iter().rev().find_map(|scope| scope.get(name))
    }

    /// The innermost scope already binding `name`.
    pub fn resolve_scope(&self, name: &str) -> Option<&Scope> {
        self.frames.iter().rev().find(|scope| scope.contains(name))
    }

    /// The innermost class instance on the stack, which is what `this`
    /// refers to.
    pub fn enclosing_instance(&self) -> Option<&Scope> {
        self.frames.iter().rev().find(|scope| scope.is_instance())
    }

    /// One line per live scope, innermost last.
    pub fn render(&self) -> String {
        self.frames
            .iter()
            .map(|scope| format!("{}{:?}", "| ".repeat(scope.depth()), scope))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground_frontend::grammar::{AstNode, NodeKind};

    fn method(name: &str, arity: usize) -> Function {
        Function::new(
            name.to_owned(),
            (0..arity).map(|i| format!("p{}", i)).collect(),
            Rc::new(AstNode::synthetic(NodeKind::Statements)),
        )
    }

    #[test]
    fn test_define_keeps_first_order() {
        let scope = Scope::new("globals");
        scope.define("b", Value::Int(1));
        scope.define("a", Value::Int(2));
        scope.define("b", Value::Int(3));

        assert_eq!(
            scope.attrs(),
            vec![("b".to_owned(), Value::Int(3)), ("a".to_owned(), Value::Int(2))]
        );
    }

    #[test]
    fn test_stack_resolution() {
        let globals = Scope::new("globals");
        globals.define("a", Value::Int(10));
        let mut stack = ScopeStack::new(globals.clone());

        let inner = Scope::new("block");
        inner.define("b", Value::Int(5));
        stack.push(inner.clone());

        assert_eq!(stack.depth(), 1);
        assert_eq!(inner.depth(), 1);
        assert_eq!(stack.resolve("a"), Some(Value::Int(10)));
        assert_eq!(stack.resolve("b"), Some(Value::Int(5)));
        assert_eq!(stack.resolve_scope("a"), Some(&globals));
        assert_eq!(stack.resolve_scope("missing"), None);

        assert_eq!(stack.pop(), Some(inner));
        assert_eq!(stack.resolve("b"), None);
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.top(), &globals);
    }

    #[test]
    fn test_instances_are_independent() {
        let class = Scope::class_definition("Point");
        class.define("x", Value::None);
        class.add_overload(method("Point", 2));

        let first = class.instantiate().unwrap();
        let second = class.instantiate().unwrap();
        first.define("x", Value::Int(10));

        assert!(class.is_definition());
        assert!(first.is_instance());
        assert_eq!(second.get("x"), Some(Value::None));
        assert_eq!(class.get("x"), Some(Value::None));
        assert_eq!(first.overloads("Point").map(|o| o.arities()), Some(vec![2]));
    }

    #[test]
    fn test_nested_classes_are_copied() {
        let outer = Scope::class_definition("Outer");
        let inner = Scope::class_definition("Inner");
        inner.define("ai", Value::Int(234));
        outer.define("a", Value::Int(0));
        outer.define("Inner", Value::Class(inner.clone()));

        let instance = outer.instantiate().unwrap();
        let copied = match instance.get("Inner") {
            Some(Value::Class(scope)) => scope,
            other => panic!("unexpected {:?}", other),
        };
        assert_ne!(copied, inner);
        assert!(copied.is_definition());
        assert_eq!(instance.to_string(), "<Instance of Class: Outer, attrs: {'a': 0} >");
    }

    #[test]
    fn test_cyclic_class_is_rejected() {
        let class = Scope::class_definition("A");
        class.define("me", Value::Class(class.clone()));
        assert_eq!(
            class.instantiate(),
            Err(InterpreterError::CyclicClass("A".to_owned()))
        );
        // Break the cycle so the test does not leak.
        class.define("me", Value::None);
    }

    #[test]
    fn test_instance_attributes_are_listed() {
        let child = Scope::class_definition("Q").instantiate().unwrap();
        child.define("v", Value::Int(1));
        let parent = Scope::class_definition("P").instantiate().unwrap();
        parent.define("child", Value::Class(child));
        parent.define("n", Value::Int(2));

        assert_eq!(
            parent.to_string(),
            "<Instance of Class: P, attrs: \
             {'child': <Instance of Class: Q, attrs: {'v': 1} >, 'n': 2} >"
        );
    }

    #[test]
    fn test_self_reference_is_elided() {
        let a = Scope::class_definition("A").instantiate().unwrap();
        a.define("n", Value::Int(1));
        a.define("me", Value::Class(a.clone()));
        assert_eq!(a.to_string(), "<Instance of Class: A, attrs: {'n': 1, 'me': ...} >");
        a.define("me", Value::None);
    }

    #[test]
    fn test_display() {
        let class = Scope::class_definition("Foo");
        class.define("a", Value::Str("x".to_owned()));
        class.define("b", Value::Float(1.0));
        assert_eq!(
            class.to_string(),
            "<Class Definition: Foo, attrs: {'a': 'x', 'b': 1.0} >"
        );
    }
}
