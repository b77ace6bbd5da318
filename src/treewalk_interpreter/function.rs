use super::errors::{InterpreterError, RuntimeResult};
use super::interpreter::Interpreter;
use super::object::Value;
use super::scope::Scope;
use crate::playground_frontend::grammar::AstNode;

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

pub struct FunctionData {
    name: String,
    params: Vec<String>,
    body: Rc<AstNode>,
}

#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

impl Function {
    pub fn new(name: String, params: Vec<String>, body: Rc<AstNode>) -> Self {
        let data = FunctionData { name, params, body };
        Function(Rc::new(data))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn params(&self) -> &[String] {
        &self.0.params
    }

    pub fn arity(&self) -> usize {
        self.0.params.len()
    }

    /// The body, shared with the tree the function was defined in.
    pub fn body(&self) -> &Rc<AstNode> {
        &self.0.body
    }

    /// Calls the function in a fresh frame pushed on top of the caller's
    /// scopes.
    pub fn execute<W: Write>(
        &self,
        args: Vec<Value>,
        interpreter: &mut Interpreter<W>,
    ) -> RuntimeResult<Value> {
        let frame = Scope::new(format!("func_scope_{}", self.0.name));
        self.execute_in(frame, args, interpreter)
    }

    /// Binds the arguments into `frame` and runs the body with `frame` as
    /// the innermost scope. Constructors pass the new instance here so the
    /// parameters land on it.
    pub fn execute_in<W: Write>(
        &self,
        frame: Scope,
        args: Vec<Value>,
        interpreter: &mut Interpreter<W>,
    ) -> RuntimeResult<Value> {
        if args.len() != self.arity() {
            return Err(InterpreterError::WrongArity {
                name: self.0.name.clone(),
                expected: vec![self.arity()],
                found: args.len(),
            });
        }

        for (param, arg) in self.0.params.iter().zip(args.into_iter()) {
            frame.define(param, arg);
        }

        interpreter.push_scope(frame);
        let result = interpreter.exec(self.body());
        interpreter.pop_scope();
        result
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let params: Vec<_> = self.0.params.iter().map(|p| format!("'{}'", p)).collect();
        write!(
            f,
            "<Function: {}, params: [{}] >",
            self.0.name,
            params.join(", ")
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<function {}/{}>", self.0.name, self.arity())
    }
}

impl PartialEq<Function> for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Function {}

/// Every function sharing one name in one scope, keyed by arity.
#[derive(Debug, PartialEq, Clone)]
pub struct OverloadSet {
    name: String,
    by_arity: BTreeMap<usize, Function>,
}

impl OverloadSet {
    pub fn new(name: &str) -> Self {
        OverloadSet {
            name: name.to_owned(),
            by_arity: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `function`, replacing any overload of the same arity.
    pub fn insert(&mut self, function: Function) {
        self.by_arity.insert(function.arity(), function);
    }

    pub fn get(&self, arity: usize) -> Option<&Function> {
        self.by_arity.get(&arity)
    }

    pub fn arities(&self) -> Vec<usize> {
        self.by_arity.keys().copied().collect()
    }

    /// Picks the overload to call with `arity` arguments.
    pub fn select(&self, arity: usize) -> RuntimeResult<Function> {
        self.get(arity)
            .cloned()
            .ok_or_else(|| InterpreterError::WrongArity {
                name: self.name.clone(),
                expected: self.arities(),
                found: arity,
            })
    }
}

impl fmt::Display for OverloadSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.by_arity.len() == 1 {
            if let Some(function) = self.by_arity.values().next() {
                return write!(f, "{}", function);
            }
        }

        let entries: Vec<_> = self
            .by_arity
            .iter()
            .map(|(arity, function)| format!("{}: {}", arity, function))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground_frontend::grammar::NodeKind;

    fn function(name: &str, params: &[&str]) -> Function {
        Function::new(
            name.to_owned(),
            params.iter().map(|p| p.to_string()).collect(),
            Rc::new(AstNode::synthetic(NodeKind::Statements)),
        )
    }

    #[test]
    fn test_overload_selection() {
        let mut set = OverloadSet::new("FooClass");
        set.insert(function("FooClass", &[]));
        set.insert(function("FooClass", &["a"]));

        assert_eq!(set.arities(), vec![0, 1]);
        assert_eq!(set.select(1).unwrap().params(), ["a"]);
        assert_eq!(
            set.select(2),
            Err(InterpreterError::WrongArity {
                name: "FooClass".to_owned(),
                expected: vec![0, 1],
                found: 2,
            })
        );
    }

    #[test]
    fn test_redefinition_replaces_same_arity() {
        let mut set = OverloadSet::new("f");
        let first = function("f", &["a"]);
        let second = function("f", &["b"]);
        set.insert(first.clone());
        set.insert(second.clone());

        assert_eq!(set.arities(), vec![1]);
        assert_eq!(set.get(1), Some(&second));
        assert_ne!(set.get(1), Some(&first));
    }

    #[test]
    fn test_display() {
        let mut set = OverloadSet::new("add");
        set.insert(function("add", &["a", "b"]));
        assert_eq!(set.to_string(), "<Function: add, params: ['a', 'b'] >");

        set.insert(function("add", &[]));
        assert_eq!(
            set.to_string(),
            "{0: <Function: add, params: [] >, 2: <Function: add, params: ['a', 'b'] >}"
        );
    }
}
