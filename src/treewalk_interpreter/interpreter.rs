use super::errors::{InterpreterError, RuntimeResult};
use super::function::Function;
use super::object::Value;
use super::reader::{FsReader, SourceReader};
use super::scope::{Scope, ScopeStack};
use crate::playground_frontend::grammar::{ArithOperator, AstNode, CompareOperator, NodeKind};
use crate::playground_frontend::Parser;
use crate::PlaygroundError;

use log::{debug, error, trace, warn};
use std::io::{self, Write};

const THIS_STR: &str = "this";

pub struct Interpreter<W: Write> {
    scopes: ScopeStack,
    output: W,
    reader: Box<dyn SourceReader>,
    testing: bool,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Interpreter::new_with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn new_with_output(output: W) -> Self {
        Interpreter {
            scopes: ScopeStack::new(Scope::new("globals")),
            output,
            reader: Box::new(FsReader),
            testing: false,
        }
    }

    /// Swaps the collaborator `import` reads modules through.
    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// In testing mode syntax errors are returned instead of reported.
    pub fn set_testing(&mut self, testing: bool) {
        self.testing = testing;
    }

    pub fn globals(&self) -> &Scope {
        self.scopes.globals()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Parses and runs a whole program against the globals.
    pub fn interp(&mut self, source: &str) -> Result<(), PlaygroundError> {
        let mut parser = Parser::new(source);
        parser.set_testing(self.testing);

        if let Some(root) = parser.program()? {
            self.run_program(&root)?;
        }
        Ok(())
    }

    /// Runs the top-level statements of `root` directly in the current
    /// scope, without a block scope of their own.
    pub fn run_program(&mut self, root: &AstNode) -> RuntimeResult<Value> {
        #[cfg(feature = "trace-execution")]
        debug!("Program tree:\n{}", root.to_string_tree());

        let mut result = Value::None;
        for statement in root.children.iter() {
            result = self.exec(statement)?;
        }
        Ok(result)
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
        debug!("Pushed scope {:?}", self.scopes.top());
        trace!("Live scopes:\n{}", self.scopes.render());
    }

    pub fn pop_scope(&mut self) {
        match self.scopes.pop() {
            Some(scope) => debug!("Popped scope {:?}", scope),
            None => warn!("Attempted to pop the global scope"),
        }
    }

    /// Evaluates one node. An unsupported node is reported and evaluates
    /// to `None`; every other error propagates.
    pub fn exec(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        trace!("exec {:?} `{}`", node.kind, node.text());
        match self.dispatch(node) {
            Err(InterpreterError::UnsupportedOperation(what)) => {
                error!("{}", unsupported_report(node, &what));
                Ok(Value::None)
            }
            result => result,
        }
    }

    fn dispatch(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        match node.kind {
            NodeKind::Statements => self.exec_block(node),
            NodeKind::Print => self.exec_print(node),
            NodeKind::Import => self.exec_import(node),
            NodeKind::Assign => self.exec_assign(node),
            NodeKind::If | NodeKind::Elif => self.exec_conditional(node),
            NodeKind::While => self.exec_while(node),
            NodeKind::Def => self.exec_def(node),
            NodeKind::Class => self.exec_class_def(node),
            NodeKind::Return => self.exec(child(node, 0)?),
            NodeKind::Call => self.exec_call(node),
            NodeKind::Dot => self.exec_dotted(node),
            NodeKind::And => self.exec_and(node),
            NodeKind::Or => self.exec_or(node),
            NodeKind::Compare(op) => self.exec_compare(op, node),
            NodeKind::Arith(op) => self.exec_arith(op, node),
            NodeKind::Name => self.load(node),
            NodeKind::Int => node
                .text()
                .parse()
                .map(Value::Int)
                .map_err(|_| InterpreterError::InvalidLiteral(node.text().to_owned())),
            NodeKind::Float => node
                .text()
                .parse()
                .map(Value::Float)
                .map_err(|_| InterpreterError::InvalidLiteral(node.text().to_owned())),
            NodeKind::Str => Ok(Value::Str(node.text().to_owned())),
            NodeKind::Bool => Ok(Value::Bool(node.text() == "True")),
            NodeKind::ArgList | NodeKind::IdList => Err(InterpreterError::UnsupportedOperation(
                node.synthetic_name().unwrap_or_default().to_owned(),
            )),
        }
    }

    /// Runs a block in its own scope. Evaluates to the value of the last
    /// statement run; `return` does not stop the block early.
    fn exec_block(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        self.push_scope(Scope::new(""));
        let result = self.exec_statements(node);
        self.pop_scope();
        result
    }

    fn exec_statements(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let mut result = Value::None;
        for statement in node.children.iter() {
            result = self.exec(statement)?;
        }
        Ok(result)
    }

    fn exec_print(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let mut line = String::new();
        if let Some(args) = node.child(0) {
            for arg in args.children.iter() {
                line.push_str(&self.exec(arg)?.to_string());
            }
        }

        writeln!(self.output, "{}", line)?;
        Ok(Value::None)
    }

    /// Splices a module's top-level statements into the current scope.
    fn exec_import(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let path = child(node, 0)?.text();
        debug!("Importing {}", path);

        let source = self
            .reader
            .read(path)
            .map_err(|e| InterpreterError::ImportRead {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;

        let root = Parser::new(&source)
            .parse()
            .map_err(|error| InterpreterError::ImportSyntax {
                path: path.to_owned(),
                error,
            })?;

        self.exec_statements(&root)?;
        Ok(Value::None)
    }

    fn exec_assign(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let target = child(node, 0)?;
        let value = self.exec(child(node, 1)?)?;

        match target.kind {
            NodeKind::Dot => {
                let instance = self.eval_class(child(target, 0)?)?;
                instance.define(child(target, 1)?.text(), value);
            }
            _ => {
                let name = target.text();
                // Assigning to an existing name mutates it where it lives.
                let scope = self
                    .scopes
                    .resolve_scope(name)
                    .unwrap_or_else(|| self.scopes.top())
                    .clone();
                scope.define(name, value);
            }
        }

        Ok(Value::None)
    }

    fn exec_conditional(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        if self.exec(child(node, 0)?)?.is_truthy() {
            self.exec(child(node, 1)?)?;
        } else if let Some(tail) = node.child(2) {
            self.exec(tail)?;
        }
        Ok(Value::None)
    }

    fn exec_while(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let test = child(node, 0)?;
        let block = child(node, 1)?;
        while self.exec(test)?.is_truthy() {
            self.exec(block)?;
        }
        Ok(Value::None)
    }

    fn make_function(&self, node: &AstNode) -> RuntimeResult<Function> {
        let name = child(node, 0)?.text().to_owned();
        let params = child(node, 1)?
            .children
            .iter()
            .map(|p| p.text().to_owned())
            .collect();
        let body = node.shared_child(2).ok_or_else(|| missing_child(node, 2))?;
        Ok(Function::new(name, params, body))
    }

    fn exec_def(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let function = self.make_function(node)?;
        self.scopes.top().add_overload(function);
        Ok(Value::None)
    }

    fn exec_class_def(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let class = self.build_class(node)?;
        self.scopes.top().define(&class.name(), Value::Class(class.clone()));
        Ok(Value::None)
    }

    /// Builds a class definition from its body. Attribute initialisers run
    /// in the defining scope.
    fn build_class(&mut self, node: &AstNode) -> RuntimeResult<Scope> {
        let class = Scope::class_definition(child(node, 0)?.text());

        for statement in child(node, 1)?.children.iter() {
            match statement.kind {
                NodeKind::Name => class.define(statement.text(), Value::None),
                NodeKind::Dot if is_this_attribute(statement) => {
                    class.define(child(statement, 1)?.text(), Value::None)
                }
                NodeKind::Assign => {
                    let target = child(statement, 0)?;
                    let name = match target.kind {
                        NodeKind::Name => target.text(),
                        NodeKind::Dot if is_this_attribute(target) => child(target, 1)?.text(),
                        _ => {
                            self.exec(statement)?;
                            continue;
                        }
                    };
                    let value = self.exec(child(statement, 1)?)?;
                    class.define(name, value);
                }
                NodeKind::Def => class.add_overload(self.make_function(statement)?),
                NodeKind::Class => {
                    let nested = self.build_class(statement)?;
                    class.define(&nested.name(), Value::Class(nested.clone()));
                }
                _ => {
                    self.exec(statement)?;
                }
            }
        }

        Ok(class)
    }

    fn exec_call(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let args = self.eval_args(node)?;
        let callee = self.load(node)?;
        self.call_value(node.text(), callee, args)
    }

    fn eval_args(&mut self, call: &AstNode) -> RuntimeResult<Vec<Value>> {
        let mut args = vec![];
        if let Some(arg_list) = call.child(0) {
            for arg in arg_list.children.iter() {
                args.push(self.exec(arg)?);
            }
        }
        Ok(args)
    }

    fn call_value(&mut self, name: &str, callee: Value, args: Vec<Value>) -> RuntimeResult<Value> {
        match callee {
            Value::Class(class) if class.is_definition() => self.instantiate(&class, args),
            Value::Overloads(overloads) => overloads.select(args.len())?.execute(args, self),
            _ => Err(InterpreterError::NotCallable(name.to_owned())),
        }
    }

    /// Copies the class and runs the constructor matching the argument
    /// count, with the new instance as its frame.
    fn instantiate(&mut self, class: &Scope, args: Vec<Value>) -> RuntimeResult<Value> {
        let instance = class.instantiate()?;
        let constructors = instance.overloads(&instance.name());

        match constructors.as_ref().and_then(|c| c.get(args.len())) {
            Some(constructor) => {
                constructor.execute_in(instance.clone(), args, self)?;
            }
            None if args.is_empty() => {
                debug!("No zero argument constructor for {}", instance.name());
            }
            None => {
                // A class without constructors only takes zero arguments.
                let expected = match constructors {
                    Some(constructors) => constructors.arities(),
                    None => vec![0],
                };
                return Err(InterpreterError::WrongArity {
                    name: instance.name(),
                    expected,
                    found: args.len(),
                });
            }
        }

        Ok(Value::Class(instance))
    }

    /// `a.b` and `a.b(...)`. The member is looked up on `a` itself and `a`
    /// is pushed as a scope for the duration of a call.
    fn exec_dotted(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let target = self.eval_class(child(node, 0)?)?;
        let member = child(node, 1)?;

        match member.kind {
            NodeKind::Call => {
                let args = self.eval_args(member)?;
                let callee = self.get_member(&target, member.text())?;

                self.push_scope(target);
                let result = self.call_value(member.text(), callee, args);
                self.pop_scope();
                result
            }
            _ => self.get_member(&target, member.text()),
        }
    }

    fn get_member(&self, target: &Scope, name: &str) -> RuntimeResult<Value> {
        target
            .get(name)
            .ok_or_else(|| InterpreterError::MissingAttribute {
                instance: target.to_string(),
                name: name.to_owned(),
            })
    }

    /// Evaluates the left side of a dotted expression, which must be a
    /// class definition or instance.
    fn eval_class(&mut self, node: &AstNode) -> RuntimeResult<Scope> {
        match self.exec(node)? {
            Value::Class(scope) => Ok(scope),
            other => Err(InterpreterError::NotAnInstance(other.to_string())),
        }
    }

    fn load(&self, node: &AstNode) -> RuntimeResult<Value> {
        let name = node.text();
        if name == THIS_STR {
            return self
                .scopes
                .enclosing_instance()
                .map(|scope| Value::Class(scope.clone()))
                .ok_or(InterpreterError::ThisOutsideInstance);
        }

        self.scopes
            .resolve(name)
            .ok_or_else(|| InterpreterError::UndefinedName(name.to_owned()))
    }

    fn exec_and(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let lhs = self.exec(child(node, 0)?)?;
        if lhs.equals(&Value::Bool(false)) {
            return Ok(Value::Bool(false));
        }

        let rhs = self.exec(child(node, 1)?)?;
        Ok(Value::Bool(rhs.equals(&Value::Bool(true))))
    }

    fn exec_or(&mut self, node: &AstNode) -> RuntimeResult<Value> {
        let lhs = self.exec(child(node, 0)?)?;
        if lhs.equals(&Value::Bool(true)) {
            return Ok(Value::Bool(true));
        }

        let rhs = self.exec(child(node, 1)?)?;
        Ok(Value::Bool(rhs.equals(&Value::Bool(true))))
    }

    fn exec_compare(&mut self, op: CompareOperator, node: &AstNode) -> RuntimeResult<Value> {
        let lhs = self.exec(child(node, 0)?)?;
        let rhs = self.exec(child(node, 1)?)?;
        Value::apply_compare(op, lhs, rhs)
    }

    fn exec_arith(&mut self, op: ArithOperator, node: &AstNode) -> RuntimeResult<Value> {
        let lhs = self.exec(child(node, 0)?)?;
        let rhs = self.exec(child(node, 1)?)?;
        Value::apply_arith(op, lhs, rhs)
    }
}

/// A child the grammar guarantees. Hand-built trees can still be missing
/// one, which is reported as an unsupported node.
fn child(node: &AstNode, index: usize) -> RuntimeResult<&AstNode> {
    node.child(index).ok_or_else(|| missing_child(node, index))
}

fn missing_child(node: &AstNode, index: usize) -> InterpreterError {
    InterpreterError::UnsupportedOperation(format!(
        "{:?} `{}` without child {}",
        node.kind,
        node.text(),
        index
    ))
}

/// Diagnostic for a recovered node: the offending subtree followed by the
/// reason.
fn unsupported_report(node: &AstNode, what: &str) -> String {
    format!("Problem executing\n{}Node {} not handled", node.to_string_tree(), what)
}

fn is_this_attribute(node: &AstNode) -> bool {
    node.kind == NodeKind::Dot
        && node.child(0).map_or(false, |lhs| lhs.text() == THIS_STR)
        && node.child(1).map_or(false, |rhs| rhs.kind == NodeKind::Name)
}
