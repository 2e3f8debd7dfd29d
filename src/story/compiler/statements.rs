//! One function per statement rule. Each returns the instructions of its statement:
//! one for simple statements, the block's own plus its body's for blocks.

use super::{values, CompileError, Compiler};
use crate::story::ir::{Argument, Instruction, Line, Method, Script};
use crate::story::tree::{Child, Tree};

fn single(instruction: Instruction) -> Result<Script, CompileError> {
    let mut script = Script::new();
    script
        .insert(instruction)
        .map_err(CompileError::DuplicateLine)?;
    Ok(script)
}

fn required<'t>(tree: &'t Tree, data: &str) -> Result<&'t Tree, CompileError> {
    tree.subtree(data)
        .ok_or_else(|| CompileError::missing(tree, data))
}

/// `path = value`
pub fn assignments(compiler: &Compiler, tree: &Tree) -> Result<Script, CompileError> {
    let path = values::path(required(tree, "path")?);
    let value = values::values(required(tree, "values")?)?;
    single(
        Instruction::new(Method::Set, compiler.line(tree)?)
            .with_args(vec![Argument::Value(path), Argument::Value(value)]),
    )
}

/// `container value* (as name, ...)?`
pub fn command(compiler: &Compiler, tree: &Tree) -> Result<Script, CompileError> {
    let container = tree
        .child(0)
        .and_then(Child::as_token)
        .ok_or_else(|| CompileError::missing(tree, "NAME"))?;

    let args = tree
        .trees()
        .filter(|t| t.data == "values")
        .map(|t| values::values(t).map(Argument::Value))
        .collect::<Result<Vec<_>, _>>()?;

    let output = tree.subtree("output").map(|output| {
        output
            .children
            .iter()
            .filter_map(Child::as_token)
            .filter(|token| token.is("NAME"))
            .map(|token| token.text.clone())
            .collect::<Vec<_>>()
    });

    let mut instruction = Instruction::new(Method::Run, compiler.line(tree)?);
    instruction.container = Some(container.text.clone());
    instruction.args = (!args.is_empty()).then_some(args);
    instruction.output = output;
    single(instruction)
}

/// `next \`file\``
pub fn next(compiler: &Compiler, tree: &Tree) -> Result<Script, CompileError> {
    let file = tree
        .token("FILEPATH")
        .ok_or_else(|| CompileError::missing(tree, "FILEPATH"))?;
    single(
        Instruction::new(Method::Next, compiler.line(tree)?)
            .with_args(vec![Argument::Value(values::file(file))]),
    )
}

/// `if condition` with a body.
pub fn if_block(compiler: &Compiler, tree: &Tree) -> Result<Script, CompileError> {
    let statement = required(tree, "if_statement")?;
    let condition = match (statement.subtree("boolean"), statement.subtree("path")) {
        (Some(boolean), _) => values::boolean(boolean)?,
        (None, Some(path)) => values::path(path),
        (None, None) => return Err(CompileError::missing(statement, "path")),
    };
    let instruction = Instruction::new(Method::If, compiler.line(tree)?)
        .with_args(vec![Argument::Value(condition)]);
    block(compiler, tree, instruction)
}

/// `for name in path` with a body.
pub fn for_block(compiler: &Compiler, tree: &Tree) -> Result<Script, CompileError> {
    let statement = required(tree, "for_statement")?;
    let variable = statement
        .token("NAME")
        .ok_or_else(|| CompileError::missing(statement, "NAME"))?;
    let iterable = values::path(required(statement, "path")?);
    let instruction = Instruction::new(Method::For, compiler.line(tree)?).with_args(vec![
        Argument::Name(variable.text.clone()),
        Argument::Value(iterable),
    ]);
    block(compiler, tree, instruction)
}

/// Compile the body and bracket it with `enter` and `exit`.
fn block(
    compiler: &Compiler,
    tree: &Tree,
    mut instruction: Instruction,
) -> Result<Script, CompileError> {
    let body = tree
        .body
        .as_deref()
        .ok_or_else(|| CompileError::missing(tree, "nested_block"))?;
    let nested = compiler.parse_tree(body)?;
    instruction.enter = nested.first_line();
    instruction.exit = nested.last_line().map(|Line(last)| Line(last + 1));

    let mut script = single(instruction)?;
    script
        .merge(nested)
        .map_err(CompileError::DuplicateLine)?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::ir::{Envelope, Value};
    use crate::story::token::Token;

    fn tok(kind: &str, text: &str, line: usize) -> Child {
        Child::Token(Token::new(kind, text, line, 1, 0..text.len()))
    }

    fn tree(data: &str, children: Vec<Child>) -> Child {
        Child::Tree(Tree::new(data, children))
    }

    fn path(name: &str, line: usize) -> Child {
        tree("path", vec![tok("NAME", name, line)])
    }

    #[test]
    fn test_command_without_args() {
        let command = Tree::new("command", vec![tok("NAME", "alpine", 1)]);
        let script = command_script(&command);
        let instruction = script.get(1).unwrap();
        assert_eq!(instruction.method, Method::Run);
        assert_eq!(instruction.container.as_deref(), Some("alpine"));
        assert_eq!(instruction.args, None);
        assert_eq!(instruction.output, None);
    }

    fn command_script(tree: &Tree) -> Script {
        command(&Compiler::new(), tree).unwrap()
    }

    #[test]
    fn test_command_with_args_and_output() {
        let command = Tree::new(
            "command",
            vec![
                tok("NAME", "alpine", 2),
                tree("values", vec![path("echo", 2)]),
                tree(
                    "output",
                    vec![tok("AS", "as", 2), tok("NAME", "a", 2), tok("NAME", "b", 2)],
                ),
            ],
        );
        let script = command_script(&command);
        let instruction = script.get(2).unwrap();
        assert_eq!(instruction.args.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            instruction.output,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_next() {
        let next_tree = Tree::new(
            "next",
            vec![tok("NEXT", "next", 1), tok("FILEPATH", "`other.story`", 1)],
        );
        let script = next(&Compiler::new(), &next_tree).unwrap();
        assert_eq!(
            script.get(1).unwrap().args,
            Some(vec![Argument::Value(Value::Envelope(Envelope::File {
                string: "other.story".into()
            }))])
        );
    }

    #[test]
    fn test_block_without_body_is_an_error() {
        let block = Tree::new(
            "if_block",
            vec![tree("if_statement", vec![tok("IF", "if", 1), path("x", 1)])],
        );
        assert!(matches!(
            if_block(&Compiler::new(), &block),
            Err(CompileError::MissingNode { .. })
        ));
    }

    #[test]
    fn test_if_block_brackets_body() {
        let body = Tree::new(
            "nested_block",
            vec![tree(
                "line",
                vec![tree("command", vec![tok("NAME", "alpine", 2)])],
            )],
        );
        let block = Tree::new(
            "if_block",
            vec![tree("if_statement", vec![tok("IF", "if", 1), path("ready", 1)])],
        )
        .with_body(body);
        let script = if_block(&Compiler::new(), &block).unwrap();
        let instruction = script.get(1).unwrap();
        assert_eq!(instruction.args, Some(vec![Argument::Value(Value::path(["ready"]))]));
        assert_eq!(instruction.enter, Some(Line(2)));
        assert_eq!(instruction.exit, Some(Line(3)));
        assert_eq!(script.len(), 2);
    }
}
