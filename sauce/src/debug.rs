use std::fmt::Write;

use crate::compiler::ast::{NodeId, SyntaxTree};

/// Dumps the node types of a tree, one node per line.
///
/// Every line is indented with one tab per nesting level.  If `contents`
/// is set the content of each node is appended.
pub fn dump_tree(tree: &SyntaxTree, contents: bool) -> String {
    let mut rv = String::new();
    dump_node(tree, tree.root(), contents, 0, &mut rv);
    rv
}

fn dump_node(tree: &SyntaxTree, id: NodeId, contents: bool, indent: usize, rv: &mut String) {
    let node = &tree[id];
    for _ in 0..indent {
        rv.push('\t');
    }
    write!(rv, "{}", node.kind()).ok();
    if contents {
        write!(rv, ": {:?}", node.content).ok();
    }
    rv.push('\n');
    for &child in &node.children {
        dump_node(tree, child, contents, indent + 1, rv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::compiler::parser::parse;
    use crate::syntax::Syntax;

    use similar_asserts::assert_eq;

    #[test]
    fn test_dump() {
        let tree = parse(
            "a{% if(x) %}{% x %}{% else %}b{% end %}",
            &Syntax::default(),
        )
        .unwrap();
        assert_eq!(
            dump_tree(&tree, false),
            "Root\n\tText\n\tIf\n\t\tValue\n\tElse\n\t\tText\n\tEnd\n"
        );
        assert_eq!(
            dump_tree(&tree, true),
            "Root: \"\"\n\tText: \"a\"\n\tIf: \"if(x)\"\n\t\tValue: \"x\"\n\tElse: \"else\"\n\t\tText: \"b\"\n\tEnd: \"end\"\n"
        );
    }
}
