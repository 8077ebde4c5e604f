use crate::compiler::ast::{NodeId, NodeKind, SyntaxTree};
use crate::utils::{first_line_end, last_line_start};

/// Removes the whitespace that statement tags leave behind.
///
/// For every trimmable node the tail of the text node right before it (the
/// part after the last newline) and the head of the text node right after
/// it (up to and including the first newline) are inspected.  If both only
/// contain whitespace they are removed.  Neighbors are determined by the
/// document chain, not by the nesting, and a missing text neighbor on one
/// side does not prevent trimming the other side.
///
/// A tree is only ever trimmed once, trimming it again does nothing.
pub fn trim(tree: &mut SyntaxTree) {
    if tree.is_trimmed() {
        return;
    }
    tree.mark_trimmed();
    let order: Vec<NodeId> = tree.iter_preorder().map(|(id, _)| id).collect();
    for id in order {
        let node = &tree[id];
        if !node.kind().is_trimmable() {
            continue;
        }

        let prev = node.prev.filter(|&x| tree[x].kind() == NodeKind::Text);
        let next = node.next.filter(|&x| tree[x].kind() == NodeKind::Text);

        let start = prev.map(|prev| {
            let content = &tree[prev].content;
            let start = last_line_start(content);
            (prev, start, content[start..].trim().is_empty())
        });
        let end = next.map(|next| {
            let content = &tree[next].content;
            let end = first_line_end(content);
            (next, end, content[..end].trim().is_empty())
        });

        let eligible = start.map_or(true, |x| x.2) && end.map_or(true, |x| x.2);
        if !eligible {
            continue;
        }
        if let Some((prev, start, _)) = start {
            tree.get_mut(prev).content.truncate(start);
        }
        if let Some((next, end, _)) = end {
            tree.get_mut(next).content.drain(..end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::compiler::parser::parse;
    use crate::syntax::Syntax;

    use similar_asserts::assert_eq;

    fn texts(tree: &SyntaxTree) -> Vec<String> {
        tree.iter_chain()
            .filter(|(_, node)| node.kind() == NodeKind::Text)
            .map(|(_, node)| node.content.clone())
            .collect()
    }

    fn trimmed(source: &str) -> Vec<String> {
        let mut tree = parse(source, &Syntax::default()).unwrap();
        trim(&mut tree);
        texts(&tree)
    }

    #[test]
    fn test_trims_whitespace_before_tag_on_same_line() {
        assert_eq!(trimmed("{% foreach(u in us) %}{% u %} {% end %}"), vec![""]);
        assert_eq!(trimmed("{% if(x) %}{% u %};{% end %}"), vec![";"]);
        assert_eq!(trimmed("{% if(x) %}a {% end %} b"), vec!["a ", " b"]);
    }

    #[test]
    fn test_trims_statement_lines() {
        assert_eq!(
            trimmed("A\n{% if(true) %}\nB\n{% end %}\nC"),
            vec!["A\n", "B\n", "C"]
        );
    }

    #[test]
    fn test_trims_indentation() {
        assert_eq!(
            trimmed("<ul>\n  {% foreach(x in y) %}\n  <li>\n  {% end %}\n</ul>"),
            vec!["<ul>\n", "  <li>\n", "</ul>"]
        );
    }

    #[test]
    fn test_keeps_shared_lines() {
        assert_eq!(
            trimmed("A {% var x = 1 %}\nB"),
            vec!["A ", "\nB"]
        );
        assert_eq!(
            trimmed("A\n{% var x = 1 %} B"),
            vec!["A\n", " B"]
        );
    }

    #[test]
    fn test_values_are_not_trimmed() {
        assert_eq!(trimmed("A\n  {% x %}  \nB"), vec!["A\n  ", "  \nB"]);
    }

    #[test]
    fn test_one_sided_neighbors() {
        assert_eq!(trimmed("{% var x = 1 %}\nB"), vec!["B"]);
        assert_eq!(trimmed("A\n  {% var x = 1 %}"), vec!["A\n"]);
        assert_eq!(trimmed("{% x %}{% var y = 1 %}\nB"), vec!["B"]);
    }

    #[test]
    fn test_crlf() {
        assert_eq!(
            trimmed("A\r\n{% var x = 1 %}\r\nB"),
            vec!["A\r\n", "B"]
        );
    }

    #[test]
    fn test_trims_a_single_newline() {
        assert_eq!(trimmed("{% var x = 1 %}\n\n\nB"), vec!["\n\nB"]);
    }

    #[test]
    fn test_idempotent() {
        let source = "A\n  {% if(x) %}  \n  B\n{% else %}\nC\n  {% end %}\n{% debug(x) %}\nD";
        let mut tree = parse(source, &Syntax::default()).unwrap();
        trim(&mut tree);
        let once = texts(&tree);
        trim(&mut tree);
        assert_eq!(texts(&tree), once);

        let mut tree = parse("{% var x = 1 %}\n\n\nB", &Syntax::default()).unwrap();
        trim(&mut tree);
        trim(&mut tree);
        assert_eq!(texts(&tree), vec!["\n\nB"]);
    }
}
