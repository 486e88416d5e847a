//! Tree merging across discovery strategies.
//!
//! Each strategy produces an independent tree for the same CLI.
//! [`merge_trees`] unions them into one tree without mutating any input: the
//! first tree is deep-copied as the base and later trees only add what the
//! base is missing.
//!
//! # Example
//!
//! ```
//! use treemand_core::*;
//!
//! let mut a = Node::new(vec!["tool".into()]);
//! a.flags.push(Flag::new("--verbose"));
//!
//! let mut b = Node::new(vec!["tool".into()]);
//! b.flags.push(Flag::new("--verbose").with_description("ignored"));
//! b.flags.push(Flag::new("--quiet"));
//!
//! let merged = merge_trees(&[a, b]).unwrap();
//! assert_eq!(merged.flags.len(), 2);
//! assert_eq!(merged.flags[0].description, "");
//! ```

use std::collections::HashSet;

use crate::Node;

/// Unions `trees` into a single tree.
///
/// Returns `None` for an empty slice and a deep copy of the only tree for a
/// one-element slice. For scalar fields the first non-empty value wins;
/// flags and positionals are de-duplicated by name, first occurrence kept;
/// children are matched by name and merged recursively, unmatched children
/// appended in order.
pub fn merge_trees(trees: &[Node]) -> Option<Node> {
    let (first, rest) = trees.split_first()?;
    let mut base = first.clone();
    for tree in rest {
        merge_into(&mut base, tree);
    }
    Some(base)
}

fn merge_into(dst: &mut Node, src: &Node) {
    // A stub only carries the failure reason; real help from another
    // strategy replaces it.
    if !dst.discovered && src.discovered {
        dst.discovered = true;
        dst.description = src.description.clone();
        dst.help_text = src.help_text.clone();
    }
    if dst.description.is_empty() && !src.description.is_empty() {
        dst.description = src.description.clone();
    }
    if dst.help_text.is_empty() && !src.help_text.is_empty() {
        dst.help_text = src.help_text.clone();
    }

    let mut seen: HashSet<String> = dst.flags.iter().map(|f| f.name.clone()).collect();
    for flag in &src.flags {
        if seen.insert(flag.name.clone()) {
            dst.flags.push(flag.clone());
        }
    }

    let mut seen: HashSet<String> = dst.positionals.iter().map(|p| p.name.clone()).collect();
    for positional in &src.positionals {
        if seen.insert(positional.name.clone()) {
            dst.positionals.push(positional.clone());
        }
    }

    for src_child in &src.children {
        match dst.children.iter_mut().find(|c| c.name == src_child.name) {
            Some(dst_child) => merge_into(dst_child, src_child),
            None => dst.children.push(src_child.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Flag, Positional};

    fn node(parts: &[&str]) -> Node {
        Node::new(parts.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_merge_empty_is_none() {
        assert!(merge_trees(&[]).is_none());
    }

    #[test]
    fn test_merge_single_is_copy() {
        let mut tree = node(&["git"]);
        tree.children.push(node(&["git", "log"]));
        let merged = merge_trees(std::slice::from_ref(&tree)).unwrap();
        assert_eq!(merged, tree);
    }

    #[test]
    fn test_merge_dedups_flags_keeping_first() {
        let mut a = node(&["tool"]);
        a.flags.push(Flag::new("--verbose").with_description("from a"));
        let mut b = node(&["tool"]);
        b.flags.push(Flag::new("--verbose").with_description("from b"));

        let merged = merge_trees(&[a, b]).unwrap();
        assert_eq!(merged.flags.len(), 1);
        assert_eq!(merged.flags[0].description, "from a");
    }

    #[test]
    fn test_merge_first_non_empty_description_wins() {
        let a = node(&["tool"]);
        let mut b = node(&["tool"]);
        b.description = "from b".into();
        let mut c = node(&["tool"]);
        c.description = "from c".into();

        let merged = merge_trees(&[a, b, c]).unwrap();
        assert_eq!(merged.description, "from b");
    }

    #[test]
    fn test_merge_recurses_into_matching_children() {
        let mut a = node(&["git"]);
        let mut remote_a = node(&["git", "remote"]);
        remote_a.children.push(node(&["git", "remote", "add"]));
        a.children.push(remote_a);

        let mut b = node(&["git"]);
        let mut remote_b = node(&["git", "remote"]);
        remote_b.children.push(node(&["git", "remote", "add"]));
        remote_b.children.push(node(&["git", "remote", "rename"]));
        remote_b.positionals.push(Positional::optional("name"));
        b.children.push(remote_b);
        b.children.push(node(&["git", "stash"]));

        let merged = merge_trees(&[a, b]).unwrap();
        let names: Vec<_> = merged.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["remote", "stash"]);
        let remote = merged.find("remote").unwrap();
        let sub: Vec<_> = remote.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(sub, vec!["add", "rename"]);
        assert_eq!(remote.positionals.len(), 1);
    }

    #[test]
    fn test_merge_discovered_node_replaces_stub() {
        let mut a = node(&["kubectl"]);
        a.children.push(Node::stub(
            vec!["kubectl".into(), "get".into()],
            "timed out",
        ));
        let mut b = node(&["kubectl"]);
        let mut get = node(&["kubectl", "get"]);
        get.description = "Display one or many resources".into();
        get.help_text = "Usage: kubectl get".into();
        b.children.push(get);

        let merged = merge_trees(&[a, b]).unwrap();
        let get = merged.find("get").unwrap();
        assert!(get.discovered);
        assert_eq!(get.description, "Display one or many resources");
        assert_eq!(get.help_text, "Usage: kubectl get");
    }

    #[test]
    fn test_merge_stub_does_not_override_discovered() {
        let mut a = node(&["tool"]);
        a.description = "real".into();
        let b = Node::stub(vec!["tool".into()], "timed out");

        let merged = merge_trees(&[a, b]).unwrap();
        assert!(merged.discovered);
        assert_eq!(merged.description, "real");
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let a = node(&["tool"]);
        let mut b = node(&["tool"]);
        b.flags.push(Flag::new("--x"));
        let inputs = vec![a.clone(), b.clone()];
        let _ = merge_trees(&inputs);
        assert_eq!(inputs[0], a);
        assert_eq!(inputs[1], b);
    }
}
