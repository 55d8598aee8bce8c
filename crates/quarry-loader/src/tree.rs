//! Directory tree assembly from a flat scan.

use quarry_core::{DirectoryNode, FileEntry};

fn insert(node: &mut DirectoryNode, segments: &[&str], prefix: &str, is_directory: bool) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let path = if prefix.is_empty() {
        head.to_string()
    } else {
        format!("{}/{}", prefix, head)
    };

    let leaf = rest.is_empty();
    let position = node.children.iter().position(|c| c.name == *head);
    let child = match position {
        Some(i) => &mut node.children[i],
        None => {
            let child = if leaf && !is_directory {
                DirectoryNode::file(*head, path.clone())
            } else {
                DirectoryNode::directory(*head, path.clone())
            };
            node.children.push(child);
            let last = node.children.len() - 1;
            &mut node.children[last]
        }
    };
    if !leaf {
        insert(child, rest, &path, is_directory);
    }
}

fn sort(node: &mut DirectoryNode) {
    node.children.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.cmp(&b.name))
    });
    for child in &mut node.children {
        sort(child);
    }
}

/// Builds a tree rooted at the worktree, directories first, then by name.
pub fn build_tree(root_name: &str, entries: &[FileEntry]) -> DirectoryNode {
    let mut root = DirectoryNode::directory(root_name, "");
    for entry in entries {
        let segments: Vec<&str> = entry.relative_path.split('/').collect();
        insert(&mut root, &segments, "", entry.is_directory);
    }
    sort(&mut root);
    root
}
