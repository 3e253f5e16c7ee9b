//! Merging extension tags across grafted trees.

use std::collections::HashSet;

use celmut_ast::{Extension, Version};

/// Union of two tag lists, deduplicated by `(name, version)`.
///
/// The first occurrence of a tag wins and keeps its position.
pub fn merge_extensions(first: &[Extension], second: &[Extension]) -> Vec<Extension> {
    let mut seen: HashSet<(String, Version)> = HashSet::new();
    first
        .iter()
        .chain(second)
        .filter(|ext| seen.insert((ext.name.clone(), ext.version)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use celmut_ast::Component;

    use super::*;

    #[test]
    fn test_merge_dedupes_by_name_and_version() {
        let host = vec![
            Extension::new("bindings", Version::new(1, 0)).with_components([Component::Parser]),
            Extension::new("strings", Version::new(2, 0)),
        ];
        let donor = vec![
            Extension::new("bindings", Version::new(1, 0)).with_components([Component::Runtime]),
            Extension::new("strings", Version::new(2, 1)),
        ];
        let merged = merge_extensions(&host, &donor);
        let tags: Vec<_> = merged
            .iter()
            .map(|ext| format!("{}@{}", ext.name, ext.version))
            .collect();
        assert_eq!(tags, vec!["bindings@1.0", "strings@2.0", "strings@2.1"]);
        assert_eq!(merged[0].affected_components, vec![Component::Parser]);
    }

    #[test]
    fn test_merge_dedupes_within_one_side() {
        let tags = vec![
            Extension::new("math", Version::new(0, 1)),
            Extension::new("math", Version::new(0, 1)),
        ];
        assert_eq!(merge_extensions(&tags, &[]).len(), 1);
        assert_eq!(merge_extensions(&[], &tags).len(), 1);
    }
}
