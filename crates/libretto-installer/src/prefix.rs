//! Archive path-prefix detection (§4.3 step 3).
//!
//! Archives produced by common hosting sources wrap all content in a single
//! top-level folder (`libA-1.2.0/package.json`, `libA-1.2.0/source/...`).
//! The installer strips that wrapper before materializing, so the
//! on-disk layout is always `<root>/modules/<name>/...` regardless of how
//! the archive was packed.

use libretto_archive::ArchiveMember;

/// Find the package prefix among `members`: the parent path of the unique
/// member whose basename is `package.json`, or — if there is no such
/// unique member — the deepest common ancestor of every member's path.
#[must_use]
pub fn find_prefix(members: &[ArchiveMember]) -> String {
    let manifest_matches: Vec<&str> = members
        .iter()
        .filter(|m| m.is_file() && basename(&m.path) == "package.json")
        .map(|m| m.path.as_str())
        .collect();

    if let [only] = manifest_matches[..] {
        return parent_of(only);
    }

    deepest_common_ancestor(members)
}

fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn deepest_common_ancestor(members: &[ArchiveMember]) -> String {
    let component_lists: Vec<Vec<&str>> = members
        .iter()
        .map(|m| m.path.trim_end_matches('/').split('/').collect())
        .filter(|c: &Vec<&str>| !c.is_empty())
        .collect();

    let Some(shortest_len) = component_lists.iter().map(Vec::len).min() else {
        return String::new();
    };

    let mut common_len = 0;
    'outer: for i in 0..shortest_len {
        let candidate = component_lists[0][i];
        for list in &component_lists[1..] {
            if list[i] != candidate {
                break 'outer;
            }
        }
        common_len = i + 1;
    }

    // If the common prefix consumes an entire member's path, that member is
    // itself a file/leaf, not a directory boundary — back off by one so the
    // prefix names a directory, not a file.
    if common_len == shortest_len && common_len > 0 {
        common_len -= 1;
    }

    component_lists[0][..common_len].join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use libretto_archive::MemberKind;

    fn member(path: &str, kind: MemberKind) -> ArchiveMember {
        ArchiveMember { path: path.to_string(), kind }
    }

    #[test]
    fn unique_manifest_member_sets_prefix() {
        let members = vec![
            member("libA-1.0.0/", MemberKind::Dir),
            member("libA-1.0.0/package.json", MemberKind::File),
            member("libA-1.0.0/source/index.js", MemberKind::File),
        ];
        assert_eq!(find_prefix(&members), "libA-1.0.0");
    }

    #[test]
    fn no_manifest_member_falls_back_to_common_ancestor() {
        let members = vec![
            member("libA-1.0.0/source/index.js", MemberKind::File),
            member("libA-1.0.0/source/helper.js", MemberKind::File),
            member("libA-1.0.0/views/main.html", MemberKind::File),
        ];
        assert_eq!(find_prefix(&members), "libA-1.0.0");
    }

    #[test]
    fn no_common_wrapper_yields_empty_prefix() {
        let members = vec![member("package.json", MemberKind::File), member("index.js", MemberKind::File)];
        assert_eq!(find_prefix(&members), "");
    }

    #[test]
    fn multiple_manifest_members_fall_back_to_common_ancestor() {
        let members = vec![
            member("libA-1.0.0/package.json", MemberKind::File),
            member("libA-1.0.0/vendor/other/package.json", MemberKind::File),
        ];
        assert_eq!(find_prefix(&members), "libA-1.0.0");
    }
}
