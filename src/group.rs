use std::collections::HashMap;

/// Display name of the bucket that collects records without a group value.
/// Only a label: a real group with this name stays a separate group.
pub const UNGROUPED: &str = "Ungrouped";

/// A group and its members, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, T> {
    /// `None` for the ungrouped bucket.
    pub key: Option<String>,
    /// Legend name; [`UNGROUPED`] when `key` is `None`.
    pub name: String,
    pub members: Vec<&'a T>,
}

/// Normalize a raw group value: trimmed, blank counts as missing.
pub fn group_key(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Partition `items` by the value `select` returns.
///
/// Groups come back in the order their names first appear in the input,
/// which is the legend order the charts keep. Missing or blank names land in
/// the ungrouped bucket, shown as [`UNGROUPED`].
pub fn index_groups<'a, T, F>(items: &'a [T], select: F) -> Vec<Group<'a, T>>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut groups: Vec<Group<'a, T>> = Vec::new();
    let mut slots: HashMap<Option<String>, usize> = HashMap::new();
    for item in items {
        let key = group_key(select(item));
        let slot = match slots.get(&key) {
            Some(&i) => i,
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push(Group {
                    name: key.clone().unwrap_or_else(|| UNGROUPED.to_string()),
                    key,
                    members: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[slot].members.push(item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<T>(groups: &[Group<'_, T>]) -> Vec<String> {
        groups.iter().map(|g| g.name.clone()).collect()
    }

    #[test]
    fn keeps_first_encounter_order() {
        let input = vec!["UOB", "Awali", "UOB", "Refinery"];
        let groups = index_groups(&input, |s| Some(*s));
        assert_eq!(names(&groups), vec!["UOB", "Awali", "Refinery"]);
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn members_stay_in_input_order() {
        let input = vec![("B", 1), ("A", 2), ("B", 3)];
        let groups = index_groups(&input, |(g, _)| Some(*g));
        let values: Vec<i32> = groups[0].members.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 3]);
    }

    #[test]
    fn blank_and_missing_names_are_ungrouped() {
        let input: Vec<Option<&str>> = vec![Some("UOB"), None, Some("  "), Some("Awali")];
        let groups = index_groups(&input, |g| *g);
        assert_eq!(names(&groups), vec!["UOB", UNGROUPED, "Awali"]);
        assert_eq!(groups[1].members.len(), 2);
    }

    #[test]
    fn real_group_named_like_the_ungrouped_bucket_stays_separate() {
        let input: Vec<Option<&str>> = vec![Some(UNGROUPED), None, Some(UNGROUPED)];
        let groups = index_groups(&input, |g| *g);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.as_deref(), Some(UNGROUPED));
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].key, None);
        assert_eq!(groups[1].name, UNGROUPED);
        assert_eq!(groups[1].members.len(), 1);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let input: Vec<&str> = Vec::new();
        assert!(index_groups(&input, |s| Some(*s)).is_empty());
    }
}
