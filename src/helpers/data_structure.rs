/// Concatenate the grouped values of a map into one list, in the map's
/// iteration order.
///
/// ```
/// use std::collections::BTreeMap;
/// use cvtoolkit::helpers::flatten_groups;
///
/// let mut groups = BTreeMap::new();
/// groups.insert("group1", vec!["male-25", "female-30"]);
/// groups.insert("group2", vec!["male-22"]);
/// assert_eq!(flatten_groups(groups), vec!["male-25", "female-30", "male-22"]);
/// ```
pub fn flatten_groups<K, T, I>(groups: I) -> Vec<T>
where
    I: IntoIterator<Item = (K, Vec<T>)>,
{
    groups.into_iter().flat_map(|(_, items)| items).collect()
}
