//! Stratified sampling of series ids.

use crate::error::Result;
use crate::utils::string_values;
use polars::prelude::*;
use rand::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Sample at most `n_per_category` series ids from every category.
///
/// Ids are partitioned by `category_col` first and each partition is sampled
/// independently, without replacement, with a generator seeded from
/// `random_state`. A category with fewer ids than requested contributes all
/// of them. Rows with a null id or category are ignored and repeated ids
/// within a category are counted once.
///
/// The returned ids are grouped by category (categories in sorted order);
/// within a category they are in draw order. Callers should treat the result
/// as a set.
pub fn sample_ids_by_category(
    metadata: &DataFrame,
    id_col: &str,
    category_col: &str,
    n_per_category: usize,
    random_state: u64,
) -> Result<Vec<String>> {
    info!(
        "Sampling {} series per category from {} metadata rows",
        n_per_category,
        metadata.height()
    );

    let ids = string_values(metadata, id_col)?;
    let categories = string_values(metadata, category_col)?;

    let mut partitions: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for (id, category) in ids.into_iter().zip(categories) {
        let (Some(id), Some(category)) = (id, category) else {
            continue;
        };
        if seen.insert((category.clone(), id.clone())) {
            partitions.entry(category).or_default().push(id);
        }
    }

    let mut sampled = Vec::new();
    for (category, members) in &partitions {
        let mut rng = StdRng::seed_from_u64(random_state);
        let take = members.len().min(n_per_category);
        let drawn: Vec<String> = members.choose_multiple(&mut rng, take).cloned().collect();
        debug!(
            "Category '{}': sampled {} of {} series",
            category,
            drawn.len(),
            members.len()
        );
        sampled.extend(drawn);
    }

    info!("Sampled {} total series", sampled.len());
    Ok(sampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metadata(categories: &[(&str, usize)]) -> DataFrame {
        let mut ids = Vec::new();
        let mut cats = Vec::new();
        for (category, count) in categories {
            for i in 0..*count {
                ids.push(format!("{}-{}", category, i));
                cats.push(category.to_string());
            }
        }
        df! {
            "M4id" => ids,
            "category" => cats,
        }
        .unwrap()
    }

    #[test]
    fn test_small_category_returns_all_ids() {
        let info = metadata(&[("Finance", 40)]);
        let sampled = sample_ids_by_category(&info, "M4id", "category", 100, 42).unwrap();

        assert_eq!(sampled.len(), 40);
        let unique: HashSet<&String> = sampled.iter().collect();
        assert_eq!(unique.len(), 40);
        assert!(sampled.iter().all(|id| id.starts_with("Finance-")));
    }

    #[test]
    fn test_caps_each_category_independently() {
        let info = metadata(&[("Macro", 30), ("Micro", 5), ("Other", 12)]);
        let sampled = sample_ids_by_category(&info, "M4id", "category", 10, 7).unwrap();

        let count = |prefix: &str| sampled.iter().filter(|id| id.starts_with(prefix)).count();
        assert_eq!(count("Macro-"), 10);
        assert_eq!(count("Micro-"), 5);
        assert_eq!(count("Other-"), 10);
        assert_eq!(sampled.len(), 25);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let info = metadata(&[("Industry", 50), ("Demographic", 20)]);
        let first = sample_ids_by_category(&info, "M4id", "category", 8, 42).unwrap();
        let second = sample_ids_by_category(&info, "M4id", "category", 8, 42).unwrap();
        assert_eq!(first, second);

        let other_seed = sample_ids_by_category(&info, "M4id", "category", 8, 43).unwrap();
        let a: HashSet<&String> = first.iter().collect();
        let b: HashSet<&String> = other_seed.iter().collect();
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_empty_metadata_yields_nothing() {
        let info = metadata(&[]);
        let sampled = sample_ids_by_category(&info, "M4id", "category", 3, 42).unwrap();
        assert!(sampled.is_empty());
    }

    #[test]
    fn test_duplicates_and_nulls_skipped() {
        let info = df! {
            "M4id" => [Some("D1"), Some("D1"), Some("D2"), None],
            "category" => [Some("Finance"), Some("Finance"), None, Some("Finance")],
        }
        .unwrap();
        let sampled = sample_ids_by_category(&info, "M4id", "category", 10, 42).unwrap();
        assert_eq!(sampled, vec!["D1".to_string()]);
    }
}
