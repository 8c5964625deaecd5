//! Field-level merge strategies shared by both report schemas.

/// Rounded arithmetic mean of the present values, `None` when none are present.
///
/// Inputs are used as given and only the mean is rounded. Halves round away
/// from zero, so `70.5` becomes `71`.
pub fn average<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return None;
    }
    Some((sum / f64::from(count)).round())
}

/// Longest non-empty string; the first one wins ties.
pub fn richest<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut best: Option<(&str, usize)> = None;
    for value in values.into_iter().flatten() {
        let len = value.chars().count();
        if len == 0 {
            continue;
        }
        match best {
            Some((_, best_len)) if best_len >= len => {}
            _ => best = Some((value, len)),
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Take at most `per_source` items from each source, concatenate, keep `cap`.
pub fn capped_concat<'a, T, I>(sources: I, per_source: usize, cap: Option<usize>) -> Vec<T>
where
    T: Clone + 'a,
    I: IntoIterator<Item = &'a [T]>,
{
    let merged = sources
        .into_iter()
        .flat_map(|items| items.iter().take(per_source).cloned());

    match cap {
        Some(cap) => merged.take(cap).collect(),
        None => merged.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rounds_to_nearest() {
        assert_eq!(average([Some(80.0), Some(60.0)]), Some(70.0));
        assert_eq!(average([Some(81.0), Some(60.0)]), Some(71.0));
        assert_eq!(average([Some(7.0), Some(8.0), Some(8.0)]), Some(8.0));
    }

    #[test]
    fn test_average_rounds_only_the_mean() {
        // Rounding each input first would give (8 + 7) / 2 = 7.5 -> 8
        assert_eq!(average([Some(7.5), Some(6.5)]), Some(7.0));
        assert_eq!(average([Some(64.4), Some(64.4)]), Some(64.0));
    }

    #[test]
    fn test_average_skips_missing_values() {
        assert_eq!(average([Some(90.0), None, Some(70.0)]), Some(80.0));
        assert_eq!(average([None, None]), None);
        assert_eq!(average(Vec::<Option<f64>>::new()), None);
    }

    #[test]
    fn test_richest_prefers_longest_then_first() {
        let picked = richest([Some("short"), Some("much longer text"), Some("also longer one")]);
        assert_eq!(picked.as_deref(), Some("much longer text"));

        let tie = richest([Some("abc"), Some("xyz")]);
        assert_eq!(tie.as_deref(), Some("abc"));
    }

    #[test]
    fn test_richest_ignores_empty() {
        assert_eq!(richest([Some(""), None]), None);
        assert_eq!(richest([Some(""), Some("x")]).as_deref(), Some("x"));
    }

    #[test]
    fn test_capped_concat_respects_limits() {
        let a = vec![1, 2, 3, 4];
        let b = vec![5, 6];
        let c = vec![7, 8, 9, 10];

        let merged = capped_concat([a.as_slice(), b.as_slice(), c.as_slice()], 3, Some(7));
        assert_eq!(merged, vec![1, 2, 3, 5, 6, 7, 8]);

        let uncapped = capped_concat([a.as_slice(), b.as_slice()], 2, None);
        assert_eq!(uncapped, vec![1, 2, 5, 6]);
    }
}
