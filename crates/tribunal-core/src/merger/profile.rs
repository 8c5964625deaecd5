//! Profile report consensus.

use std::collections::HashSet;

use super::strategy::{average, capped_concat, richest};
use crate::dedup::dedup;
use crate::report::{
    is_real_url_fix, GrowthHacks, HeadlineVariant, NetworkingScript, ProfileReport, Roast,
    SectionKey, SectionScores, Suggestions,
};

pub const MAX_RED_FLAGS: usize = 8;
pub const MAX_DISTINCT_HEADLINES: usize = 6;
pub const MAX_HEADLINES: usize = 9;
pub const ACTION_STEPS_PER_PROVIDER: usize = 3;
pub const MAX_ACTION_STEPS: usize = 9;
pub const IMPACT_STATEMENTS_PER_PROVIDER: usize = 2;
pub const MAX_VIRAL_HOOKS: usize = 6;

/// Merge profile reports given as `(provider, report)` in dispatch order.
pub(crate) fn merge_profiles(reports: &[(&str, &ProfileReport)]) -> ProfileReport {
    let roasts: Vec<&Roast> = reports.iter().map(|(_, r)| &r.roast).collect();
    let suggestions: Vec<&Suggestions> = reports.iter().map(|(_, r)| &r.suggestions).collect();

    let roast = Roast {
        brutality_score: Some(average(roasts.iter().map(|r| r.brutality_score)).unwrap_or(0.0)),
        algorithm_score: Some(average(roasts.iter().map(|r| r.algorithm_score)).unwrap_or(0.0)),
        completeness_score: Some(
            average(roasts.iter().map(|r| r.completeness_score)).unwrap_or(0.0),
        ),
        recruiter_view: richest(roasts.iter().map(|r| r.recruiter_view.as_deref())),
        industry_benchmark: richest(roasts.iter().map(|r| r.industry_benchmark.as_deref())),
        red_flags: dedup(roasts.iter().flat_map(|r| r.red_flags.iter().cloned()))
            .into_iter()
            .take(MAX_RED_FLAGS)
            .collect(),
        summary: richest(roasts.iter().map(|r| r.summary.as_deref())),
    };

    let mut section_scores = SectionScores::default();
    for key in SectionKey::ALL {
        let merged = average(reports.iter().map(|(_, r)| r.section_scores.get(key)));
        section_scores.set(key, Some(merged.unwrap_or(0.0)));
    }

    let url_fix = suggestions
        .iter()
        .filter_map(|s| s.url_fix.as_deref())
        .find(|fix| is_real_url_fix(fix))
        .map(str::to_string);

    let growth_hacks = GrowthHacks {
        viral_hooks: dedup(
            suggestions
                .iter()
                .flat_map(|s| s.growth_hacks.viral_hooks.iter().cloned()),
        )
        .into_iter()
        .take(MAX_VIRAL_HOOKS)
        .collect(),
        networking_scripts: merge_scripts(&suggestions),
    };

    ProfileReport {
        roast,
        section_scores,
        suggestions: Suggestions {
            headlines: merge_headlines(reports),
            url_fix,
            impact_statements: capped_concat(
                suggestions.iter().map(|s| s.impact_statements.as_slice()),
                IMPACT_STATEMENTS_PER_PROVIDER,
                None,
            ),
            action_plan: capped_concat(
                suggestions.iter().map(|s| s.action_plan.as_slice()),
                ACTION_STEPS_PER_PROVIDER,
                Some(MAX_ACTION_STEPS),
            ),
            growth_hacks,
        },
    }
}

/// Two-pass headline selection.
///
/// Pass 1 keeps the first variant of each distinct type, up to
/// [`MAX_DISTINCT_HEADLINES`]. Pass 2 then adds every variant pass 1 did not
/// take, labelled `"<type> · <provider>"`, up to [`MAX_HEADLINES`] in total.
fn merge_headlines(reports: &[(&str, &ProfileReport)]) -> Vec<HeadlineVariant> {
    let mut labels: HashSet<String> = HashSet::new();
    let mut taken: HashSet<(usize, usize)> = HashSet::new();
    let mut merged = Vec::new();

    'first: for (source, (_, report)) in reports.iter().enumerate() {
        for (index, variant) in report.suggestions.headlines.iter().enumerate() {
            if merged.len() >= MAX_DISTINCT_HEADLINES {
                break 'first;
            }
            if labels.insert(variant.kind.clone()) {
                taken.insert((source, index));
                merged.push(variant.clone());
            }
        }
    }

    'second: for (source, (provider, report)) in reports.iter().enumerate() {
        for (index, variant) in report.suggestions.headlines.iter().enumerate() {
            if merged.len() >= MAX_HEADLINES {
                break 'second;
            }
            if taken.contains(&(source, index)) {
                continue;
            }
            let label = format!("{} · {}", variant.kind, provider);
            if labels.insert(label.clone()) {
                merged.push(HeadlineVariant::new(label, variant.text.clone()));
            }
        }
    }

    merged
}

/// First script per distinct target, in dispatch order.
fn merge_scripts(suggestions: &[&Suggestions]) -> Vec<NetworkingScript> {
    let mut targets: HashSet<Option<&str>> = HashSet::new();
    let mut scripts = Vec::new();

    for script in suggestions
        .iter()
        .flat_map(|s| s.growth_hacks.networking_scripts.iter())
    {
        if targets.insert(script.target.as_deref()) {
            scripts.push(script.clone());
        }
    }

    scripts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActionStep, ImpactStatement};

    fn headline(kind: &str, text: &str) -> HeadlineVariant {
        HeadlineVariant::new(kind, text)
    }

    fn with_headlines(headlines: Vec<HeadlineVariant>) -> ProfileReport {
        let mut report = ProfileReport::default();
        report.suggestions.headlines = headlines;
        report
    }

    fn step(name: &str) -> ActionStep {
        ActionStep {
            step: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_scores_are_averaged() {
        let mut a = ProfileReport::default();
        a.roast.brutality_score = Some(80.0);
        a.section_scores.headline = Some(6.0);
        let mut b = ProfileReport::default();
        b.roast.brutality_score = Some(60.0);
        b.section_scores.headline = Some(9.0);

        let merged = merge_profiles(&[("A", &a), ("B", &b)]);
        assert_eq!(merged.roast.brutality_score, Some(70.0));
        assert_eq!(merged.section_scores.headline, Some(8.0));
        // Nobody scored these
        assert_eq!(merged.roast.algorithm_score, Some(0.0));
        assert_eq!(merged.section_scores.url, Some(0.0));
    }

    #[test]
    fn test_prose_picks_longest() {
        let mut a = ProfileReport::default();
        a.roast.summary = Some("Short.".into());
        a.roast.recruiter_view = Some("A longer recruiter view.".into());
        let mut b = ProfileReport::default();
        b.roast.summary = Some("A noticeably longer summary.".into());

        let merged = merge_profiles(&[("A", &a), ("B", &b)]);
        assert_eq!(merged.roast.summary.as_deref(), Some("A noticeably longer summary."));
        assert_eq!(merged.roast.recruiter_view.as_deref(), Some("A longer recruiter view."));
        assert_eq!(merged.roast.industry_benchmark, None);
    }

    #[test]
    fn test_red_flags_deduped_and_capped() {
        let mut a = ProfileReport::default();
        a.roast.red_flags = (0..6).map(|i| format!("Flag {i}")).collect();
        let mut b = ProfileReport::default();
        b.roast.red_flags = vec!["flag 0".into(), "Extra A".into(), "Extra B".into(), "Extra C".into()];

        let merged = merge_profiles(&[("A", &a), ("B", &b)]);
        assert_eq!(merged.roast.red_flags.len(), MAX_RED_FLAGS);
        assert_eq!(merged.roast.red_flags[0], "Flag 0");
        assert_eq!(merged.roast.red_flags[6], "Extra A");
        assert!(!merged.roast.red_flags.contains(&"flag 0".to_string()));
    }

    #[test]
    fn test_same_headline_type_keeps_first_untagged() {
        let a = with_headlines(vec![headline("SEO-Optimized", "from A")]);
        let b = with_headlines(vec![headline("SEO-Optimized", "from B")]);
        let c = with_headlines(vec![headline("SEO-Optimized", "from C")]);

        let merged = merge_headlines(&[("Gemini", &a), ("GPT-4o", &b), ("Claude 3.5", &c)]);
        assert_eq!(
            merged,
            vec![
                headline("SEO-Optimized", "from A"),
                headline("SEO-Optimized · GPT-4o", "from B"),
                headline("SEO-Optimized · Claude 3.5", "from C"),
            ]
        );
    }

    #[test]
    fn test_three_standard_types_from_every_provider() {
        let kinds = ["Taplio Formula", "SEO-Optimized", "Executive Presence"];
        let reports: Vec<ProfileReport> = ["G", "O", "C"]
            .iter()
            .map(|p| with_headlines(kinds.iter().map(|k| headline(k, &format!("{p} {k}"))).collect()))
            .collect();

        let merged = merge_headlines(&[
            ("Gemini", &reports[0]),
            ("GPT-4o", &reports[1]),
            ("Claude 3.5", &reports[2]),
        ]);
        let labels: Vec<&str> = merged.iter().map(|h| h.kind.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Taplio Formula",
                "SEO-Optimized",
                "Executive Presence",
                "Taplio Formula · GPT-4o",
                "SEO-Optimized · GPT-4o",
                "Executive Presence · GPT-4o",
                "Taplio Formula · Claude 3.5",
                "SEO-Optimized · Claude 3.5",
                "Executive Presence · Claude 3.5",
            ]
        );
        assert_eq!(merged[3].text, "O Taplio Formula");
    }

    #[test]
    fn test_headline_tagging_after_six_types() {
        let a = with_headlines(
            ["T1", "T2", "T3", "T4"]
                .iter()
                .map(|t| headline(t, &format!("A {t}")))
                .collect(),
        );
        let b = with_headlines(
            ["T1", "T5", "T6", "T7"]
                .iter()
                .map(|t| headline(t, &format!("B {t}")))
                .collect(),
        );

        let merged = merge_headlines(&[("Gemini", &a), ("GPT-4o", &b)]);
        let kinds: Vec<&str> = merged.iter().map(|h| h.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["T1", "T2", "T3", "T4", "T5", "T6", "T1 · GPT-4o", "T7 · GPT-4o"]
        );
        assert_eq!(merged[6].text, "B T1");
    }

    #[test]
    fn test_headlines_capped_at_nine() {
        let a = with_headlines((0..12).map(|i| headline(&format!("T{i}"), "x")).collect());

        let merged = merge_headlines(&[("Gemini", &a)]);
        assert_eq!(merged.len(), MAX_HEADLINES);
        assert_eq!(merged[6].kind, "T6 · Gemini");
    }

    #[test]
    fn test_url_fix_first_real_value() {
        let mut a = ProfileReport::default();
        a.suggestions.url_fix = Some("null".into());
        let b = ProfileReport::default();
        let mut c = ProfileReport::default();
        c.suggestions.url_fix = Some("/in/jane-doe".into());

        let merged = merge_profiles(&[("A", &a), ("B", &b), ("C", &c)]);
        assert_eq!(merged.suggestions.url_fix.as_deref(), Some("/in/jane-doe"));

        let none = merge_profiles(&[("A", &a), ("B", &b)]);
        assert_eq!(none.suggestions.url_fix, None);
    }

    #[test]
    fn test_action_plan_and_impact_statements() {
        let mut a = ProfileReport::default();
        a.suggestions.action_plan = (0..5).map(|i| step(&format!("A{i}"))).collect();
        a.suggestions.impact_statements = vec![ImpactStatement::default(); 4];
        let mut b = ProfileReport::default();
        b.suggestions.action_plan = (0..2).map(|i| step(&format!("B{i}"))).collect();
        b.suggestions.impact_statements = vec![ImpactStatement::default(); 1];

        let merged = merge_profiles(&[("A", &a), ("B", &b)]);
        let steps: Vec<&str> = merged
            .suggestions
            .action_plan
            .iter()
            .filter_map(|s| s.step.as_deref())
            .collect();
        assert_eq!(steps, vec!["A0", "A1", "A2", "B0", "B1"]);
        assert_eq!(merged.suggestions.impact_statements.len(), 3);
    }

    #[test]
    fn test_action_plan_capped_at_nine() {
        let reports: Vec<ProfileReport> = (0..4)
            .map(|_| {
                let mut r = ProfileReport::default();
                r.suggestions.action_plan = (0..4).map(|i| step(&format!("S{i}"))).collect();
                r
            })
            .collect();
        let named: Vec<(&str, &ProfileReport)> = reports.iter().map(|r| ("P", r)).collect();

        let merged = merge_profiles(&named);
        assert_eq!(merged.suggestions.action_plan.len(), MAX_ACTION_STEPS);
    }

    #[test]
    fn test_growth_hacks_merge() {
        let mut a = ProfileReport::default();
        a.suggestions.growth_hacks.viral_hooks = vec!["Hook one".into(), "Hook two".into()];
        a.suggestions.growth_hacks.networking_scripts = vec![NetworkingScript {
            target: Some("Recruiter".into()),
            script: Some("A".into()),
        }];
        let mut b = ProfileReport::default();
        b.suggestions.growth_hacks.viral_hooks = (0..6).map(|i| format!("Hook {i}")).collect();
        b.suggestions.growth_hacks.networking_scripts = vec![
            NetworkingScript {
                target: Some("Recruiter".into()),
                script: Some("B".into()),
            },
            NetworkingScript {
                target: Some("Peer/Founder".into()),
                script: Some("B2".into()),
            },
        ];

        let merged = merge_profiles(&[("A", &a), ("B", &b)]);
        let hacks = &merged.suggestions.growth_hacks;
        assert_eq!(hacks.viral_hooks.len(), MAX_VIRAL_HOOKS);
        assert_eq!(hacks.viral_hooks[0], "Hook one");
        assert_eq!(hacks.networking_scripts.len(), 2);
        assert_eq!(hacks.networking_scripts[0].script.as_deref(), Some("A"));
        assert_eq!(hacks.networking_scripts[1].target.as_deref(), Some("Peer/Founder"));
    }
}
