//! Identity & defaulting pass, run exactly once over every batch the
//! generation use case produces.

use crate::domain::generation_request::GenerationSettings;
use crate::domain::test_case::TestCase;
use std::collections::HashSet;

pub const GENERATED_ID_PREFIX: &str = "TC-GEN-";

/// Model-side values a case may have left out; filled from the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingAttributes {
    pub priority: bool,
    pub severity: bool,
}

fn synthesized_base(original: &str) -> String {
    let base = original.trim().trim_end_matches(|c: char| c.is_ascii_digit());
    if base.is_empty() {
        GENERATED_ID_PREFIX.to_string()
    } else {
        base.to_string()
    }
}

fn synthesize_id(original: &str, position: usize, seen: &HashSet<String>) -> String {
    let base = synthesized_base(original);
    let candidate = format!("{}{:03}", base, position);
    if !seen.contains(&candidate) {
        return candidate;
    }
    (2..)
        .map(|suffix| format!("{}{:03}-{}", base, position, suffix))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(candidate)
}

/// Rewrites empty or repeated ids so every id in the batch is unique.
///
/// An original id is claimed only when it is non-empty and unclaimed at the
/// time it is visited. Replacements are `<base><position:03>` where the base
/// is the original id minus its trailing digits (or `TC-GEN-`), and are
/// claimed as well so later cases cannot collide with them. The result
/// depends only on batch content and order.
pub fn assign_unique_ids(batch: Vec<TestCase>) -> Vec<TestCase> {
    let mut seen: HashSet<String> = HashSet::new();
    batch
        .into_iter()
        .enumerate()
        .map(|(index, mut case)| {
            let original = case.id.trim().to_string();
            if !original.is_empty() && !seen.contains(&original) {
                seen.insert(original.clone());
                case.id = original;
            } else {
                let replacement = synthesize_id(&original, index + 1, &seen);
                seen.insert(replacement.clone());
                case.id = replacement;
            }
            case
        })
        .collect()
}

/// Backfills priority/severity the model omitted and unions the request's
/// test type and coverage focus into the tag set.
pub fn apply_defaults(
    batch: Vec<(TestCase, MissingAttributes)>,
    settings: &GenerationSettings,
) -> Vec<TestCase> {
    batch
        .into_iter()
        .map(|(mut case, missing)| {
            if missing.priority {
                case.priority = settings.priority;
            }
            if missing.severity {
                case.severity = settings.severity;
            }
            if case.category.trim().is_empty() {
                case.category = settings.test_type.clone();
            }
            case.push_tag(&settings.test_type);
            case.push_tag(&settings.coverage_focus);
            case
        })
        .collect()
}

pub fn finalize_batch(
    batch: Vec<(TestCase, MissingAttributes)>,
    settings: &GenerationSettings,
) -> Vec<TestCase> {
    assign_unique_ids(apply_defaults(batch, settings))
}
