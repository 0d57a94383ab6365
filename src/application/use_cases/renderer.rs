//! Textual notations for test cases.
//!
//! `render` output is stored and diffed downstream, so it must stay
//! byte-stable for a given test case. `parse_loose` is the lossy inverse used
//! when coverage analysis only has text to work with.

use crate::domain::test_case::{
    GherkinBody, ProceduralBody, ScenarioKind, TestCase, TestCaseBody, TestStep,
};
use once_cell::sync::Lazy;
use regex::Regex;

pub const BATCH_SEPARATOR: &str = "\n\n---\n\n";

static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)[).]\s+(.*)$").unwrap());
static BATCH_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^---[ \t]*$").unwrap());

pub fn render(test_case: &TestCase) -> String {
    match &test_case.body {
        TestCaseBody::Procedural(body) => render_procedural(test_case, body),
        TestCaseBody::Gherkin(body) => render_gherkin(test_case, body),
    }
}

pub fn render_batch(test_cases: &[TestCase]) -> String {
    test_cases
        .iter()
        .map(render)
        .collect::<Vec<_>>()
        .join(BATCH_SEPARATOR)
}

fn bullet_block(label: &str, items: &[String]) -> Option<String> {
    let items: Vec<&str> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return None;
    }
    let mut block = format!("{}:", label);
    for item in items {
        block.push_str("\n- ");
        block.push_str(item);
    }
    Some(block)
}

fn render_procedural(test_case: &TestCase, body: &ProceduralBody) -> String {
    let mut header = format!("ID: {}\nTitle: {}", test_case.id, test_case.title.trim());
    if !body.objective.trim().is_empty() {
        header.push_str("\nObjective: ");
        header.push_str(body.objective.trim());
    }

    let mut steps: Vec<&TestStep> = body.steps.iter().collect();
    steps.sort_by_key(|step| step.ordinal);

    let steps_block = if steps.is_empty() {
        None
    } else {
        let lines: Vec<String> = steps
            .iter()
            .map(|step| format!("{}) {}", step.ordinal, step.description.trim()))
            .collect();
        Some(format!("Steps:\n{}", lines.join("\n")))
    };

    let expected: Vec<String> = steps
        .iter()
        .filter_map(|step| step.expected_result.as_deref())
        .map(|result| result.trim().to_string())
        .collect();

    let blocks = [
        Some(header),
        bullet_block("Preconditions", &body.preconditions),
        steps_block,
        bullet_block("Expected Results", &expected),
        bullet_block("Postconditions", &body.postconditions),
    ];
    blocks.into_iter().flatten().collect::<Vec<_>>().join("\n\n")
}

fn format_tag(tag: &str) -> Option<String> {
    let bare = tag.trim().trim_start_matches('@').trim();
    if bare.is_empty() {
        return None;
    }
    let joined: Vec<&str> = bare.split_whitespace().collect();
    Some(format!("@{}", joined.join("_")))
}

fn keyword_step(keyword: &str, step: &str) -> String {
    let text = step.trim();
    let already_prefixed = ["And ", "But "]
        .iter()
        .any(|connective| text.starts_with(connective))
        || text
            .strip_prefix(keyword)
            .map(|rest| rest.starts_with(' '))
            .unwrap_or(false);
    if already_prefixed {
        text.to_string()
    } else {
        format!("{} {}", keyword, text)
    }
}

fn indented(text: &str, indent: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{}{}", indent, line))
        .collect()
}

fn render_gherkin(test_case: &TestCase, body: &GherkinBody) -> String {
    let mut lines = vec!["```gherkin".to_string(), format!("# ID: {}", test_case.id)];

    let feature = if body.feature.trim().is_empty() {
        test_case.title.trim()
    } else {
        body.feature.trim()
    };
    lines.push(format!("Feature: {}", feature));
    if let Some(description) = body.feature_description.as_deref() {
        lines.extend(indented(description, "  "));
    }

    if let Some(background) = body
        .background
        .as_deref()
        .filter(|value| !value.trim().is_empty())
    {
        lines.push(String::new());
        lines.push("  Background:".to_string());
        lines.extend(indented(background, "    "));
    }

    lines.push(String::new());
    let tags: Vec<String> = test_case.tags.iter().filter_map(|tag| format_tag(tag)).collect();
    if !tags.is_empty() {
        lines.push(format!("  {}", tags.join(" ")));
    }
    lines.push(format!(
        "  {}: {}",
        body.scenario_kind.keyword(),
        test_case.title.trim()
    ));

    for (keyword, steps) in [
        ("Given", &body.given_steps),
        ("When", &body.when_steps),
        ("Then", &body.then_steps),
    ] {
        for step in steps.iter().filter(|step| !step.trim().is_empty()) {
            lines.push(format!("    {}", keyword_step(keyword, step)));
        }
    }

    if let Some(examples) = body
        .examples_table
        .as_deref()
        .filter(|value| !value.trim().is_empty())
    {
        lines.push(String::new());
        lines.push("    Examples:".to_string());
        lines.push(examples.strip_suffix('\n').unwrap_or(examples).to_string());
    }

    lines.push("```".to_string());
    lines.join("\n")
}

/// Structure recovered from loosely formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftBody {
    Procedural(ProceduralBody),
    Gherkin(GherkinBody),
    /// Content the parser did not recognize, kept as-is.
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub body: DraftBody,
    /// The text the draft was parsed from.
    pub source: String,
}

impl TestCaseDraft {
    pub fn searchable_text(&self) -> &str {
        &self.source
    }
}

pub fn parse_loose_batch(text: &str) -> Vec<TestCaseDraft> {
    BATCH_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(parse_loose)
        .collect()
}

/// Never fails: anything unrecognized ends up in `DraftBody::Opaque`.
pub fn parse_loose(text: &str) -> TestCaseDraft {
    let source = text.trim().to_string();
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .collect();

    let is_gherkin = lines
        .iter()
        .any(|line| line.starts_with("Feature:") || line.starts_with("Scenario"));
    if is_gherkin {
        return parse_gherkin_lines(&lines, source.clone());
    }

    let is_procedural = lines
        .iter()
        .any(|line| line.eq_ignore_ascii_case("steps:") || NUMBERED_LINE.is_match(line));
    if is_procedural {
        return parse_procedural_lines(&lines, source.clone());
    }

    TestCaseDraft {
        id: labeled_value(&lines, "ID:"),
        title: labeled_value(&lines, "Title:"),
        tags: Vec::new(),
        body: DraftBody::Opaque(source.clone()),
        source,
    }
}

fn labeled_value(lines: &[&str], label: &str) -> Option<String> {
    lines.iter().find_map(|line| {
        line.trim_start_matches('#')
            .trim()
            .strip_prefix(label)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

fn strip_bullet(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
}

fn parse_procedural_lines(lines: &[&str], source: String) -> TestCaseDraft {
    #[derive(Clone, Copy, PartialEq)]
    enum Section {
        None,
        Preconditions,
        Steps,
        Expected,
        Postconditions,
    }

    let mut body = ProceduralBody::default();
    let mut expected = Vec::new();
    let mut section = Section::None;

    for line in lines {
        let lower = line.to_ascii_lowercase();
        if let Some(value) = line.strip_prefix("Objective:") {
            body.objective = value.trim().to_string();
            continue;
        }
        match lower.as_str() {
            "preconditions:" => section = Section::Preconditions,
            "steps:" => section = Section::Steps,
            "expected results:" | "expected result:" => section = Section::Expected,
            "postconditions:" => section = Section::Postconditions,
            _ => {
                if let Some(captures) = NUMBERED_LINE.captures(line) {
                    let ordinal = captures[1].parse().unwrap_or(body.steps.len() as u32 + 1);
                    body.steps.push(TestStep {
                        ordinal,
                        description: captures[2].trim().to_string(),
                        expected_result: None,
                    });
                    continue;
                }
                let Some(item) = strip_bullet(line) else {
                    continue;
                };
                match section {
                    Section::Preconditions => body.preconditions.push(item.to_string()),
                    Section::Expected => expected.push(item.to_string()),
                    Section::Postconditions => body.postconditions.push(item.to_string()),
                    Section::Steps | Section::None => {}
                }
            }
        }
    }

    // Positional pairing is a guess: results of steps without one are not marked.
    if expected.len() == body.steps.len() {
        for (step, result) in body.steps.iter_mut().zip(expected) {
            step.expected_result = Some(result);
        }
    }

    TestCaseDraft {
        id: labeled_value(lines, "ID:"),
        title: labeled_value(lines, "Title:"),
        tags: Vec::new(),
        body: DraftBody::Procedural(body),
        source,
    }
}

fn parse_gherkin_lines(lines: &[&str], source: String) -> TestCaseDraft {
    #[derive(Clone, Copy, PartialEq)]
    enum Section {
        Feature,
        Background,
        Scenario,
        Examples,
    }

    let mut body = GherkinBody::default();
    let mut title = None;
    let mut tags = Vec::new();
    let mut description = Vec::new();
    let mut background = Vec::new();
    let mut examples = Vec::new();
    let mut section = Section::Feature;
    let mut group = 0usize;

    for line in lines {
        if section == Section::Examples {
            if !line.is_empty() {
                examples.push(line.to_string());
            }
            continue;
        }
        if line.is_empty() || line.starts_with("# ") {
            continue;
        }
        if let Some(value) = line.strip_prefix("Feature:") {
            body.feature = value.trim().to_string();
            section = Section::Feature;
        } else if line.starts_with("Background:") {
            section = Section::Background;
        } else if let Some(value) = line.strip_prefix("Scenario Outline:") {
            body.scenario_kind = ScenarioKind::ScenarioOutline;
            title = Some(value.trim().to_string());
            section = Section::Scenario;
        } else if let Some(value) = line.strip_prefix("Scenario:") {
            body.scenario_kind = ScenarioKind::Scenario;
            title = Some(value.trim().to_string());
            section = Section::Scenario;
        } else if line.starts_with("Examples:") {
            section = Section::Examples;
        } else if line.starts_with('@') {
            tags.extend(
                line.split_whitespace()
                    .map(|tag| tag.trim_start_matches('@').to_string())
                    .filter(|tag| !tag.is_empty()),
            );
        } else if section == Section::Background {
            background.push(line.to_string());
        } else if section == Section::Scenario {
            if let Some(step) = line.strip_prefix("Given ") {
                group = 0;
                body.given_steps.push(step.trim().to_string());
            } else if let Some(step) = line.strip_prefix("When ") {
                group = 1;
                body.when_steps.push(step.trim().to_string());
            } else if let Some(step) = line.strip_prefix("Then ") {
                group = 2;
                body.then_steps.push(step.trim().to_string());
            } else if line.starts_with("And ") || line.starts_with("But ") {
                let target = match group {
                    0 => &mut body.given_steps,
                    1 => &mut body.when_steps,
                    _ => &mut body.then_steps,
                };
                target.push(line.to_string());
            }
        } else {
            description.push(line.to_string());
        }
    }

    if !description.is_empty() {
        body.feature_description = Some(description.join("\n"));
    }
    if !background.is_empty() {
        body.background = Some(background.join("\n"));
    }
    if !examples.is_empty() {
        body.examples_table = Some(examples.join("\n"));
    }

    TestCaseDraft {
        id: labeled_value(lines, "ID:"),
        title,
        tags,
        body: DraftBody::Gherkin(body),
        source,
    }
}
