//! Pattern tables used to classify added code and instructions.
//!
//! Each table is an ordered list of `{pattern, result}` rules so new
//! languages or phrasings can be added without touching the analyzer.

use regex::Regex;
use std::sync::LazyLock;

/// Declaration kinds recognised in added lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Declaration {
    TestClass,
    TestFunction,
    Class,
    Function,
}

/// Quality markers recognised in added lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityMarker {
    TypeHints,
    Imports,
    Documentation,
}

impl QualityMarker {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TypeHints => "type hints",
            Self::Imports => "organized imports",
            Self::Documentation => "documentation",
        }
    }
}

/// A single `{pattern, result}` rule.
pub struct PatternRule<T> {
    pub regex: Regex,
    pub result: T,
}

impl<T> PatternRule<T> {
    fn new(pattern: &str, result: T) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            result,
        }
    }
}

/// Declaration rules, first match wins per line. Test rules come before the
/// general class/function rules. The optional `name` group feeds affected names.
pub static DECLARATION_RULES: LazyLock<Vec<PatternRule<Declaration>>> = LazyLock::new(|| {
    vec![
        PatternRule::new(
            r"^\s*class\s+(?P<name>\w+)\s*\([^)]*TestCase[^)]*\)",
            Declaration::TestClass,
        ),
        PatternRule::new(
            r"^\s*(?:export\s+)?class\s+(?P<name>Test\w*|\w+Tests?)\b",
            Declaration::TestClass,
        ),
        PatternRule::new(r"^\s*(?:pub\s+)?mod\s+(?P<name>tests?)\b", Declaration::TestClass),
        PatternRule::new(r#"^\s*describe\s*\(\s*['"]"#, Declaration::TestClass),
        PatternRule::new(
            r"^\s*(?:async\s+)?def\s+(?P<name>test\w*)\s*\(",
            Declaration::TestFunction,
        ),
        PatternRule::new(
            r"^\s*(?:async\s+)?fn\s+(?P<name>test_\w+)\s*\(",
            Declaration::TestFunction,
        ),
        PatternRule::new(r#"^\s*(?:it|test)\s*\(\s*['"]"#, Declaration::TestFunction),
        PatternRule::new(
            r"^\s*(?:export\s+)?(?:abstract\s+)?class\s+(?P<name>\w+)",
            Declaration::Class,
        ),
        PatternRule::new(
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+(?P<name>\w+)",
            Declaration::Class,
        ),
        PatternRule::new(
            r"^\s*(?:async\s+)?def\s+(?P<name>\w+)\s*\(",
            Declaration::Function,
        ),
        PatternRule::new(
            r"^\s*(?:export\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>\w+)\s*\(",
            Declaration::Function,
        ),
        PatternRule::new(
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+(?P<name>\w+)",
            Declaration::Function,
        ),
        PatternRule::new(
            r"^\s*(?:export\s+)?(?:const|let)\s+(?P<name>\w+)\s*=\s*(?:async\s+)?\([^)]*\)\s*=>",
            Declaration::Function,
        ),
    ]
});

/// Quality marker rules; every matching rule applies.
pub static QUALITY_RULES: LazyLock<Vec<PatternRule<QualityMarker>>> = LazyLock::new(|| {
    vec![
        PatternRule::new(r"\bdef\s+\w+\s*\([^)]*\w\s*:\s*\w", QualityMarker::TypeHints),
        PatternRule::new(r"\)\s*->\s*\S", QualityMarker::TypeHints),
        PatternRule::new(r"^\s*(?:let|const|var)\s+\w+\s*:\s*\w", QualityMarker::TypeHints),
        PatternRule::new(r"^\s*import\s+[\w{*]", QualityMarker::Imports),
        PatternRule::new(r"^\s*from\s+[\w.]+\s+import\s", QualityMarker::Imports),
        PatternRule::new(r"^\s*use\s+[\w:{]+", QualityMarker::Imports),
        PatternRule::new(r#"^\s*[rbuRBU]?(?:"""|''')"#, QualityMarker::Documentation),
        PatternRule::new(r"^\s*(?:///|//!|/\*\*)", QualityMarker::Documentation),
    ]
});

/// Test-related vocabulary in instructions, English and Korean.
pub static TEST_INSTRUCTION_RULES: LazyLock<Vec<PatternRule<()>>> = LazyLock::new(|| {
    vec![
        PatternRule::new(r"(?i)\b(?:unit\s*)?tests?\b", ()),
        PatternRule::new(r"(?i)\btest(?:ing|case|cases|suite)\b", ()),
        PatternRule::new(r"(?i)\b(?:pytest|unittest|jest|spec)\b", ()),
        PatternRule::new(r"테스트", ()),
        PatternRule::new(r"시험", ()),
        PatternRule::new(r"검증", ()),
    ]
});

/// A declaration found on one added line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationMatch {
    pub kind: Declaration,
    pub name: Option<String>,
}

/// Classify a line against [`DECLARATION_RULES`].
pub fn match_declaration(line: &str) -> Option<DeclarationMatch> {
    DECLARATION_RULES.iter().find_map(|rule| {
        rule.regex.captures(line).map(|caps| DeclarationMatch {
            kind: rule.result,
            name: caps.name("name").map(|m| m.as_str().to_string()),
        })
    })
}

/// All quality markers present on a line.
pub fn match_quality(line: &str) -> impl Iterator<Item = QualityMarker> + '_ {
    QUALITY_RULES
        .iter()
        .filter(move |rule| rule.regex.is_match(line))
        .map(|rule| rule.result)
}

/// Whether an instruction talks about tests.
pub fn is_test_instruction(instruction: &str) -> bool {
    TEST_INSTRUCTION_RULES
        .iter()
        .any(|rule| rule.regex.is_match(instruction))
}
