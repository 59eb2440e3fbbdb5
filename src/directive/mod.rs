use std::{fmt, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::pattern::Pattern;
pub use errors::ParseError;

mod errors;

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<pattern>/[^/]+/|.+?)\s*,\s*(?P<count>\d+)").unwrap()
});

/// Every command word a directive line may start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Method,
    PassBefore,
    PassAfter,
    InBlock,
    Inst,
    InstNot,
    InstCount,
    // Consumed by the test runner, not by the checker.
    Checker,
    SkipIf,
    Run,
    RunPaoc,
}

impl Command {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "METHOD" => Self::Method,
            "PASS_BEFORE" => Self::PassBefore,
            "PASS_AFTER" => Self::PassAfter,
            "IN_BLOCK" => Self::InBlock,
            "INST" => Self::Inst,
            "INST_NOT" => Self::InstNot,
            "INST_COUNT" => Self::InstCount,
            "CHECKER" => Self::Checker,
            "SKIP_IF" => Self::SkipIf,
            "RUN" => Self::Run,
            "RUN_PAOC" => Self::RunPaoc,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Method => "METHOD",
            Self::PassBefore => "PASS_BEFORE",
            Self::PassAfter => "PASS_AFTER",
            Self::InBlock => "IN_BLOCK",
            Self::Inst => "INST",
            Self::InstNot => "INST_NOT",
            Self::InstCount => "INST_COUNT",
            Self::Checker => "CHECKER",
            Self::SkipIf => "SKIP_IF",
            Self::Run => "RUN",
            Self::RunPaoc => "RUN_PAOC",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum DirectiveKind {
    Method(String),
    PassBefore(String),
    PassAfter(String),
    InBlock(Pattern),
    Inst(Pattern),
    InstNot(Pattern),
    InstCount { pattern: Pattern, count: usize },
    Reserved(Command),
    Unknown(String),
}

/// One parsed expectation line of a transcript.
#[derive(Debug, Clone)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// The argument text after the command word, as written.
    pub args: String,
    /// 1-based line number in the transcript.
    pub line: usize,
}

impl Directive {
    /// The command word, as written in the transcript.
    pub fn command_name(&self) -> &str {
        match &self.kind {
            DirectiveKind::Method(_) => Command::Method.as_str(),
            DirectiveKind::PassBefore(_) => Command::PassBefore.as_str(),
            DirectiveKind::PassAfter(_) => Command::PassAfter.as_str(),
            DirectiveKind::InBlock(_) => Command::InBlock.as_str(),
            DirectiveKind::Inst(_) => Command::Inst.as_str(),
            DirectiveKind::InstNot(_) => Command::InstNot.as_str(),
            DirectiveKind::InstCount { .. } => Command::InstCount.as_str(),
            DirectiveKind::Reserved(command) => command.as_str(),
            DirectiveKind::Unknown(token) => token,
        }
    }
}

/// How directive lines are told apart from the rest of a test source.
#[derive(Debug, Clone)]
pub struct DirectiveSyntax {
    /// Prefix of a directive line. Ordinary `//` comments lack the `!`.
    pub marker: String,
}

impl Default for DirectiveSyntax {
    fn default() -> Self {
        Self {
            marker: "//!".to_string(),
        }
    }
}

/// The ordered outcome of parsing a transcript. A malformed line yields an
/// error in its slot and never stops the lines after it from being parsed.
#[derive(Debug, Default)]
pub struct Transcript {
    pub entries: Vec<Result<Directive, ParseError>>,
}

impl Transcript {
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter().filter_map(|x| x.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.entries.iter().filter_map(|x| x.as_ref().err())
    }
}

pub fn parse_transcript(source: &str, syntax: &DirectiveSyntax) -> Transcript {
    let mut entries = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_num = index + 1;
        let line = line.trim();

        let Some(body) = line.strip_prefix(syntax.marker.as_str()) else {
            // Plain comments and code.
            continue;
        };

        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        let (token, args) = match body.split_once(char::is_whitespace) {
            Some((token, args)) => (token, args.trim()),
            None => (body, ""),
        };

        entries.push(parse_directive(token, args, line_num));
    }

    Transcript { entries }
}

pub fn parse_directive(token: &str, args: &str, line: usize) -> Result<Directive, ParseError> {
    let Some(command) = Command::from_token(token) else {
        debug!("unrecognized command {token:?} at line {line}");
        return Ok(Directive {
            kind: DirectiveKind::Unknown(token.to_string()),
            args: args.to_string(),
            line,
        });
    };

    let invalid = || ParseError::InvalidFormat {
        command,
        line,
        args: args.to_string(),
    };
    let pattern = |raw: &str| {
        Pattern::parse(raw).map_err(|source| ParseError::InvalidPattern {
            command,
            line,
            args: args.to_string(),
            source,
        })
    };
    let quoted = || {
        QUOTED_RE
            .captures(args)
            .map(|caps| caps[1].to_string())
            .ok_or_else(invalid)
    };

    let kind = match command {
        Command::Method => DirectiveKind::Method(quoted()?),
        Command::PassBefore => DirectiveKind::PassBefore(quoted()?),
        Command::PassAfter => DirectiveKind::PassAfter(quoted()?),
        Command::InBlock => DirectiveKind::InBlock(pattern(args)?),
        Command::Inst => DirectiveKind::Inst(pattern(args)?),
        Command::InstNot => DirectiveKind::InstNot(pattern(args)?),
        Command::InstCount => {
            let caps = COUNT_RE.captures(args).ok_or_else(invalid)?;
            let count = caps["count"].parse().map_err(|_| invalid())?;
            DirectiveKind::InstCount {
                pattern: pattern(&caps["pattern"])?,
                count,
            }
        }
        Command::Checker | Command::SkipIf | Command::Run | Command::RunPaoc => {
            DirectiveKind::Reserved(command)
        }
    };

    Ok(Directive {
        kind,
        args: args.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::{Command, DirectiveKind, DirectiveSyntax, ParseError, parse_transcript};

    fn parse(source: &str) -> super::Transcript {
        parse_transcript(source, &DirectiveSyntax::default())
    }

    #[test]
    fn parse_sample_transcript() {
        let source = r#"
// Copyright header, ignored.
//! CHECKER      concat loop
//! RUN          force_jit: true, options: "--compiler-regex=.*concat_loop0.*"
//! METHOD       "ets_string_concat_loop.ETSGLOBAL::concat_loop0"
//! PASS_AFTER   "SimplifyStringBuilder"
//! INST_COUNT   /Intrinsic.StdCoreSbAppendString/,2
//! IN_BLOCK     /loop/
//! INST         /StringBuilder::<ctor>/
//! INST_NOT     /Intrinsic.StdCoreSbToString/

function concat_loop0(a: String, n: int): String {
    return a;
}
"#;
        let transcript = parse(source);
        assert_eq!(transcript.errors().count(), 0);

        let directives: Vec<_> = transcript.directives().collect();
        assert_eq!(directives.len(), 8);

        assert!(matches!(directives[0].kind, DirectiveKind::Reserved(Command::Checker)));
        assert!(matches!(directives[1].kind, DirectiveKind::Reserved(Command::Run)));
        assert!(matches!(
            &directives[2].kind,
            DirectiveKind::Method(name) if name == "ets_string_concat_loop.ETSGLOBAL::concat_loop0"
        ));
        assert_eq!(directives[2].line, 5);
        assert!(matches!(
            &directives[3].kind,
            DirectiveKind::PassAfter(name) if name == "SimplifyStringBuilder"
        ));
        assert!(matches!(
            &directives[4].kind,
            DirectiveKind::InstCount { pattern, count: 2 }
                if pattern.to_string() == "Intrinsic.StdCoreSbAppendString"
        ));
        assert!(matches!(&directives[5].kind, DirectiveKind::InBlock(p) if p.to_string() == "loop"));
        assert!(matches!(&directives[6].kind, DirectiveKind::Inst(p) if p.is_regex()));
        assert_eq!(directives[7].command_name(), "INST_NOT");
    }

    #[test]
    fn malformed_lines_do_not_stop_parsing() {
        let source = "\
//! METHOD concat_loop0
//! INST_COUNT /AppendString/
//! INST /(unclosed/
//! INST /ToString/
";
        let transcript = parse(source);
        assert_eq!(transcript.entries.len(), 4);

        let errors: Vec<_> = transcript.errors().collect();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            errors[0],
            ParseError::InvalidFormat { command: Command::Method, line: 1, .. }
        ));
        assert_eq!(errors[1].to_string(), "Invalid INST_COUNT format at line 2");
        assert!(matches!(errors[2], ParseError::InvalidPattern { line: 3, .. }));

        let directives: Vec<_> = transcript.directives().collect();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].line, 4);
    }

    #[test]
    fn unknown_commands_are_kept() {
        let transcript = parse("//! EXPECT_FOO bar\n//!\n");
        let directives: Vec<_> = transcript.directives().collect();
        assert_eq!(directives.len(), 1);
        assert!(matches!(&directives[0].kind, DirectiveKind::Unknown(t) if t == "EXPECT_FOO"));
        assert_eq!(directives[0].args, "bar");
    }

    #[test]
    fn count_with_spaces_and_commas() {
        let transcript = parse("//! INST_COUNT /a,b/ , 3\n//! INST_COUNT Call,0\n");
        let directives: Vec<_> = transcript.directives().collect();
        assert!(matches!(
            &directives[0].kind,
            DirectiveKind::InstCount { pattern, count: 3 } if pattern.to_string() == "a,b"
        ));
        assert!(matches!(
            &directives[1].kind,
            DirectiveKind::InstCount { pattern, count: 0 } if !pattern.is_regex()
        ));
    }

    #[test]
    fn trailing_text_after_patterns() {
        let transcript = parse(
            "\
//! INST /ToString/  trailing
//! IN_BLOCK /loop/ x
//! INST_COUNT /AppendString/,2 appends
",
        );
        assert_eq!(transcript.errors().count(), 0);

        let directives: Vec<_> = transcript.directives().collect();
        assert!(matches!(&directives[0].kind, DirectiveKind::Inst(p) if p.to_string() == "ToString"));
        assert!(matches!(&directives[1].kind, DirectiveKind::InBlock(p) if p.to_string() == "loop"));
        assert!(matches!(
            &directives[2].kind,
            DirectiveKind::InstCount { pattern, count: 2 } if pattern.to_string() == "AppendString"
        ));
    }

    #[test]
    fn custom_marker() {
        let syntax = DirectiveSyntax {
            marker: "#!".to_string(),
        };
        let transcript = parse_transcript("//! INST /x/\n#! INST /y/\n", &syntax);
        let directives: Vec<_> = transcript.directives().collect();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].line, 2);
    }
}
