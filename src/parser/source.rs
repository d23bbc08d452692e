//! Source loading and meta-tags
//!
//! A script is `\n`-delimited, one statement per line. `//` starts a comment
//! that runs to the end of the line unless it appears inside a string
//! literal. A line of the form `[...]` is a meta-tag:
//!
//! | tag | effect |
//! |---|---|
//! | `[require <id>]` | the extension `<id>` must be registered before start |
//! | `[ignore <kw>...]` | statements led by these keywords are skipped |
//! | `[environment <name>]`, `[env <name>]` | host environment must match |
//! | `[display <name>]` | file name used in reports and console tags |
//! | `[ipt <n>]` | instructions per tick |
//! | `[strict]`, `[strict off]` | warnings become fatal |
//!
//! Meta-tag lines keep their line number but execute as no-ops.

use crate::interpreter::errors::RuntimeError;
use rustc_hash::FxHashSet;

/// A single parsed meta-tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaTag {
    Require(String),
    Ignore(Vec<String>),
    Environment(String),
    Display(String),
    InstructionsPerTick(usize),
    Strict(bool),
}

/// Per-load state collected from meta-tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub required: Vec<String>,
    pub ignored: FxHashSet<String>,
    pub tags: Vec<MetaTag>,
    pub display_name: Option<String>,
    pub environment: Option<String>,
    pub instructions_per_tick: Option<usize>,
    pub strict: bool,
}

impl Metadata {
    fn apply(&mut self, tag: MetaTag) {
        match &tag {
            MetaTag::Require(id) => self.required.push(id.clone()),
            MetaTag::Ignore(keywords) => self.ignored.extend(keywords.iter().cloned()),
            MetaTag::Environment(name) => self.environment = Some(name.clone()),
            MetaTag::Display(name) => self.display_name = Some(name.clone()),
            MetaTag::InstructionsPerTick(n) => self.instructions_per_tick = Some(*n),
            MetaTag::Strict(on) => self.strict = *on,
        }
        self.tags.push(tag);
    }
}

/// A loaded script: comment-stripped lines plus metadata
#[derive(Debug, Clone, Default)]
pub struct Source {
    pub lines: Vec<String>,
    pub metadata: Metadata,
}

impl Source {
    pub fn parse(text: &str) -> Result<Self, RuntimeError> {
        let mut source = Source::default();
        for (index, raw) in text.split('\n').enumerate() {
            let line = strip_comment(raw.trim_end_matches('\r')).trim().to_string();
            if is_meta_tag(&line) {
                let tag = parse_meta_tag(&line).map_err(|err| {
                    RuntimeError::Syntax(format!("{} (line {})", err.message(), index + 1))
                })?;
                source.metadata.apply(tag);
            }
            source.lines.push(line);
        }
        Ok(source)
    }
}

pub fn is_meta_tag(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('[') && line.ends_with(']')
}

/// Remove a trailing `//` comment that is not inside a string literal
pub fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut previous_slash = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => {
                in_string = !in_string;
                previous_slash = false;
            }
            '/' if !in_string => {
                if previous_slash {
                    return &line[..index - 1];
                }
                previous_slash = true;
            }
            _ => previous_slash = false,
        }
    }
    line
}

pub fn parse_meta_tag(line: &str) -> Result<MetaTag, RuntimeError> {
    let inner = line[1..line.len() - 1].trim();
    let mut words = inner.split_whitespace();
    let name = words
        .next()
        .ok_or_else(|| RuntimeError::Syntax("empty meta-tag".to_string()))?;
    let args: Vec<String> = words.map(str::to_string).collect();

    let single = |what: &str| -> Result<String, RuntimeError> {
        match args.as_slice() {
            [one] => Ok(one.clone()),
            _ => Err(RuntimeError::Syntax(format!(
                "meta-tag [{}] takes exactly one {}",
                name, what
            ))),
        }
    };

    match name {
        "require" => Ok(MetaTag::Require(single("extension id")?)),
        "ignore" => {
            if args.is_empty() {
                return Err(RuntimeError::Syntax(
                    "meta-tag [ignore] needs at least one keyword".to_string(),
                ));
            }
            Ok(MetaTag::Ignore(args))
        }
        "environment" | "env" => Ok(MetaTag::Environment(single("environment name")?)),
        "display" => {
            if args.is_empty() {
                return Err(RuntimeError::Syntax(
                    "meta-tag [display] needs a name".to_string(),
                ));
            }
            Ok(MetaTag::Display(args.join(" ")))
        }
        "ipt" => {
            let n = single("number")?;
            match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(MetaTag::InstructionsPerTick(n)),
                _ => Err(RuntimeError::Syntax(format!(
                    "meta-tag [ipt] needs a positive integer, got '{}'",
                    n
                ))),
            }
        }
        "strict" => match args.as_slice() {
            [] => Ok(MetaTag::Strict(true)),
            [off] if off == "off" => Ok(MetaTag::Strict(false)),
            _ => Err(RuntimeError::Syntax(
                "meta-tag [strict] accepts only 'off'".to_string(),
            )),
        },
        other => Err(RuntimeError::Syntax(format!("unknown meta-tag [{}]", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_stripping() {
        assert_eq!(strip_comment("log hi // comment"), "log hi ");
        assert_eq!(strip_comment(r#"log "a // b""#), r#"log "a // b""#);
        assert_eq!(strip_comment(r#"log "a" // b"#), r#"log "a" "#);
        assert_eq!(strip_comment("// whole line"), "");
        assert_eq!(strip_comment("divide x 2 / 3"), "divide x 2 / 3");
    }

    #[test]
    fn test_meta_tags_collected() {
        let text = "[require canvas]\n[ignore log set]\n[env browser]\n[display My Game]\n[ipt 5]\n[strict]\nlog hi";
        let source = Source::parse(text).unwrap();
        let meta = &source.metadata;
        assert_eq!(meta.required, vec!["canvas".to_string()]);
        assert!(meta.ignored.contains("log"));
        assert!(meta.ignored.contains("set"));
        assert_eq!(meta.environment.as_deref(), Some("browser"));
        assert_eq!(meta.display_name.as_deref(), Some("My Game"));
        assert_eq!(meta.instructions_per_tick, Some(5));
        assert!(meta.strict);
        assert_eq!(meta.tags.len(), 6);
        assert_eq!(source.lines.len(), 7);
    }

    #[test]
    fn test_strict_off() {
        let source = Source::parse("[strict]\n[strict off]").unwrap();
        assert!(!source.metadata.strict);
    }

    #[test]
    fn test_bad_meta_tags() {
        for text in ["[frobnicate]", "[ipt zero]", "[ipt 0]", "[require]", "[strict maybe]"] {
            assert!(Source::parse(text).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_line_numbers_preserved() {
        let source = Source::parse("log a\n\n// note\nlog b // tail").unwrap();
        assert_eq!(source.lines, vec!["log a", "", "", "log b"]);
    }
}
