//! Interactive prompts for rule source and SIEM choice.
//!
//! All console I/O goes through [`Prompter`], so the selection logic can be
//! driven from in-memory buffers in tests. The terminal prompter writes to
//! stderr, leaving stdout for query output.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::error::{ForgeError, Result};
use crate::registry;

/// ASCII art shown when interactive mode starts.
pub const BANNER: &str = r"
  _____ _                       ______
 / ____(_)                     |  ____|
| (___  _  __ _ _ __ ___   __ _| |__ ___  _ __ __ _  ___
 \___ \| |/ _` | '_ ` _ \ / _` |  __/ _ \| '__/ _` |/ _ \
 ____) | | (_| | | | | | | (_| | | | (_) | | | (_| |  __/
|_____/|_|\__, |_| |_| |_|\__,_|_|  \___/|_|  \__, |\___|
           __/ |                               __/ |
          |___/                               |___/

  One Sigma rule. Every SIEM.
";

/// Line-oriented console.
pub trait Prompter {
    /// Print one line.
    fn say(&mut self, line: &str) -> io::Result<()>;

    /// Read one line without its terminator. `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Print `prompt` (no newline) and read the answer.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// [`Prompter`] over any reader/writer pair.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_trimmed_line(&mut self.input)
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        self.read_line()
    }
}

/// Prompter on stdin / stderr.
///
/// Stdin is locked per line rather than held, so `-i -` can still read the
/// rest of stdin afterwards.
pub struct Terminal;

impl Prompter for Terminal {
    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stderr(), "{line}")
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_trimmed_line(&mut io::stdin().lock())
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut err = io::stderr();
        write!(err, "{prompt}")?;
        err.flush()?;
        self.read_line()
    }
}

fn read_trimmed_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Where the user said the rule comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// User pressed Enter without answering.
    Skipped,
    /// Rule pasted into the console.
    Inline(String),
    /// Path to an existing rule file.
    File(PathBuf),
}

/// Ask for a rule file path or pasted rule text.
pub fn prompt_rule_source<P: Prompter>(prompter: &mut P) -> Result<RuleSource> {
    let answer = prompter
        .ask("Sigma rule: path to YAML file, or 'paste' to enter inline, or Enter to skip: ")?
        .unwrap_or_default();
    let answer = answer.trim();

    if answer.is_empty() {
        return Ok(RuleSource::Skipped);
    }

    if answer.eq_ignore_ascii_case("paste") {
        prompter.say("Paste your Sigma rule (YAML). End with a line containing only '---' or Ctrl+D:")?;
        let text = read_pasted_rule(prompter)?;
        if text.trim().is_empty() {
            return Err(ForgeError::Usage("No content entered.".into()));
        }
        return Ok(RuleSource::Inline(text));
    }

    let path = PathBuf::from(answer);
    if !path.exists() {
        return Err(ForgeError::InputNotFound(path.display().to_string()));
    }
    Ok(RuleSource::File(path))
}

/// Collect pasted lines until a line that is only `---`, or end of input.
pub fn read_pasted_rule<P: Prompter>(prompter: &mut P) -> io::Result<String> {
    let mut lines = Vec::new();
    while let Some(line) = prompter.read_line()? {
        if line.trim() == "---" {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// Show the numbered SIEM menu and read the choice.
pub fn prompt_siem_choice<P: Prompter>(prompter: &mut P) -> Result<Vec<String>> {
    prompter.say(
        "\nTarget SIEM(s). Enter numbers (comma-separated) or names (comma-separated), \
         e.g. 1,3,5 or splunk,elasticsearch:",
    )?;
    for (i, id) in registry::canonical_order().iter().enumerate() {
        prompter.say(&format!("  {:2}. {}", i + 1, id))?;
    }
    let answer = prompter.ask("Choice: ")?.unwrap_or_default();
    Ok(parse_siem_choice(&answer))
}

/// Parse a menu answer such as `1, elk,3`.
///
/// Numbers index the display order (1-based); names must be registered ids
/// or aliases. Anything else is dropped. Duplicates keep their first position.
pub fn parse_siem_choice(raw: &str) -> Vec<String> {
    let order = registry::canonical_order();
    let mut chosen: Vec<String> = Vec::new();

    for part in raw.split(',').map(|p| p.trim().to_lowercase()) {
        if part.is_empty() {
            continue;
        }
        let id = if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse::<usize>()
                .ok()
                .filter(|&n| (1..=order.len()).contains(&n))
                .map(|n| order[n - 1].to_string())
        } else if registry::lookup(&part).is_some() {
            Some(part)
        } else {
            None
        };

        if let Some(id) = id {
            if !chosen.contains(&id) {
                chosen.push(id);
            }
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn prompter(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn numbers_and_names_mix() {
        assert_eq!(
            parse_siem_choice("1, elasticsearch ,3"),
            vec!["splunk", "elasticsearch", "azure-sentinel"]
        );
    }

    #[test]
    fn out_of_range_and_unknown_dropped() {
        assert_eq!(parse_siem_choice("0,99,bogus,2"), vec!["elasticsearch"]);
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        assert_eq!(
            parse_siem_choice("splunk,2,1,ELASTICSEARCH"),
            vec!["splunk", "elasticsearch"]
        );
    }

    #[test]
    fn aliases_accepted_by_name() {
        assert_eq!(parse_siem_choice("elk,helix"), vec!["elk", "helix"]);
    }

    #[test]
    fn empty_answer_selects_nothing() {
        assert!(parse_siem_choice("").is_empty());
        assert!(parse_siem_choice(" , ,").is_empty());
    }

    #[test]
    fn paste_stops_at_separator() {
        let mut p = prompter("title: X\r\nlevel: high\n---\nignored\n");
        assert_eq!(read_pasted_rule(&mut p).unwrap(), "title: X\nlevel: high");
    }

    #[test]
    fn paste_stops_at_end_of_input() {
        let mut p = prompter("title: X\nlevel: high");
        assert_eq!(read_pasted_rule(&mut p).unwrap(), "title: X\nlevel: high");
    }

    #[test]
    fn rule_source_paste() {
        let mut p = prompter("paste\ntitle: X\n---\n");
        assert_eq!(
            prompt_rule_source(&mut p).unwrap(),
            RuleSource::Inline("title: X".into())
        );
    }

    #[test]
    fn rule_source_empty_paste_is_usage_error() {
        let mut p = prompter("PASTE\n---\n");
        let err = prompt_rule_source(&mut p).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rule_source_skip() {
        assert_eq!(prompt_rule_source(&mut prompter("\n")).unwrap(), RuleSource::Skipped);
        assert_eq!(prompt_rule_source(&mut prompter("")).unwrap(), RuleSource::Skipped);
    }

    #[test]
    fn rule_source_file() {
        let rule = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        let input = format!("{}\n", rule.path().display());
        assert_eq!(
            prompt_rule_source(&mut prompter(&input)).unwrap(),
            RuleSource::File(rule.path().to_path_buf())
        );
    }

    #[test]
    fn rule_source_missing_file() {
        let err = prompt_rule_source(&mut prompter("/no/such/rule.yml\n")).unwrap_err();
        assert!(matches!(err, ForgeError::InputNotFound(_)));
    }

    #[test]
    fn siem_menu_is_numbered_in_display_order() {
        let mut p = prompter("2,1\n");
        let chosen = prompt_siem_choice(&mut p).unwrap();
        assert_eq!(chosen, vec!["elasticsearch", "splunk"]);

        let shown = String::from_utf8(p.into_output()).unwrap();
        assert!(shown.contains("   1. splunk\n"));
        assert!(shown.contains("  18. graylog\n"));
        assert!(shown.ends_with("Choice: "));
    }
}
