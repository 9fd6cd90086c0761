//! Word-list and file-name completion for the demo prompt.

use std::fs;
use std::path::{Path, PathBuf};

use core_completion::{Candidate, Completer, Completions, SuffixMatcher, TagOptions};
use core_text::motion::word_before;
use tracing::trace;

pub struct DemoCompleter {
    words: Vec<String>,
}

impl DemoCompleter {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Newline-separated words; blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let words = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Ok(Self::new(words))
    }

    fn files(&self, prefix: &str, out: Completions) -> Completions {
        let (dir, stem) = match prefix.rfind('/') {
            Some(i) => (&prefix[..=i], &prefix[i + 1..]),
            None => ("", prefix),
        };
        let read_from = if dir.is_empty() { PathBuf::from(".") } else { PathBuf::from(dir) };
        let entries = match fs::read_dir(&read_from) {
            Ok(entries) => entries,
            Err(e) => {
                trace!(target: "completion", dir = %read_from.display(), error = %e, "read_dir_failed");
                return out;
            }
        };
        let mut found: Vec<(String, bool)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                Some((name, is_dir))
            })
            .filter(|(name, _)| name.starts_with(stem) && (!name.starts_with('.') || stem.starts_with('.')))
            .collect();
        found.sort();

        let mut out = out.tag_options(
            "files",
            TagOptions {
                no_space: SuffixMatcher::new("/"),
                ..TagOptions::default()
            },
        );
        for (name, is_dir) in found {
            let (value, display, style) = if is_dir {
                (format!("{dir}{name}/"), format!("{name}/"), "dir")
            } else {
                (format!("{dir}{name}"), name, "file")
            };
            out = out.add(
                Candidate::new(value)
                    .with_display(display)
                    .with_style(style)
                    .with_tag("files"),
            );
        }
        out
    }
}

impl Completer for DemoCompleter {
    fn complete(&mut self, line: &[char], cursor: usize) -> Completions {
        let span = word_before(line, cursor);
        let first_word = line[..span.start].iter().all(|c| c.is_whitespace());
        let prefix: String = line[span].iter().collect();

        let mut out = Completions::new();
        if first_word {
            for word in self.words.iter().filter(|w| w.starts_with(&prefix)) {
                out = out.add(Candidate::new(word.clone()).with_tag("words"));
            }
        }
        self.files(&prefix, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(c: &Completions) -> Vec<String> {
        c.candidates.iter().map(|c| c.value.clone()).collect()
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn words_only_complete_the_first_word() {
        let mut completer = DemoCompleter::new(vec!["status".into(), "stash".into(), "commit".into()]);
        let line = chars("st");
        let found = values(&completer.complete(&line, 2));
        assert_eq!(&found[..2], &["status".to_string(), "stash".to_string()]);

        let line = chars("git zzz-no-such-entry");
        assert!(values(&completer.complete(&line, line.len())).is_empty());
    }

    #[test]
    fn directories_carry_a_removable_slash() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();
        fs::write(tmp.path().join(".hidden"), "").unwrap();

        let base = format!("{}/", tmp.path().display());
        let line = chars(&format!("cat {base}"));
        let out = DemoCompleter::new(Vec::new()).complete(&line, line.len());
        assert_eq!(values(&out), vec![format!("{base}a.txt"), format!("{base}sub/")]);
        assert_eq!(out.candidates[1].display, "sub/");
        assert!(out.tags.contains_key("files"));
    }

    #[test]
    fn words_file_skips_comments() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("words");
        fs::write(&path, "# verbs\ncommit\n\n  push  \n").unwrap();
        let completer = DemoCompleter::from_file(&path).unwrap();
        assert_eq!(completer.words, vec!["commit", "push"]);
    }
}
