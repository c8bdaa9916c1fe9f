//! Console operator: line-based prompts over any reader/writer pair.
//!
//! Prompts go to the writer (stderr for the real console) so that stdout
//! only carries results, including `--json` output.

use mcpreg_core::{Operator, RegistryError, Result};
use std::io::{BufRead, Stderr, StdinLock, Write};

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    /// Ask and return the trimmed answer, possibly empty.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;
        self.read_answer()
    }

    /// Ask until a non-blank answer arrives.
    pub fn ask_required(&mut self, question: &str) -> Result<String> {
        loop {
            let answer = self.ask(question)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say("A value is required.")?;
        }
    }

    /// Ask with a default used for a blank answer. An empty default shows no
    /// brackets.
    pub fn ask_default(&mut self, question: &str, default: &str) -> Result<String> {
        if default.is_empty() {
            return self.ask(question);
        }
        let answer = self.ask(&format!("{question} [{default}]"))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    pub fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.ask(&format!("{question} (y/n)"))?;
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }

    /// Pick one of `choices` by number or by value (case-insensitive). A
    /// blank answer selects `default`.
    pub fn choose(&mut self, question: &str, choices: &[&str], default: &str) -> Result<String> {
        self.list_choices(choices.iter().copied())?;
        loop {
            let answer = self.ask_default(question, default)?;
            if let Some(choice) = pick(&answer, choices.iter().copied()) {
                return Ok(choice.to_string());
            }
            self.say(&format!("Choose one of: {}", choices.join(", ")))?;
        }
    }

    fn list_choices<'a>(&mut self, choices: impl Iterator<Item = &'a str>) -> Result<()> {
        for (i, choice) in choices.enumerate() {
            writeln!(self.output, "  {}. {choice}", i + 1)?;
        }
        Ok(())
    }

    fn read_answer(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(RegistryError::Prompt("input closed".into()));
        }
        Ok(line.trim().to_string())
    }
}

/// Match `answer` against `choices` by 1-based index or by value.
fn pick<'a>(answer: &str, mut choices: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| choices.nth(i));
    }
    choices.find(|c| c.eq_ignore_ascii_case(answer))
}

impl<R: BufRead, W: Write> Operator for Console<R, W> {
    fn answer(&mut self, question: &str, choices: &[String]) -> Result<String> {
        self.say("")?;
        if choices.is_empty() {
            return self.ask(question);
        }
        self.say(question)?;
        self.list_choices(choices.iter().map(String::as_str))?;
        let answer = self.ask("Answer")?;
        // A number picks a listed choice; anything else is passed through.
        Ok(pick(&answer, choices.iter().map(String::as_str))
            .map(str::to_string)
            .unwrap_or(answer))
    }
}
