use log::{info, warn};
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::answers::{Answer, AnswerParseError, AnswerSet};
use crate::schema::{ChoiceOption, Question, QuestionKind, QuestionSchema};

const RULE_WIDE: usize = 80;
const RULE_SECTION: usize = 60;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Failed to talk to the operator: {0}")]
    Io(#[from] io::Error),
    #[error("Input closed while waiting for an answer to '{0}'")]
    InputClosed(String),
    #[error(transparent)]
    Answers(#[from] AnswerParseError),
}

/// Where the answers come from.
#[derive(Debug, Clone)]
pub enum AnswerSource {
    Interactive,
    /// A flat JSON answer document.
    AnswersFile(PathBuf),
    /// A YAML document, flat or shaped like a generated `config.yaml`.
    ConfigFile(PathBuf),
    Supplied(AnswerSet),
}

/// Produces the answer set for `schema` from `source`.
///
/// Supplied answers are not checked against the option sets; unrecognized values are
/// resolved downstream. Keys that are not question ids are dropped.
pub fn collect<R: BufRead, W: Write>(
    schema: &QuestionSchema,
    source: AnswerSource,
    console: &mut Console<R, W>,
) -> Result<AnswerSet, CollectError> {
    let mut answers = match source {
        AnswerSource::Interactive => return console.run(schema),
        AnswerSource::AnswersFile(path) => {
            info!("Loading answers from {:?}", path);
            let content = std::fs::read_to_string(&path).map_err(AnswerParseError::from)?;
            AnswerSet::from_json_str(&content)?
        }
        AnswerSource::ConfigFile(path) => {
            info!("Loading config from {:?}", path);
            let content = std::fs::read_to_string(&path).map_err(AnswerParseError::from)?;
            AnswerSet::from_yaml_str(&content)?
        }
        AnswerSource::Supplied(answers) => answers,
    };
    answers.retain_known(schema);
    Ok(answers)
}

/// Line-oriented operator dialogue over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Asks every question of `schema` in document order.
    pub fn run(&mut self, schema: &QuestionSchema) -> Result<AnswerSet, CollectError> {
        let mut answers = AnswerSet::new();

        writeln!(self.output, "\n{}", "=".repeat(RULE_WIDE))?;
        writeln!(self.output, "AI Security Agent Generator - Interactive Mode")?;
        writeln!(self.output, "{}\n", "=".repeat(RULE_WIDE))?;

        for section in &schema.sections {
            writeln!(self.output, "\n{}", "=".repeat(RULE_SECTION))?;
            writeln!(self.output, "{}", section.name)?;
            writeln!(self.output, "{}\n", "=".repeat(RULE_SECTION))?;

            for question in &section.questions {
                let answer = self.ask(question)?;
                answers.insert(question.id.clone(), answer);
            }
        }
        Ok(answers)
    }

    pub fn ask(&mut self, question: &Question) -> Result<Answer, CollectError> {
        writeln!(self.output, "\n? {}", question.prompt)?;
        if let Some(description) = &question.description {
            writeln!(self.output, "  {}", description)?;
        }

        match question.kind {
            QuestionKind::FreeText | QuestionKind::MultiLineText => self.ask_text(question),
            QuestionKind::SingleChoice => self.ask_single(question),
            QuestionKind::MultiChoice => self.ask_multi(question),
        }
    }

    fn ask_text(&mut self, question: &Question) -> Result<Answer, CollectError> {
        if let Some(example) = &question.example {
            writeln!(self.output, "  Example: {}", example)?;
        }
        let entry = self.read_entry("  > ", question)?;
        if entry.is_empty() {
            if let Some(default) = question.default.as_deref().filter(|d| !d.is_empty()) {
                writeln!(self.output, "  Using default: {}", default)?;
                return Ok(Answer::text(default));
            }
        }
        Ok(Answer::Text(entry))
    }

    fn ask_single(&mut self, question: &Question) -> Result<Answer, CollectError> {
        writeln!(self.output, "\n  Options:")?;
        for (idx, option) in question.options.iter().enumerate() {
            self.print_option(idx + 1, option, true)?;
        }

        loop {
            let entry = self.read_entry("\n  Select (number): ", question)?;
            match entry.parse::<i64>() {
                Ok(choice) => match option_at(question, choice) {
                    Some(option) => return Ok(Answer::text(option.value.clone())),
                    None => writeln!(self.output, "  Invalid selection. Try again.")?,
                },
                Err(_) => writeln!(self.output, "  Please enter a number.")?,
            }
        }
    }

    fn ask_multi(&mut self, question: &Question) -> Result<Answer, CollectError> {
        writeln!(self.output, "\n  Options (comma-separated numbers):")?;
        for (idx, option) in question.options.iter().enumerate() {
            self.print_option(idx + 1, option, false)?;
        }

        let entry = self.read_entry("\n  Select (e.g., 1,3,5): ", question)?;
        if entry.is_empty() {
            return Ok(Answer::Many(BTreeSet::new()));
        }
        match parse_indices(&entry) {
            Some(indices) => Ok(Answer::Many(
                indices
                    .into_iter()
                    .filter_map(|idx| option_at(question, idx))
                    .map(|option| option.value.clone())
                    .collect(),
            )),
            None => {
                warn!("Unparseable selection {:?} for '{}'", entry, question.id);
                writeln!(self.output, "  Invalid input. Skipping.")?;
                Ok(Answer::Many(BTreeSet::new()))
            }
        }
    }

    fn print_option(
        &mut self,
        number: usize,
        option: &ChoiceOption,
        with_description: bool,
    ) -> io::Result<()> {
        match option.description.as_deref() {
            Some(desc) if with_description && !desc.is_empty() => {
                writeln!(self.output, "  {}. {} - {}", number, option.label, desc)
            }
            _ => writeln!(self.output, "  {}. {}", number, option.label),
        }
    }

    /// Reads one trimmed line.
    fn read_entry(&mut self, prompt: &str, question: &Question) -> Result<String, CollectError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(CollectError::InputClosed(question.id.clone()));
        }
        Ok(line.trim().to_string())
    }
}

/// Parses `"1, 3,5"` into 1-based indices. `None` if any entry is not an integer.
fn parse_indices(entry: &str) -> Option<Vec<i64>> {
    entry
        .split(',')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

/// The option at a 1-based `index`, if it is in range.
fn option_at(question: &Question, index: i64) -> Option<&ChoiceOption> {
    let index = usize::try_from(index).ok()?;
    index.checked_sub(1).and_then(|idx| question.options.get(idx))
}
