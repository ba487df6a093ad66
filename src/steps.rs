//! Step files driving the command-line trainer.
//!
//! One step per record: `response,goal_value,x,y,v0,v1,...`. A blank line
//! ends an episode and `#` starts a comment line.

use std::io::BufRead;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{Error, Result};

/// One sensed event with the response taken and the goal value it earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub response: i32,
    pub goal_value: f32,
    pub x: i32,
    pub y: i32,
    pub values: Vec<i32>,
}

fn field<T: FromStr>(line: usize, name: &str, text: &str) -> Result<T> {
    text.parse()
        .map_err(|_| Error::csv(line, format!("{name}: cannot parse {text:?}")))
}

impl Step {
    /// Decodes one record. `line` is the 1-based file line used in errors.
    pub fn from_record(line: usize, record: &StringRecord) -> Result<Self> {
        if record.len() < 5 {
            return Err(Error::csv(
                line,
                format!("expected at least 5 fields, found {}", record.len()),
            ));
        }
        let values = record
            .iter()
            .skip(4)
            .map(|v| field(line, "event value", v))
            .collect::<Result<Vec<i32>>>()?;
        Ok(Self {
            response: field(line, "response", &record[0])?,
            goal_value: field(line, "goal value", &record[1])?,
            x: field(line, "x", &record[2])?,
            y: field(line, "y", &record[3])?,
            values,
        })
    }
}

/// Parses one blank-line separated block whose first line is `first_line`.
fn read_block(first_line: usize, block: &str) -> Result<Vec<Step>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(block.as_bytes());

    let mut steps = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e
                .position()
                .map_or(first_line, |p| (first_line + p.line() as usize).saturating_sub(1));
            Error::csv(line, e.to_string())
        })?;
        let line = record
            .position()
            .map_or(first_line, |p| (first_line + p.line() as usize).saturating_sub(1));
        steps.push(Step::from_record(line, &record)?);
    }
    Ok(steps)
}

/// Reads every episode. Episodes holding only comments are skipped.
pub fn read_episodes<R: BufRead>(reader: R) -> Result<Vec<Vec<Step>>> {
    let mut blocks = Vec::new();
    let mut block = String::new();
    let mut first_line = 1;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            if !block.is_empty() {
                blocks.push((first_line, std::mem::take(&mut block)));
            }
            first_line = i + 2;
            continue;
        }
        block.push_str(line.trim_start());
        block.push('\n');
    }
    if !block.is_empty() {
        blocks.push((first_line, block));
    }

    let mut episodes = Vec::with_capacity(blocks.len());
    for (first_line, block) in blocks {
        let steps = read_block(first_line, &block)?;
        if !steps.is_empty() {
            episodes.push(steps);
        }
    }
    Ok(episodes)
}
