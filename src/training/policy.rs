//! Deterministic policies and their text format.
//!
//! One action id per line, line `i` holding the action for state id `i`:
//!
//! ```text
//! 0
//! 1
//! 0
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Action;
use crate::encoding::StateId;
use crate::error::{Error, Result};

/// A table from state id to action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    actions: Vec<Action>,
}

impl Policy {
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Every state mapped to the same action.
    #[must_use]
    pub fn constant(num_states: usize, action: Action) -> Self {
        Self::new(vec![action; num_states])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// `None` when `state` is past the end of the table.
    #[must_use]
    pub fn get(&self, state: StateId) -> Option<Action> {
        self.actions.get(state).copied()
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        for action in &self.actions {
            writeln!(writer, "{}", action.index())?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut actions = Vec::new();
        for (i, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let action = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(Action::from_index)
                .ok_or_else(|| Error::PolicyParse {
                    line: i + 1,
                    content: line.clone(),
                })?;
            actions.push(action);
        }
        if actions.is_empty() {
            return Err(Error::EmptyPolicy);
        }
        Ok(Self { actions })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(File::create(path)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let policy = Self::read_from(File::open(path)?)?;
        log::debug!("loaded {} policy entries from {}", policy.len(), path.display());
        Ok(policy)
    }
}

impl FromIterator<Action> for Policy {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
