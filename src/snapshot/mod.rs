// Snapshot management for replaying an execution

use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;

/// Everything a traced run wrote to its context, in order
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Output written before byte offset `end`
    pub fn upto(&self, end: usize) -> &str {
        self.text.get(..end).unwrap_or(&self.text)
    }
}

/// What the engine was doing when a snapshot was taken
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Before the first node runs
    Start,
    Text,
    Echo,
    /// A loop compared its variable against the end bound
    LoopCheck { variable: String, continues: bool },
}

impl StepKind {
    pub fn describe(&self) -> String {
        match self {
            StepKind::Start => "start".to_string(),
            StepKind::Text => "text".to_string(),
            StepKind::Echo => "echo".to_string(),
            StepKind::LoopCheck {
                variable,
                continues: true,
            } => format!("FOR {}: next iteration", variable),
            StepKind::LoopCheck {
                variable,
                continues: false,
            } => format!("FOR {}: loop done", variable),
        }
    }
}

/// Snapshot of execution state
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub location: SourceLocation,
    pub kind: StepKind,
    /// Operand stack as the echo left it, before flushing
    pub operand_stack: Vec<Value>,
    /// Innermost binding of every loop variable
    pub variables: Vec<(String, Value)>,
    /// Transcript range written by this step
    pub output_start: usize,
    pub output_end: usize,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        fn value_size(value: &Value) -> usize {
            match value {
                Value::Str(s) => 24 + s.len(),
                _ => 16,
            }
        }

        let stack_size: usize = self.operand_stack.iter().map(value_size).sum();
        let variable_size: usize = self
            .variables
            .iter()
            .map(|(name, value)| 24 + name.len() + value_size(value))
            .sum();

        std::mem::size_of::<Snapshot>() + stack_size + variable_size
    }
}

/// Manages execution history for replay
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    transcript: Transcript,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            transcript: Transcript::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), RuntimeError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(RuntimeError::SnapshotLimitExceeded {
                current: self.current_memory + snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Record output; counted against the memory limit on the next push
    pub fn print(&mut self, text: &str) {
        self.current_memory += text.len();
        self.transcript.print(text);
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(start: usize, end: usize) -> Snapshot {
        Snapshot {
            location: SourceLocation::new(1, 1),
            kind: StepKind::Text,
            operand_stack: Vec::new(),
            variables: Vec::new(),
            output_start: start,
            output_end: end,
        }
    }

    #[test]
    fn test_transcript_ranges() {
        let mut history = SnapshotManager::new(1 << 20);
        history.print("Hello, ");
        history.push(snapshot(0, 7)).unwrap();
        history.print("world");
        history.push(snapshot(7, 12)).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.transcript().upto(7), "Hello, ");
        assert_eq!(history.transcript().as_str(), "Hello, world");
    }

    #[test]
    fn test_memory_limit() {
        let limit = snapshot(0, 0).estimated_size();
        let mut history = SnapshotManager::new(limit);
        history.push(snapshot(0, 0)).unwrap();
        let err = history.push(snapshot(0, 0)).unwrap_err();
        assert!(matches!(err, RuntimeError::SnapshotLimitExceeded { .. }));
        assert_eq!(history.len(), 1);
        assert_eq!(history.memory_limit(), limit);
    }

    #[test]
    fn test_loop_check_description() {
        let kind = StepKind::LoopCheck {
            variable: "i".to_string(),
            continues: false,
        };
        assert_eq!(kind.describe(), "FOR i: loop done");
    }
}
