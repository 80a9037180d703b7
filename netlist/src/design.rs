use std::collections::BTreeMap;

use crate::{Memory, Net, Value};

/// The combinational cells the mapper can see through. Anything else that
/// feeds a memory port is represented as a `Void` boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A named top-level input.
    Input(String, usize),
    /// Nets driven outside of the visible design.
    Void(usize),
    Not(Value),
    And(Value, Value),
    Or(Value, Value),
    Xor(Value, Value),
    /// `Mux(sel, if_true, if_false)`.
    Mux(Net, Value, Value),
    /// A named top-level output.
    Output(String, Value),
}

impl Cell {
    fn output_len(&self) -> usize {
        match self {
            Cell::Input(_, width) => *width,
            Cell::Void(width) => *width,
            Cell::Not(arg) => arg.len(),
            Cell::And(arg1, _) => arg1.len(),
            Cell::Or(arg1, _) => arg1.len(),
            Cell::Xor(arg1, _) => arg1.len(),
            Cell::Mux(_, arg1, _) => arg1.len(),
            Cell::Output(_, _) => 0,
        }
    }
}

/// A flat container of cells and memories; just enough of a netlist for
/// memory mapping decisions to be made against.
#[derive(Debug, Clone, Default)]
pub struct Design {
    cells: Vec<(Cell, Value)>,
    memories: Vec<Memory>,
    drivers: BTreeMap<Net, (usize, usize)>,
    next_net: usize,
}

impl Design {
    pub fn new() -> Design {
        Design::default()
    }

    fn add_cell(&mut self, cell: Cell) -> Value {
        let width = cell.output_len();
        let output = Value::from_iter((self.next_net..self.next_net + width).map(Net::from_index));
        self.next_net += width;
        let index = self.cells.len();
        for (offset, net) in output.iter().enumerate() {
            self.drivers.insert(net, (index, offset));
        }
        self.cells.push((cell, output.clone()));
        output
    }

    pub fn add_input(&mut self, name: impl Into<String>, width: usize) -> Value {
        self.add_cell(Cell::Input(name.into(), width))
    }

    pub fn add_void(&mut self, width: usize) -> Value {
        self.add_cell(Cell::Void(width))
    }

    pub fn add_not(&mut self, arg: impl Into<Value>) -> Value {
        self.add_cell(Cell::Not(arg.into()))
    }

    pub fn add_and(&mut self, arg1: impl Into<Value>, arg2: impl Into<Value>) -> Value {
        let (arg1, arg2) = (arg1.into(), arg2.into());
        assert_eq!(arg1.len(), arg2.len());
        self.add_cell(Cell::And(arg1, arg2))
    }

    pub fn add_or(&mut self, arg1: impl Into<Value>, arg2: impl Into<Value>) -> Value {
        let (arg1, arg2) = (arg1.into(), arg2.into());
        assert_eq!(arg1.len(), arg2.len());
        self.add_cell(Cell::Or(arg1, arg2))
    }

    pub fn add_xor(&mut self, arg1: impl Into<Value>, arg2: impl Into<Value>) -> Value {
        let (arg1, arg2) = (arg1.into(), arg2.into());
        assert_eq!(arg1.len(), arg2.len());
        self.add_cell(Cell::Xor(arg1, arg2))
    }

    pub fn add_mux(&mut self, sel: Net, arg1: impl Into<Value>, arg2: impl Into<Value>) -> Value {
        let (arg1, arg2) = (arg1.into(), arg2.into());
        assert_eq!(arg1.len(), arg2.len());
        self.add_cell(Cell::Mux(sel, arg1, arg2))
    }

    pub fn add_output(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.add_cell(Cell::Output(name.into(), value.into()));
    }

    pub fn add_memory(&mut self, memory: Memory) -> usize {
        self.memories.push(memory);
        self.memories.len() - 1
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (&Cell, &Value)> {
        self.cells.iter().map(|(cell, output)| (cell, output))
    }

    /// Looks up the cell driving `net` and the bit position of `net` within
    /// its output. Constant nets and void nets have no driver.
    pub fn driver(&self, net: Net) -> Option<(&Cell, usize)> {
        let &(index, offset) = self.drivers.get(&net)?;
        match &self.cells[index].0 {
            Cell::Void(_) => None,
            cell => Some((cell, offset)),
        }
    }
}
