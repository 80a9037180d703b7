use indexmap::IndexMap;

use crate::{Const, ControlNet, Value};

/// A memory attribute payload, as carried by the surrounding design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Int(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    pub depth: usize,
    pub width: usize,
    /// Concatenation of all rows, row 0 first. All-undef means uninitialized.
    pub init_value: Const,
    pub attributes: IndexMap<String, AttrValue>,
    pub write_ports: Vec<MemoryWritePort>,
    pub read_ports: Vec<MemoryReadPort>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryWritePort {
    pub addr: Value,
    pub data: Value,
    /// Per-bit write enable.
    pub mask: Value,
    /// A constant clock marks an unclocked port.
    pub clock: ControlNet,
    /// `priority_over[index]` is set iff this port overrides write port
    /// `index` on a same-address conflict; only lower-indexed ports appear.
    pub priority_over: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryReadPort {
    pub addr: Value,
    pub data_len: usize,
    /// `None` for an asynchronous (combinational) read port.
    pub flip_flop: Option<MemoryReadFlipFlop>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryReadFlipFlop {
    pub clock: ControlNet,
    pub clear: ControlNet, // async reset
    pub reset: ControlNet, // sync reset
    pub enable: ControlNet,
    /// When set, the clock enable takes priority over the sync reset.
    pub enable_over_reset: bool,

    pub clear_value: Const,
    pub reset_value: Const,
    pub init_value: Const,

    /// Relation to each write port, indexed by write port position.
    pub relations: Vec<MemoryPortRelation>,
}

/// What a read port observes when it reads the address a write port is
/// writing in the same cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemoryPortRelation {
    #[default]
    Undefined,
    ReadBeforeWrite,
    Transparent,
}

impl Memory {
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn has_init(&self) -> bool {
        !self.init_value.is_undef()
    }
}

impl MemoryWritePort {
    pub fn wide_log2(&self, memory: &Memory) -> usize {
        (self.data.len() / memory.width).ilog2() as usize
    }

    pub fn is_clocked(&self) -> bool {
        !self.clock.is_const()
    }
}

impl MemoryReadPort {
    pub fn asynchronous(addr: impl Into<Value>, data_len: usize) -> Self {
        Self { addr: addr.into(), data_len, flip_flop: None }
    }

    pub fn clocked(addr: impl Into<Value>, data_len: usize, clock: impl Into<ControlNet>) -> Self {
        Self {
            addr: addr.into(),
            data_len,
            flip_flop: Some(MemoryReadFlipFlop {
                clock: clock.into(),
                clear: ControlNet::ZERO,
                reset: ControlNet::ZERO,
                enable: ControlNet::ONE,
                enable_over_reset: false,
                clear_value: Const::undef(data_len),
                reset_value: Const::undef(data_len),
                init_value: Const::undef(data_len),
                relations: vec![],
            }),
        }
    }

    pub fn wide_log2(&self, memory: &Memory) -> usize {
        (self.data_len / memory.width).ilog2() as usize
    }
}

impl MemoryReadFlipFlop {
    pub fn with_enable(self, enable: impl Into<ControlNet>) -> Self {
        Self { enable: enable.into(), ..self }
    }

    pub fn with_clear_value(self, clear: impl Into<ControlNet>, clear_value: impl Into<Const>) -> Self {
        Self { clear: clear.into(), clear_value: clear_value.into(), ..self }
    }

    pub fn with_reset_value(self, reset: impl Into<ControlNet>, reset_value: impl Into<Const>) -> Self {
        Self { reset: reset.into(), reset_value: reset_value.into(), ..self }
    }

    pub fn with_init(self, value: impl Into<Const>) -> Self {
        Self { init_value: value.into(), ..self }
    }

    pub fn has_enable(&self) -> bool {
        !self.enable.is_always(true)
    }

    pub fn has_clear(&self) -> bool {
        !self.clear.is_always(false)
    }

    pub fn has_clear_value(&self) -> bool {
        !self.clear_value.is_undef()
    }

    pub fn has_reset(&self) -> bool {
        !self.reset.is_always(false)
    }

    pub fn has_reset_value(&self) -> bool {
        !self.reset_value.is_undef()
    }

    pub fn has_init_value(&self) -> bool {
        !self.init_value.is_undef()
    }
}
