use super::*;
use std::sync::Arc;

/// A named group of one or more parallel wires.
#[derive(Debug, PartialEq, Eq)]
pub struct Bus {
    name: BusName,
    wires: usize,
}

impl Bus {
    pub fn new(name: &str, wires: usize) -> Result<Bus, InternalError> {
        if wires == 0 {
            return Err(InternalError::ZeroWidthBus(name.to_string()));
        }
        Ok(Bus {
            name: name.to_string(),
            wires,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wires(&self) -> usize {
        self.wires
    }
}

/// One wire within a bus.
///
/// Holds a back-reference to the bus; it does not own it.
#[derive(Debug, Clone)]
pub struct BusWire {
    bus: Arc<Bus>,
    index: WireIndex,
}

impl BusWire {
    pub fn new(bus: Arc<Bus>, index: WireIndex) -> Result<BusWire, InternalError> {
        if index >= bus.wires() {
            return Err(InternalError::WireOutOfRange(bus.name().to_string(), index, bus.wires()));
        }
        Ok(BusWire { bus, index })
    }

    /// Every wire of `bus`, in index order.
    pub fn all(bus: &Arc<Bus>) -> Vec<BusWire> {
        (0..bus.wires())
            .map(|index| BusWire { bus: bus.clone(), index })
            .collect()
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    pub fn index(&self) -> WireIndex {
        self.index
    }
}

impl std::fmt::Display for BusWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bus.wires() > 1 {
            write!(f, "{}[{}]", self.bus.name(), self.index)
        } else {
            write!(f, "{}", self.bus.name())
        }
    }
}
