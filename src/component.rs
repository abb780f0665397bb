use super::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A [`Component`] is a named, hierarchical definition: a set of buses,
/// an ordered interface of input and output buses, and an ordered list of instances.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) name: ComponentName,
    pub(crate) buses: BTreeMap<BusName, Arc<Bus>>,
    pub(crate) input_bus_names: Vec<BusName>,
    pub(crate) output_bus_names: Vec<BusName>,
    pub(crate) instances: Vec<Instance>,
}

/// One use of a [`Definition`], bound to concrete wires of the enclosing component.
#[derive(Debug, Clone)]
pub struct Instance {
    definition: Definition,
    inputs: Vec<BusWire>,
    outputs: Vec<BusWire>,
}

impl Instance {
    pub fn new(definition: Definition, inputs: Vec<BusWire>, outputs: Vec<BusWire>) -> Result<Instance, InternalError> {
        if inputs.len() != definition.input_wires() {
            let name = definition.name().to_string();
            return Err(InternalError::ArityMismatch(name, Direction::Incoming, definition.input_wires(), inputs.len()));
        }
        if outputs.len() != definition.output_wires() {
            let name = definition.name().to_string();
            return Err(InternalError::ArityMismatch(name, Direction::Outgoing, definition.output_wires(), outputs.len()));
        }
        Ok(Instance {
            definition,
            inputs,
            outputs,
        })
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn inputs(&self) -> &[BusWire] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[BusWire] {
        &self.outputs
    }
}

impl Component {
    /// Creates a component with the given interface.
    /// Input and output buses share one namespace; a repeated name is rejected.
    pub fn new(name: &str, inputs: Vec<Bus>, outputs: Vec<Bus>) -> Result<Component, InternalError> {
        let mut component = Component {
            name: name.to_string(),
            buses: BTreeMap::new(),
            input_bus_names: Vec::with_capacity(inputs.len()),
            output_bus_names: Vec::with_capacity(outputs.len()),
            instances: vec![],
        };
        for input in inputs {
            let bus_name = input.name().to_string();
            component.insert_bus(input)?;
            component.input_bus_names.push(bus_name);
        }
        for output in outputs {
            let bus_name = output.name().to_string();
            component.insert_bus(output)?;
            component.output_bus_names.push(bus_name);
        }
        Ok(component)
    }

    pub(crate) fn insert_bus(&mut self, bus: Bus) -> Result<Arc<Bus>, InternalError> {
        if self.buses.contains_key(bus.name()) {
            return Err(InternalError::DuplicateBus(bus.name().to_string()));
        }
        let bus = Arc::new(bus);
        self.buses.insert(bus.name().to_string(), bus.clone());
        Ok(bus)
    }

    /// Adds an internal bus.
    pub fn define_bus(&mut self, name: &str, wires: usize) -> Result<Arc<Bus>, InternalError> {
        self.insert_bus(Bus::new(name, wires)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self, name: &str) -> Option<Arc<Bus>> {
        self.buses.get(name).cloned()
    }

    pub fn buses(&self) -> impl Iterator<Item = &Arc<Bus>> {
        self.buses.values()
    }

    /// A single wire of one of this component's buses.
    pub fn wire(&self, name: &str, index: WireIndex) -> Result<BusWire, InternalError> {
        let bus = self.bus(name).ok_or_else(|| InternalError::NoSuchBus(name.to_string()))?;
        BusWire::new(bus, index)
    }

    pub fn input_names(&self) -> &[BusName] {
        &self.input_bus_names
    }

    pub fn output_names(&self) -> &[BusName] {
        &self.output_bus_names
    }

    pub fn input_buses(&self) -> Vec<Arc<Bus>> {
        self.input_bus_names.iter().map(|name| self.buses[name].clone()).collect()
    }

    pub fn output_buses(&self) -> Vec<Arc<Bus>> {
        self.output_bus_names.iter().map(|name| self.buses[name].clone()).collect()
    }

    pub fn input_wires(&self) -> usize {
        self.input_buses().iter().map(|bus| bus.wires()).sum()
    }

    pub fn output_wires(&self) -> usize {
        self.output_buses().iter().map(|bus| bus.wires()).sum()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Appends an instance of `definition`.
    ///
    /// Every wire must belong to a bus of this component,
    /// and the wire counts must match the definition's interface.
    pub fn add_instance(&mut self, definition: Definition, inputs: Vec<BusWire>, outputs: Vec<BusWire>) -> Result<(), InternalError> {
        for wire in inputs.iter().chain(outputs.iter()) {
            self.check_owns(wire)?;
        }
        let instance = Instance::new(definition, inputs, outputs)?;
        self.instances.push(instance);
        Ok(())
    }

    fn check_owns(&self, wire: &BusWire) -> Result<(), InternalError> {
        match self.buses.get(wire.bus().name()) {
            Some(bus) if Arc::ptr_eq(bus, wire.bus()) => Ok(()),
            _ => Err(InternalError::ForeignWire(self.name.clone(), wire.bus().name().to_string())),
        }
    }

    /// True when every instance is a gate or a constant source.
    pub fn is_flat(&self) -> bool {
        self.instances.iter().all(|instance| instance.definition().is_leaf())
    }
}

const INDENT: &str = "    ";

fn write_bus_decl(f: &mut std::fmt::Formatter<'_>, bus: &Bus) -> std::fmt::Result {
    write!(f, "{}", bus.name())?;
    if bus.wires() > 1 {
        write!(f, "[{}]", bus.wires())?;
    }
    Ok(())
}

fn write_wires(f: &mut std::fmt::Formatter<'_>, wires: &[BusWire]) -> std::fmt::Result {
    for (i, wire) in wires.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{wire}")?;
    }
    Ok(())
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_wires(f, &self.outputs)?;
        write!(f, ": ")?;
        match &self.definition {
            Definition::Constants(constants) => write!(f, "{constants}"),
            Definition::Nand | Definition::Component(_) => {
                write!(f, "{}(", self.definition.name())?;
                write_wires(f, &self.inputs)?;
                write!(f, ")")
            },
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "component {}(", self.name)?;
        for (i, bus) in self.input_buses().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_bus_decl(f, bus)?;
        }
        write!(f, ")(")?;
        for (i, bus) in self.output_buses().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_bus_decl(f, bus)?;
        }
        writeln!(f, ") {{")?;
        // 1-wire internal buses are implied by their first use.
        for (name, bus) in &self.buses {
            let is_io = self.input_bus_names.contains(name) || self.output_bus_names.contains(name);
            if bus.wires() == 1 || is_io {
                continue;
            }
            write!(f, "{INDENT}define ")?;
            write_bus_decl(f, bus)?;
            writeln!(f)?;
        }
        for instance in &self.instances {
            writeln!(f, "{INDENT}{instance}")?;
        }
        writeln!(f, "}}")
    }
}
