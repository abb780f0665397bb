use super::*;
use log::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The name of one inlined occurrence of a component, eg `adder_i3`.
pub type ScopeName = String;

/// A wire as seen from inside one scope: the key of the flattening lookup table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopeWire {
    pub scope: ScopeName,
    pub bus: BusName,
    pub index: WireIndex,
}

impl ScopeWire {
    fn new(scope: &str, bus: &str, index: WireIndex) -> ScopeWire {
        ScopeWire {
            scope: scope.to_string(),
            bus: bus.to_string(),
            index,
        }
    }
}

impl std::fmt::Display for ScopeWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}[{}]", self.scope, self.bus, self.index)
    }
}

impl Component {
    /// Inlines the whole instance tree into a new component whose only instances
    /// are NAND gates and constant sources.
    ///
    /// Every bus of the result is a single wire. The interface keeps the original order:
    /// wire `i` of input bus `j` becomes one flat input bus, in bus order then wire order.
    /// `self` is left untouched.
    pub fn flatten(&self) -> Result<Component, InternalError> {
        info!("Flattening {}", self.name());
        let mut flattener = Flattener::new(self.name());
        let scope = flattener.define_scope(self.name());
        flattener.root_scope = scope.clone();
        flattener.flatten_buses(&scope, self, &BTreeSet::new())?;
        for instance in self.instances() {
            let (inputs, outputs) = flattener.resolve_instance_wires(&scope, instance)?;
            flattener.flatten_instance(instance, inputs, outputs)?;
        }

        for bus in self.input_buses() {
            for index in 0..bus.wires() {
                let wire = flattener.lookup_wire(&ScopeWire::new(&scope, bus.name(), index))?;
                flattener.result.input_bus_names.push(wire.bus().name().to_string());
            }
        }
        for bus in self.output_buses() {
            for index in 0..bus.wires() {
                let wire = flattener.lookup_wire(&ScopeWire::new(&scope, bus.name(), index))?;
                flattener.result.output_bus_names.push(wire.bus().name().to_string());
            }
        }

        let result = flattener.result;
        info!(
            "Flattened {} into {} buses and {} instances",
            self.name(),
            result.buses.len(),
            result.instances.len(),
        );
        Ok(result)
    }
}

/// State for one call to [`Component::flatten`].
struct Flattener {
    result: Component,
    root_scope: ScopeName,
    occurrences: BTreeMap<ComponentName, usize>,
    wire_lookup: BTreeMap<ScopeWire, BusWire>,
}

impl Flattener {
    fn new(name: &str) -> Flattener {
        Flattener {
            result: Component {
                name: name.to_string(),
                buses: BTreeMap::new(),
                input_bus_names: vec![],
                output_bus_names: vec![],
                instances: vec![],
            },
            root_scope: String::new(),
            occurrences: BTreeMap::new(),
            wire_lookup: BTreeMap::new(),
        }
    }

    fn define_scope(&mut self, name: &str) -> ScopeName {
        let count = self.occurrences.entry(name.to_string()).or_insert(0);
        *count += 1;
        format!("{name}_i{count}")
    }

    fn lookup_wire(&self, wire: &ScopeWire) -> Result<BusWire, InternalError> {
        match self.wire_lookup.get(wire) {
            Some(bus_wire) => Ok(bus_wire.clone()),
            None => Err(InternalError::UndefinedWire(wire.clone())),
        }
    }

    fn remember_wire(&mut self, wire: ScopeWire, bus_wire: BusWire) -> Result<(), InternalError> {
        if self.wire_lookup.contains_key(&wire) {
            return Err(InternalError::AlreadyDefinedWire(wire));
        }
        self.wire_lookup.insert(wire, bus_wire);
        Ok(())
    }

    /// Creates a fresh 1-wire bus in the result.
    /// If `name` is taken, `_2`, `_3`, ... is appended until it is not.
    fn new_flat_bus(&mut self, name: String) -> Result<BusWire, InternalError> {
        let mut unique_name = name.clone();
        let mut n = 1;
        while self.result.buses.contains_key(&unique_name) {
            n += 1;
            unique_name = format!("{name}_{n}");
        }
        if unique_name != name {
            debug!("Flat bus {name} already exists, using {unique_name}");
        }
        let bus = self.result.insert_bus(Bus::new(&unique_name, 1)?)?;
        BusWire::new(bus, 0)
    }

    fn flatten_bus(&mut self, scope: &str, bus: &Bus) -> Result<(), InternalError> {
        let prefix = if scope == self.root_scope {
            String::new()
        } else {
            format!("{scope}_")
        };
        for index in 0..bus.wires() {
            let name = if bus.wires() == 1 {
                format!("{prefix}{}", bus.name())
            } else {
                format!("{prefix}{}{index}", bus.name())
            };
            let bus_wire = self.new_flat_bus(name)?;
            self.remember_wire(ScopeWire::new(scope, bus.name(), index), bus_wire)?;
        }
        Ok(())
    }

    fn flatten_buses(&mut self, scope: &str, component: &Component, exclude: &BTreeSet<&str>) -> Result<(), InternalError> {
        for bus in component.buses() {
            if exclude.contains(bus.name()) {
                continue;
            }
            self.flatten_bus(scope, bus)?;
        }
        Ok(())
    }

    fn resolve_instance_wires(&self, parent_scope: &str, instance: &Instance) -> Result<(Vec<BusWire>, Vec<BusWire>), InternalError> {
        let resolve = |wires: &[BusWire]| -> Result<Vec<BusWire>, InternalError> {
            wires
                .iter()
                .map(|wire| self.lookup_wire(&ScopeWire::new(parent_scope, wire.bus().name(), wire.index())))
                .collect()
        };
        Ok((resolve(instance.inputs())?, resolve(instance.outputs())?))
    }

    /// Binds each wire of `buses` (in order) inside `scope` to the matching wire of `wires`.
    fn bind_io(&mut self, scope: &str, buses: &[Arc<Bus>], wires: Vec<BusWire>) -> Result<(), InternalError> {
        let mut wires = wires.into_iter();
        for bus in buses {
            for index in 0..bus.wires() {
                let wire = ScopeWire::new(scope, bus.name(), index);
                let bus_wire = wires.next().ok_or_else(|| InternalError::UndefinedWire(wire.clone()))?;
                self.remember_wire(wire, bus_wire)?;
            }
        }
        Ok(())
    }

    fn flatten_instance(&mut self, instance: &Instance, inputs: Vec<BusWire>, outputs: Vec<BusWire>) -> Result<(), InternalError> {
        match instance.definition() {
            Definition::Constants(constants) => {
                let leaf = Instance::new(Definition::Constants(constants.clone()), vec![], outputs)?;
                self.result.instances.push(leaf);
            },
            Definition::Nand => {
                let leaf = Instance::new(Definition::Nand, inputs, outputs)?;
                self.result.instances.push(leaf);
            },
            Definition::Component(component) => {
                if inputs.len() != component.input_wires() {
                    let name = component.name().to_string();
                    return Err(InternalError::ArityMismatch(name, Direction::Incoming, component.input_wires(), inputs.len()));
                }
                if outputs.len() != component.output_wires() {
                    let name = component.name().to_string();
                    return Err(InternalError::ArityMismatch(name, Direction::Outgoing, component.output_wires(), outputs.len()));
                }

                let scope = self.define_scope(component.name());
                debug!("Inlining {} as {scope}", component.name());
                self.bind_io(&scope, &component.input_buses(), inputs)?;
                self.bind_io(&scope, &component.output_buses(), outputs)?;

                let io_bus_names: BTreeSet<&str> = component
                    .input_names()
                    .iter()
                    .chain(component.output_names().iter())
                    .map(|name| name.as_str())
                    .collect();
                self.flatten_buses(&scope, component, &io_bus_names)?;

                for child in component.instances() {
                    let (child_inputs, child_outputs) = self.resolve_instance_wires(&scope, child)?;
                    self.flatten_instance(child, child_inputs, child_outputs)?;
                }
            },
        }
        Ok(())
    }
}
