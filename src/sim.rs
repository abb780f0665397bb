use super::*;


use log::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Index of a bus of the flat component, in bus name order.
pub type NetId = usize;
/// One wire of the simulation state.
pub type WireId = (NetId, WireIndex);

/// How many settling passes [`Sim::simulate_until_stable`] may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassLimit {
    /// Twice the gate count plus a margin. Any netlist without feedback settles well within it.
    #[default]
    Auto,
    Fixed(usize),
    /// Loop until stable, even if that is forever.
    Unbounded,
}

const AUTO_PASS_MARGIN: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub pass_limit: PassLimit,
}

impl SimConfig {
    pub fn with_pass_limit(pass_limit: PassLimit) -> SimConfig {
        SimConfig { pass_limit }
    }
}

#[derive(Debug, Clone, Copy)]
struct Gate {
    a: WireId,
    b: WireId,
    r: WireId,
}

/// Simulation state of a flat component.
///
/// Every bus holds a bit vector of its own width, all zero at the start.
/// Constant sources are driven once when the state is built;
/// from then on only the NAND gates are evaluated.
#[derive(Debug)]
pub struct Sim {
    component: Arc<Component>,
    net_id_by_bus: BTreeMap<BusName, NetId>,
    net_values: Vec<Value>,
    gates: Vec<Gate>,
    input_net_ids: Vec<NetId>,
    output_net_ids: Vec<NetId>,
    max_passes: Option<usize>,
}

impl Sim {
    /// Builds the state for a flat component and settles it.
    pub fn new(component: Arc<Component>, config: &SimConfig) -> Result<Sim, SimError> {
        let net_id_by_bus: BTreeMap<BusName, NetId> = component
            .buses()
            .enumerate()
            .map(|(net_id, bus)| (bus.name().to_string(), net_id))
            .collect();
        let net_values: Vec<Value> = component.buses().map(|bus| Value::zero(bus.wires())).collect();
        let input_net_ids = component.input_names().iter().map(|name| net_id_by_bus[name]).collect();
        let output_net_ids = component.output_names().iter().map(|name| net_id_by_bus[name]).collect();

        let mut sim = Sim {
            component: component.clone(),
            net_id_by_bus,
            net_values,
            gates: vec![],
            input_net_ids,
            output_net_ids,
            max_passes: None,
        };

        let mut constants = vec![];
        for instance in component.instances() {
            match instance.definition() {
                Definition::Nand => {
                    let gate = Gate {
                        a: sim.wire_id(&instance.inputs()[0])?,
                        b: sim.wire_id(&instance.inputs()[1])?,
                        r: sim.wire_id(&instance.outputs()[0])?,
                    };
                    sim.gates.push(gate);
                },
                Definition::Constants(values) => constants.push((instance, values)),
                Definition::Component(child) => {
                    return Err(InternalError::UnflattenedInstance(child.name().to_string()).into());
                },
            }
        }

        for (instance, values) in constants {
            for (wire, bit) in instance.outputs().iter().zip(values.bits()) {
                let (net_id, index) = sim.wire_id(wire)?;
                sim.net_values[net_id].set_bit(index, bit);
            }
        }

        sim.max_passes = match config.pass_limit {
            PassLimit::Auto => Some(2 * sim.gates.len() + AUTO_PASS_MARGIN),
            PassLimit::Fixed(n) => Some(n),
            PassLimit::Unbounded => None,
        };
        debug!(
            "Simulating {} with {} nets, {} gates, pass limit {:?}",
            component.name(),
            sim.net_values.len(),
            sim.gates.len(),
            sim.max_passes,
        );

        sim.simulate_until_stable()?;
        Ok(sim)
    }

    fn wire_id(&self, wire: &BusWire) -> Result<WireId, InternalError> {
        let bus = wire.bus();
        match self.component.bus(bus.name()) {
            Some(own_bus) if Arc::ptr_eq(&own_bus, bus) => Ok((self.net_id_by_bus[bus.name()], wire.index())),
            _ => Err(InternalError::ForeignWire(self.component.name().to_string(), bus.name().to_string())),
        }
    }

    pub fn component(&self) -> &Arc<Component> {
        &self.component
    }

    /// Evaluates every gate in order, pass after pass, until a pass changes nothing.
    /// Returns the number of passes taken, including the final stable one.
    pub fn simulate_until_stable(&mut self) -> Result<usize, SimError> {
        let Sim { gates, net_values, max_passes, .. } = self;
        let mut passes = 0;
        loop {
            if let Some(max_passes) = *max_passes {
                if passes >= max_passes {
                    warn!("Netlist did not settle after {passes} passes");
                    return Err(SimError::DidNotConverge(passes));
                }
            }
            passes += 1;

            let mut stable = true;
            for Gate { a, b, r } in gates.iter() {
                let a_state = net_values[a.0].bit(a.1);
                let b_state = net_values[b.0].bit(b.1);
                let new_r_state = !(a_state && b_state);
                if net_values[r.0].bit(r.1) != new_r_state {
                    net_values[r.0].set_bit(r.1, new_r_state);
                    stable = false;
                }
            }
            trace!("Pass {passes}: {}", if stable { "stable" } else { "changed" });

            if stable {
                return Ok(passes);
            }
        }
    }

    /// Overwrites the input buses, in declared order, and settles.
    pub fn set_inputs(&mut self, values: &[Value]) -> Result<usize, SimError> {
        if values.len() != self.input_net_ids.len() {
            return Err(InternalError::InputShape(self.input_net_ids.len(), values.len()).into());
        }
        for (i, (net_id, value)) in self.input_net_ids.iter().zip(values).enumerate() {
            let width = self.net_values[*net_id].width();
            if value.width() != width {
                return Err(InternalError::InputWidth(i, width, value.width()).into());
            }
        }
        for (net_id, value) in self.input_net_ids.iter().zip(values) {
            self.net_values[*net_id] = value.clone();
        }
        self.simulate_until_stable()
    }

    pub fn inputs(&self) -> Vec<Value> {
        self.input_net_ids.iter().map(|net_id| self.net_values[*net_id].clone()).collect()
    }

    pub fn outputs(&self) -> Vec<Value> {
        self.output_net_ids.iter().map(|net_id| self.net_values[*net_id].clone()).collect()
    }

    pub fn peek(&self, bus_name: &str) -> Option<Value> {
        self.net_id_by_bus.get(bus_name).map(|net_id| self.net_values[*net_id].clone())
    }

    /// The current value of every bus, by name.
    pub fn bus_values(&self) -> BTreeMap<BusName, Value> {
        self.net_id_by_bus
            .iter()
            .map(|(name, net_id)| (name.clone(), self.net_values[*net_id].clone()))
            .collect()
    }
}
