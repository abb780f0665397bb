//! Loading a [`System`] from a JSON netlist document.
//!
//! ```json
//! { "source": "not.hdl",
//!   "components": [
//!     { "name": "not", "inputs": [{ "name": "in" }], "outputs": [{ "name": "out" }],
//!       "instances": [{ "of": "nand", "inputs": ["in", "in"], "outputs": ["out"] }] } ],
//!   "tests": [
//!     { "name": "not_one", "component": "not", "line": 10,
//!       "steps": [{ "set": [1], "line": 11 }, { "assert": [0], "line": 12 }] } ] }
//! ```
//!
//! Wire references are either `"bus"`, meaning every wire of the bus in order, or `"bus[i]"`.
//! An instance is `"of"` `"nand"`, `"constants"` (with one integer in `"values"` per output reference)
//! or the name of another component in the document.
use super::*;
use log::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemDoc {
    source: Option<String>,
    #[serde(default)]
    components: Vec<ComponentDoc>,
    #[serde(default)]
    tests: Vec<TestDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BusDoc {
    name: String,
    #[serde(default = "one")]
    width: usize,
}

fn one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentDoc {
    name: String,
    #[serde(default)]
    inputs: Vec<BusDoc>,
    #[serde(default)]
    outputs: Vec<BusDoc>,
    #[serde(default)]
    buses: Vec<BusDoc>,
    #[serde(default)]
    instances: Vec<InstanceDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstanceDoc {
    of: String,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    values: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestDoc {
    name: String,
    component: String,
    #[serde(default)]
    steps: Vec<StepDoc>,
    line: Option<usize>,
    col: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepDoc {
    set: Option<Vec<u64>>,
    assert: Option<Vec<u64>>,
    expect: Option<Vec<u64>>,
    line: Option<usize>,
    col: Option<usize>,
}

const NAND: &str = "nand";
const CONSTANTS: &str = "constants";

/// Loads a system from a JSON document.
/// Locations point into the document's `"source"`, if it names one.
pub fn load_system_from_str(text: &str) -> Result<System, LoadError> {
    let doc: SystemDoc = serde_json::from_str(text)?;
    let source = match &doc.source {
        Some(source) => Source::from_file(source),
        None => Source::Unknown,
    };
    build_system(&doc, source)
}

/// Loads a system from a JSON file.
///
/// A relative `"source"` is taken relative to the file's directory.
/// Without one, locations point into the JSON file itself.
pub fn load_system_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<System, LoadError> {
    let path = path.as_ref();
    info!("Loading {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|error| LoadError::Io(path.to_owned(), error))?;
    let doc: SystemDoc = serde_json::from_str(&text)?;
    let source = match &doc.source {
        Some(source) => {
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new(""));
            Source::from_file(dir.join(source))
        },
        None => Source::from_file(path),
    };
    build_system(&doc, source)
}

fn build_system(doc: &SystemDoc, source: Source) -> Result<System, LoadError> {
    let mut system = System::new();

    let mut docs_by_name: BTreeMap<&str, &ComponentDoc> = BTreeMap::new();
    for component_doc in &doc.components {
        let name = component_doc.name.as_str();
        if name == NAND || name == CONSTANTS {
            return Err(LoadError::ReservedName(name.to_string()));
        }
        if docs_by_name.insert(name, component_doc).is_some() {
            return Err(LoadError::DuplicateComponent(name.to_string()));
        }
    }

    for component_doc in order_components(&docs_by_name)? {
        let component = build_component(component_doc, &system)?;
        debug!("Loaded component {}", component.name());
        system.add_component(Arc::new(component));
    }

    for test_doc in &doc.tests {
        let test = build_test(test_doc, &system, &source)?;
        if system.add_test(test).is_some() {
            return Err(LoadError::DuplicateTest(test_doc.name.clone()));
        }
    }
    Ok(system)
}

/// Orders components so that every component comes after the components it instantiates.
fn order_components<'a>(docs_by_name: &BTreeMap<&str, &'a ComponentDoc>) -> Result<Vec<&'a ComponentDoc>, LoadError> {
    use petgraph::graph::{DiGraph, NodeIndex};
    use petgraph::algo::toposort;

    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut node_by_name: BTreeMap<&str, NodeIndex> = BTreeMap::new();

    for name in docs_by_name.keys() {
        let node = graph.add_node(*name);
        node_by_name.insert(*name, node);
    }

    for (name, component_doc) in docs_by_name {
        let node = node_by_name[name];
        for instance_doc in &component_doc.instances {
            let of = instance_doc.of.as_str();
            if of == NAND || of == CONSTANTS {
                continue;
            }
            match node_by_name.get(of) {
                Some(dependency) => {
                    graph.add_edge(node, *dependency, ());
                },
                None => return Err(LoadError::NoSuchDefinition(name.to_string(), of.to_string())),
            }
        }
    }

    let mut sorted: Vec<NodeIndex> = toposort(&graph, None)
        .map_err(|cycle| LoadError::Cycle(graph[cycle.node_id()].to_string()))?;
    sorted.reverse();

    Ok(sorted.into_iter().map(|node| docs_by_name[graph[node]]).collect())
}

fn bus_from_doc(component_name: &str, bus_doc: &BusDoc) -> Result<Bus, LoadError> {
    Bus::new(&bus_doc.name, bus_doc.width).map_err(|error| LoadError::Netlist(component_name.to_string(), error))
}

fn build_component(doc: &ComponentDoc, system: &System) -> Result<Component, LoadError> {
    let netlist_error = |error: InternalError| LoadError::Netlist(doc.name.clone(), error);

    let inputs = doc.inputs.iter().map(|bus_doc| bus_from_doc(&doc.name, bus_doc)).collect::<Result<Vec<_>, _>>()?;
    let outputs = doc.outputs.iter().map(|bus_doc| bus_from_doc(&doc.name, bus_doc)).collect::<Result<Vec<_>, _>>()?;
    let mut component = Component::new(&doc.name, inputs, outputs).map_err(netlist_error)?;
    for bus_doc in &doc.buses {
        component.define_bus(&bus_doc.name, bus_doc.width).map_err(netlist_error)?;
    }

    for instance_doc in &doc.instances {
        let input_groups = resolve_wire_refs(&component, &instance_doc.inputs)?;
        let output_groups = resolve_wire_refs(&component, &instance_doc.outputs)?;

        let definition = match instance_doc.of.as_str() {
            NAND => Definition::Nand,
            CONSTANTS => {
                if instance_doc.values.len() != output_groups.len() {
                    return Err(LoadError::ConstantCount(doc.name.clone(), output_groups.len(), instance_doc.values.len()));
                }
                let mut values = vec![];
                for (value, group) in instance_doc.values.iter().zip(&output_groups) {
                    let value = Value::from_u64(*value, group.len())
                        .map_err(|error| LoadError::ConstantValue(doc.name.clone(), error))?;
                    values.push(value);
                }
                Definition::Constants(Constants::new(values))
            },
            name => match system.component(name) {
                Some(child) => Definition::Component(child),
                None => return Err(LoadError::NoSuchDefinition(doc.name.clone(), name.to_string())),
            },
        };
        if !instance_doc.values.is_empty() && !matches!(definition, Definition::Constants(_)) {
            return Err(LoadError::ConstantCount(doc.name.clone(), 0, instance_doc.values.len()));
        }

        let inputs = input_groups.into_iter().flatten().collect();
        let outputs = output_groups.into_iter().flatten().collect();
        component.add_instance(definition, inputs, outputs).map_err(netlist_error)?;
    }
    Ok(component)
}

/// Resolves each wire reference to the wires it names.
fn resolve_wire_refs(component: &Component, wire_refs: &[String]) -> Result<Vec<Vec<BusWire>>, LoadError> {
    wire_refs.iter().map(|wire_ref| resolve_wire_ref(component, wire_ref)).collect()
}

fn resolve_wire_ref(component: &Component, wire_ref: &str) -> Result<Vec<BusWire>, LoadError> {
    let bad_wire_ref = || LoadError::BadWireRef(component.name().to_string(), wire_ref.to_string());
    match wire_ref.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
        Some((bus_name, index)) => {
            let index: WireIndex = index.trim().parse().map_err(|_| bad_wire_ref())?;
            let wire = component.wire(bus_name.trim(), index).map_err(|_| bad_wire_ref())?;
            Ok(vec![wire])
        },
        None => {
            let bus = component.bus(wire_ref.trim()).ok_or_else(bad_wire_ref)?;
            Ok(BusWire::all(&bus))
        },
    }
}

fn loc_of(source: &Source, line: Option<usize>, col: Option<usize>) -> Loc {
    match line {
        Some(line) => Loc::new(source.clone(), line, col.unwrap_or(1)),
        None => Loc::in_source(source.clone()),
    }
}

fn encode_values(loc: &Loc, what: &str, buses: &[Arc<Bus>], values: &[u64]) -> Result<Vec<Value>, LoadError> {
    if values.len() != buses.len() {
        let message = format!("{what} needs {} values, got {}", buses.len(), values.len());
        return Err(LoadError::BadStep(loc.clone(), message));
    }
    buses
        .iter()
        .zip(values)
        .map(|(bus, value)| Value::from_u64(*value, bus.wires()).map_err(|error| LoadError::Value(loc.clone(), error)))
        .collect()
}

fn build_test(doc: &TestDoc, system: &System, source: &Source) -> Result<Test, LoadError> {
    let loc = loc_of(source, doc.line, doc.col);
    let component = system
        .component(&doc.component)
        .ok_or_else(|| LoadError::NoSuchComponent(loc.clone(), doc.component.clone()))?;
    let input_buses = component.input_buses();
    let output_buses = component.output_buses();

    let mut test = Test::new(&doc.name, loc, component.clone());
    for step_doc in &doc.steps {
        let loc = loc_of(source, step_doc.line, step_doc.col);
        let step = match (&step_doc.set, &step_doc.assert, &step_doc.expect) {
            (Some(values), None, None) => {
                TestStep::SetInputs(loc.clone(), encode_values(&loc, "set", &input_buses, values)?)
            },
            (None, Some(values), None) => {
                let values = encode_values(&loc, "assert", &output_buses, values)?;
                TestStep::CheckOutputs(loc, CheckKind::Assert, values)
            },
            (None, None, Some(values)) => {
                let values = encode_values(&loc, "expect", &output_buses, values)?;
                TestStep::CheckOutputs(loc, CheckKind::Expect, values)
            },
            _ => {
                let message = "a step needs exactly one of set, assert or expect".to_string();
                return Err(LoadError::BadStep(loc, message));
            },
        };
        test.add_step(step);
    }
    Ok(test)
}
