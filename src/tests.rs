use super::*;

use std::collections::BTreeSet;
use std::sync::Arc;

fn bus(name: &str, wires: usize) -> Bus {
    Bus::new(name, wires).unwrap()
}

/// `not(in)(out)`: a NAND with both inputs tied together.
fn inverter() -> Arc<Component> {
    let mut component = Component::new("not", vec![bus("in", 1)], vec![bus("out", 1)]).unwrap();
    let input = component.wire("in", 0).unwrap();
    let output = component.wire("out", 0).unwrap();
    component.add_instance(Definition::Nand, vec![input.clone(), input], vec![output]).unwrap();
    Arc::new(component)
}

/// `and(a, b)(r) { t: nand(a, b); r: not(t) }`
fn and_gate() -> Arc<Component> {
    let mut component = Component::new("and", vec![bus("a", 1), bus("b", 1)], vec![bus("r", 1)]).unwrap();
    component.define_bus("t", 1).unwrap();
    let a = component.wire("a", 0).unwrap();
    let b = component.wire("b", 0).unwrap();
    let t = component.wire("t", 0).unwrap();
    let r = component.wire("r", 0).unwrap();
    component.add_instance(Definition::Nand, vec![a, b], vec![t.clone()]).unwrap();
    component.add_instance(Definition::Component(inverter()), vec![t], vec![r]).unwrap();
    Arc::new(component)
}

/// `and4(a[4])(r)`: a tree of three `and`s.
fn and4() -> Arc<Component> {
    let and = and_gate();
    let mut component = Component::new("and4", vec![bus("a", 4)], vec![bus("r", 1)]).unwrap();
    component.define_bus("x", 2).unwrap();
    let a = |i| component.wire("a", i).unwrap();
    let (a0, a1, a2, a3) = (a(0), a(1), a(2), a(3));
    let x0 = component.wire("x", 0).unwrap();
    let x1 = component.wire("x", 1).unwrap();
    let r = component.wire("r", 0).unwrap();
    component.add_instance(Definition::Component(and.clone()), vec![a0, a1], vec![x0.clone()]).unwrap();
    component.add_instance(Definition::Component(and.clone()), vec![a2, a3], vec![x1.clone()]).unwrap();
    component.add_instance(Definition::Component(and), vec![x0, x1], vec![r]).unwrap();
    Arc::new(component)
}

/// `not2(in[2])(out[2])`: two inverters side by side.
fn inverter2() -> Arc<Component> {
    let not = inverter();
    let mut component = Component::new("not2", vec![bus("in", 2)], vec![bus("out", 2)]).unwrap();
    for i in 0..2 {
        let input = component.wire("in", i).unwrap();
        let output = component.wire("out", i).unwrap();
        component.add_instance(Definition::Component(not.clone()), vec![input], vec![output]).unwrap();
    }
    Arc::new(component)
}

fn v(n: u64, width: usize) -> Value {
    Value::from_u64(n, width).unwrap()
}

fn set(values: Vec<Value>) -> TestStep {
    TestStep::SetInputs(Loc::unknown(), values)
}

fn check(line: usize, kind: CheckKind, values: Vec<Value>) -> TestStep {
    TestStep::CheckOutputs(Loc::new(Source::Unknown, line, 1), kind, values)
}

#[test]
fn component_rejects_duplicate_bus_names() {
    let result = Component::new("dup", vec![bus("x", 1)], vec![bus("x", 2)]);
    assert_eq!(result.err(), Some(InternalError::DuplicateBus("x".to_string())));

    let mut component = Component::new("ok", vec![bus("x", 1)], vec![]).unwrap();
    assert_eq!(component.define_bus("x", 3).err(), Some(InternalError::DuplicateBus("x".to_string())));
    assert_eq!(Bus::new("empty", 0).err(), Some(InternalError::ZeroWidthBus("empty".to_string())));
}

#[test]
fn component_counts_io_wires() {
    let component = Component::new("c", vec![bus("a", 4), bus("b", 1)], vec![bus("r", 3)]).unwrap();
    assert_eq!(component.input_wires(), 5);
    assert_eq!(component.output_wires(), 3);
    assert_eq!(component.input_names(), &["a".to_string(), "b".to_string()]);

    let definition = Definition::Component(Arc::new(component));
    assert_eq!(definition.input_wires(), 5);
    assert_eq!(Definition::Nand.input_names(), vec!["a", "b"]);
    assert_eq!(Definition::Constants(Constants::new(vec![v(1, 1), v(5, 3)])).output_wires(), 4);
}

#[test]
fn add_instance_validates_wires() {
    let mut component = Component::new("c", vec![bus("a", 1)], vec![bus("r", 1)]).unwrap();
    let a = component.wire("a", 0).unwrap();
    let r = component.wire("r", 0).unwrap();

    let result = component.add_instance(Definition::Nand, vec![a.clone()], vec![r.clone()]);
    assert_eq!(result, Err(InternalError::ArityMismatch("nand".to_string(), Direction::Incoming, 2, 1)));

    let other = Component::new("other", vec![bus("a", 1)], vec![]).unwrap();
    let foreign = other.wire("a", 0).unwrap();
    let result = component.add_instance(Definition::Nand, vec![a.clone(), foreign], vec![r.clone()]);
    assert_eq!(result, Err(InternalError::ForeignWire("c".to_string(), "a".to_string())));

    assert!(matches!(component.wire("a", 1), Err(InternalError::WireOutOfRange(_, 1, 1))));
    assert!(component.instances().is_empty());
}

#[test]
fn flatten_produces_only_leaves() {
    let flat = and4().flatten().unwrap();
    assert!(flat.is_flat());
    assert_eq!(flat.instances().len(), 6);
    for instance in flat.instances() {
        assert!(matches!(instance.definition(), Definition::Nand));
    }
    for bus in flat.buses() {
        assert_eq!(bus.wires(), 1);
    }
}

#[test]
fn flatten_preserves_interface() {
    let original = and4();
    let flat = original.flatten().unwrap();
    assert_eq!(flat.name(), "and4");
    assert_eq!(flat.input_wires(), original.input_wires());
    assert_eq!(flat.output_wires(), original.output_wires());
    assert_eq!(flat.input_names(), &["a0", "a1", "a2", "a3"]);
    assert_eq!(flat.output_names(), &["r"]);
}

#[test]
fn flatten_names_are_unique_and_scoped() {
    let flat = and4().flatten().unwrap();
    let names: BTreeSet<&str> = flat.buses().map(|bus| bus.name()).collect();
    let expected: BTreeSet<&str> = vec![
        "a0", "a1", "a2", "a3", "r", "x0", "x1",
        "and_i1_t", "and_i2_t", "and_i3_t",
    ].into_iter().collect();
    assert_eq!(names, expected);
}

#[test]
fn flatten_aliases_child_io() {
    let flat = and_gate().flatten().unwrap();
    let rendered: Vec<String> = flat.instances().iter().map(|instance| instance.to_string()).collect();
    assert_eq!(rendered, vec!["t: nand(a, b)", "r: nand(t, t)"]);
}

#[test]
fn flatten_avoids_name_collisions() {
    let component = Component::new("c", vec![bus("b", 2), bus("b1", 1)], vec![]).unwrap();
    let flat = component.flatten().unwrap();
    assert_eq!(flat.input_names(), &["b0", "b1", "b1_2"]);
}

#[test]
fn flatten_keeps_constants_and_original() {
    let mut component = Component::new("one", vec![], vec![bus("out", 2)]).unwrap();
    let outputs = BusWire::all(&component.bus("out").unwrap());
    let constants = Constants::new(vec![v(2, 2)]);
    component.add_instance(Definition::Constants(constants.clone()), vec![], outputs).unwrap();

    let mut wrapper = Component::new("wrapper", vec![], vec![bus("r", 2)]).unwrap();
    let outputs = BusWire::all(&wrapper.bus("r").unwrap());
    wrapper.add_instance(Definition::Component(Arc::new(component)), vec![], outputs).unwrap();

    let flat = wrapper.flatten().unwrap();
    assert_eq!(flat.instances().len(), 1);
    match flat.instances()[0].definition() {
        Definition::Constants(flat_constants) => assert_eq!(flat_constants, &constants),
        _ => panic!("expected a constant source"),
    }
    assert_eq!(flat.instances()[0].to_string(), "r0, r1: 2");
    assert!(!wrapper.is_flat());
    assert_eq!(wrapper.instances().len(), 1);
}

#[test]
fn flatten_is_deterministic() {
    let component = and4();
    let first = component.flatten().unwrap().to_string();
    let second = component.flatten().unwrap().to_string();
    assert_eq!(first, second);
}

#[test]
fn component_display() {
    let rendered = and4().to_string();
    let expected = "component and4(a[4])(r) {\n    define x[2]\n    x[0]: and(a[0], a[1])\n    x[1]: and(a[2], a[3])\n    r: and(x[0], x[1])\n}\n";
    assert_eq!(rendered, expected);
}

#[test]
fn literal_round_trip() {
    for (n, width) in [(0, 1), (1, 1), (5, 3), (5, 8), (255, 8), (u64::MAX, 64), (6, 70)] {
        let value = v(n, width);
        assert_eq!(value.width(), width);
        assert_eq!(value.to_u64(), Some(n));
    }
    assert_eq!(min_bits(0), 0);
    assert_eq!(min_bits(1), 1);
    assert_eq!(min_bits(8), 4);
    assert_eq!(Value::from_u64(4, 2), Err(ValueError::TooWide(4, 2)));
    assert_eq!(format!("{}", v(6, 4)), "6");
    assert_eq!(format!("{:b}", v(6, 4)), "0b0110");
}

#[test]
fn split_and_group_follow_bus_shapes() {
    let component = Component::new("c", vec![bus("a", 2), bus("b", 1)], vec![bus("x", 1), bus("y", 3)]).unwrap();
    let split = testbench::split_inputs(&component, &[v(2, 2), v(1, 1)]).unwrap();
    let expected: Vec<Value> = vec![false.into(), true.into(), true.into()];
    assert_eq!(split, expected);

    let flat: Vec<Value> = vec![true.into(), false.into(), true.into(), true.into()];
    assert_eq!(testbench::group_outputs(&component, &flat), vec![v(1, 1), v(6, 3)]);

    let result = testbench::split_inputs(&component, &[v(2, 2)]);
    assert_eq!(result, Err(InternalError::StepShape("c".to_string(), 2, 1)));
}

#[test]
fn inverter_inverts() {
    let flat = Arc::new(inverter().flatten().unwrap());
    let mut sim = Sim::new(flat, &SimConfig::default()).unwrap();
    sim.set_inputs(&[v(0, 1)]).unwrap();
    assert_eq!(sim.outputs(), vec![v(1, 1)]);
    sim.set_inputs(&[v(1, 1)]).unwrap();
    assert_eq!(sim.outputs(), vec![v(0, 1)]);
}

#[test]
fn inverter_assert_passes() {
    let test = Test::new("not_one", Loc::unknown(), inverter())
        .with_step(set(vec![v(1, 1)]))
        .with_step(check(2, CheckKind::Assert, vec![v(0, 1)]));
    let report = run_test(&test, &SimConfig::default()).unwrap();
    assert!(report.passed());
    assert_eq!(report.steps_run, 2);
}

#[test]
fn inverter_expect_failure_continues() {
    let test = Test::new("not_wrong", Loc::unknown(), inverter())
        .with_step(set(vec![v(1, 1)]))
        .with_step(check(2, CheckKind::Expect, vec![v(1, 1)]))
        .with_step(set(vec![v(0, 1)]))
        .with_step(check(4, CheckKind::Assert, vec![v(1, 1)]));
    let report = run_test(&test, &SimConfig::default()).unwrap();
    assert!(!report.passed());
    assert_eq!(report.steps_run, 4);
    assert_eq!(report.diagnostics.len(), 1);

    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::CheckFailed(CheckKind::Expect));
    assert_eq!(diagnostic.loc.start().map(|start| start.line()), Some(2));
    assert_eq!(diagnostic.message, "expect failed: expected 1, got 0");
}

#[test]
fn assert_failure_stops_test() {
    let test = Test::new("not_stop", Loc::unknown(), inverter())
        .with_step(set(vec![v(0, 1)]))
        .with_step(check(2, CheckKind::Assert, vec![v(0, 1)]))
        .with_step(check(3, CheckKind::Assert, vec![v(0, 1)]));
    let report = run_test(&test, &SimConfig::default()).unwrap();
    assert_eq!(report.steps_run, 2);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].message, "assert failed: expected 0, got 1");
    assert_eq!(report.diagnostics[0].to_string(), "2:1: assert failed: expected 0, got 1");
}

#[test]
fn multi_bit_buses_are_regrouped() {
    let test = Test::new("not2", Loc::unknown(), inverter2())
        .with_step(set(vec![v(1, 2)]))
        .with_step(check(2, CheckKind::Assert, vec![v(2, 2)]))
        .with_step(set(vec![v(3, 2)]))
        .with_step(check(4, CheckKind::Assert, vec![v(0, 2)]));
    let report = run_test(&test, &SimConfig::default()).unwrap();
    assert!(report.passed(), "{:?}", report.diagnostics);
}

#[test]
fn bad_step_shape_is_internal() {
    let test = Test::new("bad", Loc::unknown(), inverter())
        .with_step(set(vec![v(1, 2)]));
    let result = run_test(&test, &SimConfig::default());
    assert_eq!(result.err(), Some(InternalError::StepWidth("not".to_string(), 0, 1, 2)));
}

#[test]
fn oscillator_does_not_converge() {
    let mut component = Component::new("ring", vec![], vec![bus("out", 1)]).unwrap();
    let out = component.wire("out", 0).unwrap();
    component.add_instance(Definition::Nand, vec![out.clone(), out.clone()], vec![out]).unwrap();

    let test = Test::new("ring", Loc::new(Source::Unknown, 7, 1), Arc::new(component))
        .with_step(check(8, CheckKind::Assert, vec![v(0, 1)]));
    let report = run_test(&test, &SimConfig::with_pass_limit(PassLimit::Fixed(10))).unwrap();
    assert_eq!(report.steps_run, 0);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::DidNotConverge);
    assert_eq!(report.diagnostics[0].loc.start().map(|start| start.line()), Some(7));
}

#[test]
fn run_system_orders_by_name() {
    let mut system = System::new();
    let not = inverter();
    system.add_component(not.clone());
    system.add_test(Test::new("b", Loc::unknown(), not.clone()).with_step(check(1, CheckKind::Expect, vec![v(0, 1)])));
    system.add_test(Test::new("a", Loc::unknown(), not).with_step(check(1, CheckKind::Expect, vec![v(1, 1)])));

    let reports = run_system(&system, &SimConfig::default()).unwrap();
    let names: Vec<&str> = reports.iter().map(|report| report.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(reports[0].passed());
    assert!(!reports[1].passed());
}

const INVERTER_JSON: &str = r#"
{
    "source": "not.hdl",
    "components": [
        {
            "name": "not",
            "inputs": [{ "name": "in" }],
            "outputs": [{ "name": "out" }],
            "instances": [{ "of": "nand", "inputs": ["in", "in"], "outputs": ["out"] }]
        }
    ],
    "tests": [
        {
            "name": "not_one", "component": "not", "line": 5,
            "steps": [{ "set": [1], "line": 6 }, { "expect": [1], "line": 7, "col": 5 }]
        }
    ]
}
"#;

#[test]
fn load_inverter() {
    let system = load_system_from_str(INVERTER_JSON).unwrap();
    let component = system.component("not").unwrap();
    assert_eq!(component.instances().len(), 1);

    let test = system.test("not_one").unwrap();
    assert_eq!(test.steps().len(), 2);
    let report = run_test(&test, &SimConfig::default()).unwrap();
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].to_string(), "not.hdl:7:5: expect failed: expected 1, got 0");
}

#[test]
fn load_rejects_bad_documents() {
    let cycle = r#"{ "components": [
        { "name": "a", "inputs": [{ "name": "x" }], "instances": [{ "of": "b", "inputs": ["x"] }] },
        { "name": "b", "inputs": [{ "name": "x" }], "instances": [{ "of": "a", "inputs": ["x"] }] }
    ] }"#;
    assert!(matches!(load_system_from_str(cycle), Err(LoadError::Cycle(_))));

    let unknown = r#"{ "components": [ { "name": "a", "instances": [{ "of": "xor" }] } ] }"#;
    assert!(matches!(load_system_from_str(unknown), Err(LoadError::NoSuchDefinition(_, _))));

    let bad_ref = r#"{ "components": [
        { "name": "a", "inputs": [{ "name": "x" }], "outputs": [{ "name": "y" }],
          "instances": [{ "of": "nand", "inputs": ["x", "x[1]"], "outputs": ["y"] }] }
    ] }"#;
    assert!(matches!(load_system_from_str(bad_ref), Err(LoadError::BadWireRef(_, _))));

    let arity = r#"{ "components": [
        { "name": "a", "inputs": [{ "name": "x" }], "outputs": [{ "name": "y" }],
          "instances": [{ "of": "nand", "inputs": ["x"], "outputs": ["y"] }] }
    ] }"#;
    assert!(matches!(load_system_from_str(arity), Err(LoadError::Netlist(_, InternalError::ArityMismatch(..)))));

    let too_wide = r#"{ "components": [ { "name": "a", "inputs": [{ "name": "x", "width": 2 }] } ],
        "tests": [ { "name": "t", "component": "a", "steps": [{ "set": [4], "line": 3 }] } ] }"#;
    assert!(matches!(load_system_from_str(too_wide), Err(LoadError::Value(_, ValueError::TooWide(4, 2)))));

    let two_kinds = r#"{ "components": [ { "name": "a" } ],
        "tests": [ { "name": "t", "component": "a", "steps": [{ "set": [], "assert": [] }] } ] }"#;
    assert!(matches!(load_system_from_str(two_kinds), Err(LoadError::BadStep(_, _))));

    let reserved = r#"{ "components": [ { "name": "nand" } ] }"#;
    assert!(matches!(load_system_from_str(reserved), Err(LoadError::ReservedName(_))));
}
