use super::*;
use log::*;
use std::sync::Arc;

/// What went wrong in a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    CheckFailed(CheckKind),
    DidNotConverge,
}

/// A positioned, user-facing test failure.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub loc: Loc,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl HasLoc for Diagnostic {
    fn loc(&self) -> Loc {
        self.loc.clone()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.loc, self.message)
    }
}

/// The outcome of one test.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
    /// How many steps ran before the test finished or was stopped.
    pub steps_run: usize,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs `test` against a fresh elaboration of its component.
///
/// Assert and expect mismatches, and netlists that never settle, end up as diagnostics in the report.
/// An `Err` means the component graph or the test steps were malformed.
pub fn run_test(test: &Test, config: &SimConfig) -> Result<TestReport, InternalError> {
    info!("Running test {}", test.name());
    let component = test.component();
    let mut report = TestReport {
        name: test.name().to_string(),
        diagnostics: vec![],
        steps_run: 0,
    };

    let flat = Arc::new(component.flatten()?);
    let mut sim = match Sim::new(flat, config) {
        Ok(sim) => sim,
        Err(SimError::Internal(error)) => return Err(error),
        Err(SimError::DidNotConverge(passes)) => {
            report.diagnostics.push(not_converged(test.loc(), passes));
            return Ok(report);
        },
    };

    for step in test.steps() {
        report.steps_run += 1;
        match step {
            TestStep::SetInputs(loc, values) => {
                debug!("{loc}: set {}", Values(values));
                let inputs = split_inputs(component, values)?;
                match sim.set_inputs(&inputs) {
                    Ok(_passes) => (),
                    Err(SimError::Internal(error)) => return Err(error),
                    Err(SimError::DidNotConverge(passes)) => {
                        report.diagnostics.push(not_converged(loc.clone(), passes));
                        break;
                    },
                }
            },
            TestStep::CheckOutputs(loc, kind, expected) => {
                check_shape(component.output_buses(), component.name(), expected)?;
                let actual = group_outputs(component, &sim.outputs());
                debug!("{loc}: {kind} {} (got {})", Values(expected), Values(&actual));
                if &actual == expected {
                    continue;
                }
                let message = format!("{kind} failed: expected {}, got {}", Values(expected), Values(&actual));
                report.diagnostics.push(Diagnostic {
                    loc: loc.clone(),
                    kind: DiagnosticKind::CheckFailed(*kind),
                    message,
                });
                if *kind == CheckKind::Assert {
                    break;
                }
            },
        }
    }

    if report.passed() {
        info!("Test {} passed", test.name());
    } else {
        info!("Test {} failed with {} diagnostics", test.name(), report.diagnostics.len());
    }
    Ok(report)
}

/// Runs every test in `system`, in name order.
pub fn run_system(system: &System, config: &SimConfig) -> Result<Vec<TestReport>, InternalError> {
    system.tests().map(|test| run_test(test, config)).collect()
}

fn not_converged(loc: Loc, passes: usize) -> Diagnostic {
    Diagnostic {
        loc,
        kind: DiagnosticKind::DidNotConverge,
        message: format!("circuit did not converge after {passes} passes"),
    }
}

fn check_shape(buses: Vec<Arc<Bus>>, component_name: &str, values: &[Value]) -> Result<(), InternalError> {
    if values.len() != buses.len() {
        return Err(InternalError::StepShape(component_name.to_string(), buses.len(), values.len()));
    }
    for (i, (bus, value)) in buses.iter().zip(values).enumerate() {
        if bus.wires() != value.width() {
            return Err(InternalError::StepWidth(component_name.to_string(), i, bus.wires(), value.width()));
        }
    }
    Ok(())
}

/// Splits one value per input bus into one 1-bit value per input wire,
/// in bus order and then bit order, matching the flat component's interface.
pub fn split_inputs(component: &Component, values: &[Value]) -> Result<Vec<Value>, InternalError> {
    check_shape(component.input_buses(), component.name(), values)?;
    Ok(values.iter().flat_map(|value| value.split_bits()).collect())
}

/// Regroups one 1-bit value per flat output wire into one value per original output bus.
pub fn group_outputs(component: &Component, flat_outputs: &[Value]) -> Vec<Value> {
    let mut bits = flat_outputs.iter().flat_map(|value| value.bits().iter().copied());
    component
        .output_buses()
        .iter()
        .map(|bus| Value::from_bits(bits.by_ref().take(bus.wires()).collect()))
        .collect()
}
