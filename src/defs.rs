use super::*;
use std::sync::Arc;

/// What an [`Instance`] is an instance of.
#[derive(Debug, Clone)]
pub enum Definition {
    /// The 2-input NAND gate. Inputs `a`, `b`; output `r`.
    Nand,
    /// A constant source. No inputs; one output group per value.
    Constants(Constants),
    Component(Arc<Component>),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Nand => "nand",
            Definition::Constants(_constants) => "constants",
            Definition::Component(component) => component.name(),
        }
    }

    pub fn input_names(&self) -> Vec<String> {
        match self {
            Definition::Nand => vec!["a".to_string(), "b".to_string()],
            Definition::Constants(_constants) => vec![],
            Definition::Component(component) => component.input_names().to_vec(),
        }
    }

    pub fn output_names(&self) -> Vec<String> {
        match self {
            Definition::Nand => vec!["r".to_string()],
            Definition::Constants(constants) => {
                (0..constants.values().len()).map(|i| format!("c{i}")).collect()
            },
            Definition::Component(component) => component.output_names().to_vec(),
        }
    }

    /// Total number of input wires an instance must be bound to.
    pub fn input_wires(&self) -> usize {
        match self {
            Definition::Nand => 2,
            Definition::Constants(_constants) => 0,
            Definition::Component(component) => component.input_wires(),
        }
    }

    /// Total number of output wires an instance must be bound to.
    pub fn output_wires(&self) -> usize {
        match self {
            Definition::Nand => 1,
            Definition::Constants(constants) => constants.wires(),
            Definition::Component(component) => component.output_wires(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        match self {
            Definition::Nand => true,
            Definition::Constants(_constants) => true,
            Definition::Component(_component) => false,
        }
    }
}

/// A fixed, ordered list of literal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constants(Vec<Value>);

impl Constants {
    pub fn new(values: Vec<Value>) -> Constants {
        Constants(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Every bit of every value, in output order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().flat_map(|value| value.bits().iter().copied())
    }

    pub fn wires(&self) -> usize {
        self.0.iter().map(|value| value.width()).sum()
    }
}

impl std::fmt::Display for Constants {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Values(&self.0))
    }
}
