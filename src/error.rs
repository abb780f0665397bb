use super::*;

/// A violation of a netlist invariant.
///
/// These indicate a malformed component graph (or a bug in elaboration itself).
/// They are never reported to the user as test diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    ZeroWidthBus(String),
    DuplicateBus(String),
    NoSuchBus(String),
    WireOutOfRange(String, WireIndex, usize),
    ForeignWire(String, String),
    ArityMismatch(String, Direction, usize, usize),
    UndefinedWire(ScopeWire),
    AlreadyDefinedWire(ScopeWire),
    UnflattenedInstance(String),
    InputShape(usize, usize),
    InputWidth(usize, usize, usize),
    StepShape(String, usize, usize),
    StepWidth(String, usize, usize, usize),
}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InternalError::ZeroWidthBus(name) => write!(f, "Bus has no wires: {name}"),
            InternalError::DuplicateBus(name) => write!(f, "Bus name repeats: {name:?}"),
            InternalError::NoSuchBus(name) => write!(f, "No such bus: {name}"),
            InternalError::WireOutOfRange(name, index, wires) => {
                write!(f, "Wire {name}[{index}] is out of range for a bus of {wires} wires")
            },
            InternalError::ForeignWire(component, bus) => {
                write!(f, "Bus {bus} does not belong to component {component}")
            },
            InternalError::ArityMismatch(definition, direction, expected, actual) => {
                let direction = match direction {
                    Direction::Incoming => "input",
                    Direction::Outgoing => "output",
                };
                write!(f, "Instance of {definition} has {actual} {direction} wires, expected {expected}")
            },
            InternalError::UndefinedWire(wire) => write!(f, "Undefined flattened wire: {wire}"),
            InternalError::AlreadyDefinedWire(wire) => write!(f, "Flattened wire already defined: {wire}"),
            InternalError::UnflattenedInstance(name) => {
                write!(f, "Netlist still contains an instance of component {name}")
            },
            InternalError::InputShape(expected, actual) => {
                write!(f, "Expected {expected} input values, got {actual}")
            },
            InternalError::InputWidth(i, expected, actual) => {
                write!(f, "Input value {i} has {actual} bits, expected {expected}")
            },
            InternalError::StepShape(component, expected, actual) => {
                write!(f, "Test step for {component} has {actual} values, expected {expected}")
            },
            InternalError::StepWidth(component, i, expected, actual) => {
                write!(f, "Test step value {i} for {component} has {actual} bits, expected {expected}")
            },
        }
    }
}

impl std::error::Error for InternalError {}

/// An error raised while settling a flat netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The netlist kept changing for this many passes.
    DidNotConverge(usize),
    Internal(InternalError),
}

impl From<InternalError> for SimError {
    fn from(error: InternalError) -> SimError {
        SimError::Internal(error)
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SimError::DidNotConverge(passes) => write!(f, "Did not converge after {passes} passes"),
            SimError::Internal(error) => write!(f, "Internal error: {error}"),
        }
    }
}

impl std::error::Error for SimError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The integer needs more bits than the target width.
    TooWide(u64, usize),
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ValueError::TooWide(value, width) => {
                write!(f, "Value {value} needs {} bits but only {width} are available", min_bits(*value))
            },
        }
    }
}

impl std::error::Error for ValueError {}

/// A user-facing problem in a netlist interchange document.
#[derive(Debug)]
pub enum LoadError {
    Json(serde_json::Error),
    Io(std::path::PathBuf, std::io::Error),
    DuplicateComponent(String),
    DuplicateTest(String),
    ReservedName(String),
    NoSuchDefinition(String, String),
    NoSuchComponent(Loc, String),
    BadWireRef(String, String),
    Cycle(String),
    ConstantCount(String, usize, usize),
    ConstantValue(String, ValueError),
    BadStep(Loc, String),
    Value(Loc, ValueError),
    Netlist(String, InternalError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LoadError::Json(error) => write!(f, "Malformed netlist document: {error}"),
            LoadError::Io(path, error) => write!(f, "Could not read {}: {error}", path.display()),
            LoadError::DuplicateComponent(name) => write!(f, "Duplicate component: {name}"),
            LoadError::DuplicateTest(name) => write!(f, "Duplicate test: {name}"),
            LoadError::ReservedName(name) => write!(f, "Component name is reserved: {name}"),
            LoadError::NoSuchDefinition(component, name) => {
                write!(f, "In {component}: no such definition: {name}")
            },
            LoadError::NoSuchComponent(loc, name) => write!(f, "{loc}: no such component: {name}"),
            LoadError::BadWireRef(component, wire_ref) => {
                write!(f, "In {component}: bad wire reference: {wire_ref:?}")
            },
            LoadError::Cycle(name) => write!(f, "Component instantiates itself: {name}"),
            LoadError::ConstantCount(component, expected, actual) => {
                write!(f, "In {component}: constants have {actual} values for {expected} outputs")
            },
            LoadError::ConstantValue(component, error) => write!(f, "In {component}: {error}"),
            LoadError::BadStep(loc, message) => write!(f, "{loc}: {message}"),
            LoadError::Value(loc, error) => write!(f, "{loc}: {error}"),
            LoadError::Netlist(component, error) => write!(f, "In {component}: {error}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Json(error) => Some(error),
            LoadError::Io(_path, error) => Some(error),
            LoadError::Value(_loc, error) => Some(error),
            LoadError::ConstantValue(_component, error) => Some(error),
            LoadError::Netlist(_component, error) => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> LoadError {
        LoadError::Json(error)
    }
}
