use super::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The top-level container: every component and every test, by name.
#[derive(Debug, Clone, Default)]
pub struct System {
    components: BTreeMap<ComponentName, Arc<Component>>,
    tests: BTreeMap<String, Arc<Test>>,
}

impl System {
    pub fn new() -> System {
        System::default()
    }

    /// Adds a component. Returns the previous component of the same name, if any.
    pub fn add_component(&mut self, component: Arc<Component>) -> Option<Arc<Component>> {
        self.components.insert(component.name().to_string(), component)
    }

    /// Adds a test. Returns the previous test of the same name, if any.
    pub fn add_test(&mut self, test: Test) -> Option<Arc<Test>> {
        self.tests.insert(test.name().to_string(), Arc::new(test))
    }

    pub fn component(&self, name: &str) -> Option<Arc<Component>> {
        self.components.get(name).cloned()
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.components.values()
    }

    pub fn test(&self, name: &str) -> Option<Arc<Test>> {
        self.tests.get(name).cloned()
    }

    /// Every test, ordered by name.
    pub fn tests(&self) -> impl Iterator<Item = &Arc<Test>> {
        self.tests.values()
    }
}

/// A named scenario run against one component.
#[derive(Debug, Clone)]
pub struct Test {
    name: String,
    loc: Loc,
    component: Arc<Component>,
    steps: Vec<TestStep>,
}

impl Test {
    pub fn new(name: &str, loc: Loc, component: Arc<Component>) -> Test {
        Test {
            name: name.to_string(),
            loc,
            component,
            steps: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> &Arc<Component> {
        &self.component
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    pub fn add_step(&mut self, step: TestStep) {
        self.steps.push(step);
    }

    pub fn with_step(mut self, step: TestStep) -> Test {
        self.add_step(step);
        self
    }
}

impl HasLoc for Test {
    fn loc(&self) -> Loc {
        self.loc.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// A failed assert ends the test.
    Assert,
    /// A failed expect is recorded and the test carries on.
    Expect,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::Assert => write!(f, "assert"),
            CheckKind::Expect => write!(f, "expect"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TestStep {
    /// One value per input bus of the test's component, sized to that bus.
    SetInputs(Loc, Vec<Value>),
    /// One expected value per output bus of the test's component.
    CheckOutputs(Loc, CheckKind, Vec<Value>),
}

impl HasLoc for TestStep {
    fn loc(&self) -> Loc {
        match self {
            TestStep::SetInputs(loc, _values) => loc.clone(),
            TestStep::CheckOutputs(loc, _kind, _values) => loc.clone(),
        }
    }
}
