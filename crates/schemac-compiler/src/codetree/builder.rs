//! Deferred scope population.
//!
//! A [`ScopeBuilder`] is a shared handle to a child list that is still open.
//! Handles can be stored and appended to after the call that opened them has
//! returned. Nested scopes and named zones stay in their parent as pending
//! entries and are spliced in place when the parent is finalized.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

use super::TreeError;
use super::node::{Node, NodeKind};
use super::registry::TypeRegistry;
use crate::invariants::{assert_scope_open, ensure_block_body};

enum Entry {
    Node(Node),
    Pending(Rc<RefCell<ScopeState>>),
}

struct ScopeState {
    /// Block node receiving the children; `None` for the root and for zones.
    template: Option<Node>,
    /// Kind whose body slot the children are checked against.
    slot_owner: Option<NodeKind>,
    items: Vec<Entry>,
    zones: HashMap<String, Rc<RefCell<ScopeState>>>,
    finalized: bool,
}

impl ScopeState {
    fn new(template: Option<Node>, slot_owner: Option<NodeKind>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            template,
            slot_owner,
            items: Vec::new(),
            zones: HashMap::new(),
            finalized: false,
        }))
    }
}

/// Handle to an open child list.
#[derive(Clone)]
pub struct ScopeBuilder<'r> {
    registry: &'r TypeRegistry,
    state: Rc<RefCell<ScopeState>>,
}

impl<'r> ScopeBuilder<'r> {
    fn root(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            state: ScopeState::new(None, None),
        }
    }

    fn child(&self, state: Rc<RefCell<ScopeState>>) -> Self {
        Self {
            registry: self.registry,
            state,
        }
    }

    fn check(&self, node: &Node) -> Result<(), TreeError> {
        let owner = self.state.borrow().slot_owner;
        let (kind, field, set) = self.registry.scope_slot(owner);
        self.registry.check(kind, field, set, node)?;
        self.registry.validate(node)
    }

    /// Append a finished node.
    pub fn append(&self, node: Node) -> Result<(), TreeError> {
        self.check(&node)?;
        let mut state = self.state.borrow_mut();
        assert_scope_open(state.finalized);
        state.items.push(Entry::Node(node));
        Ok(())
    }

    /// Prepend a node, ahead of everything appended so far.
    pub fn insert_first(&self, node: Node) -> Result<(), TreeError> {
        self.check(&node)?;
        let mut state = self.state.borrow_mut();
        assert_scope_open(state.finalized);
        state.items.insert(0, Entry::Node(node));
        Ok(())
    }

    /// Open a block node here and return the handle for its body.
    ///
    /// The node's own body must be empty; everything else about it is
    /// validated now.
    pub fn open(&self, mut node: Node) -> Result<ScopeBuilder<'r>, TreeError> {
        let kind = node.kind();
        let body = ensure_block_body(node.body_mut(), kind);
        body.clear();
        self.check(&node)?;

        let child = ScopeState::new(Some(node), Some(kind));
        let mut state = self.state.borrow_mut();
        assert_scope_open(state.finalized);
        state.items.push(Entry::Pending(Rc::clone(&child)));
        Ok(self.child(child))
    }

    /// A named placeholder at the current position. Asking for the same name
    /// again returns the same zone.
    pub fn zone(&self, name: &str) -> ScopeBuilder<'r> {
        let mut state = self.state.borrow_mut();
        if let Some(zone) = state.zones.get(name) {
            return self.child(Rc::clone(zone));
        }
        assert_scope_open(state.finalized);
        let zone = ScopeState::new(None, state.slot_owner);
        state.items.push(Entry::Pending(Rc::clone(&zone)));
        state.zones.insert(name.to_string(), Rc::clone(&zone));
        self.child(zone)
    }

    /// Open `node`, populate it with `f`, and finalize it on every exit path.
    pub fn scoped<T, E>(
        &self,
        node: Node,
        f: impl FnOnce(&ScopeBuilder<'r>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<TreeError>,
    {
        let scope = self.open(node)?;
        let result = f(&scope);
        let finalized = scope.finalize();
        let value = result?;
        finalized?;
        Ok(value)
    }

    pub fn is_finalized(&self) -> bool {
        self.state.borrow().finalized
    }

    /// Freeze this scope and everything pending below it.
    ///
    /// Returns what the scope contributes to its parent: the block node for a
    /// scope made by [`ScopeBuilder::open`], the children for a zone or root.
    pub fn finalize(&self) -> Result<Vec<Node>, TreeError> {
        if self.state.borrow().finalized {
            return Err(TreeError::AlreadyFinalized);
        }
        Ok(materialize(&self.state))
    }
}

fn materialize(state: &Rc<RefCell<ScopeState>>) -> Vec<Node> {
    let mut state = state.borrow_mut();
    state.finalized = true;

    let mut children = Vec::with_capacity(state.items.len());
    for entry in &state.items {
        match entry {
            Entry::Node(node) => children.push(node.clone()),
            Entry::Pending(pending) => children.extend(materialize(pending)),
        }
    }

    match &state.template {
        Some(template) => {
            let mut node = template.clone();
            let kind = node.kind();
            *ensure_block_body(node.body_mut(), kind) = children;
            vec![node]
        }
        None => children,
    }
}

/// Root of a code tree: the top-level scope.
pub struct Ast<'r> {
    root: ScopeBuilder<'r>,
}

impl<'r> Ast<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            root: ScopeBuilder::root(registry),
        }
    }

    /// Finalize the root and return the top-level nodes.
    pub fn finish(self) -> Result<Vec<Node>, TreeError> {
        self.root.finalize()
    }
}

impl<'r> Deref for Ast<'r> {
    type Target = ScopeBuilder<'r>;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}
